mod common;

use common::FakeExecutor;
use m365_query::api::expression::field;
use m365_query::api::model::{List, ListField, ListItem, ListItemField};
use m365_query::api::{ErrorKind, ExecutionContext, Transport};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_results_before_flush_are_usage_errors() {
    let ctx = ExecutionContext::with_executor(Arc::new(FakeExecutor::new()), Transport::Rest);
    let mut batch = ctx.batch();

    let handle = ctx.collection::<List>().enqueue(&mut batch).unwrap();

    assert_eq!(batch.results(&handle).unwrap_err().kind(), ErrorKind::Usage);
}

#[tokio::test]
async fn test_flush_is_one_round_trip_in_submission_order() {
    let fake = Arc::new(
        FakeExecutor::new()
            .with_rows(vec![json!({"Id": "a", "Title": "Documents"})])
            .with_rows(vec![
                json!({"Id": 1, "Title": "First item"}),
                json!({"Id": 2, "Title": "Second item"}),
            ]),
    );
    let ctx = ExecutionContext::with_executor(fake.clone(), Transport::Rest);
    let mut batch = ctx.batch();

    let lists = ctx
        .collection::<List>()
        .filter(field(ListField::Hidden).eq(false))
        .enqueue(&mut batch)
        .unwrap();
    let items = ctx
        .collection::<ListItem>()
        .at(ListItem::items_of("Documents", Transport::Rest))
        .order_by(ListItemField::Id)
        .enqueue(&mut batch)
        .unwrap();

    ctx.execute_batch(&mut batch).await.unwrap();

    assert_eq!(fake.batch_calls(), 1);
    assert_eq!(fake.single_calls(), 0);
    assert_eq!(fake.query_strings(), vec!["$filter=Hidden eq false", "$orderby=Id"]);

    let lists = batch.results(&lists).unwrap();
    let items = batch.results(&items).unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].key(), "2");
    assert_eq!(ctx.len::<ListItem>(), 2);
}

#[tokio::test]
async fn test_results_can_be_taken_once() {
    let fake = Arc::new(FakeExecutor::new().with_rows(vec![json!({"Id": "a"})]));
    let ctx = ExecutionContext::with_executor(fake, Transport::Rest);
    let mut batch = ctx.batch();

    let handle = ctx.collection::<List>().enqueue(&mut batch).unwrap();
    ctx.execute_batch(&mut batch).await.unwrap();

    assert_eq!(batch.results(&handle).unwrap().len(), 1);
    assert_eq!(batch.results(&handle).unwrap_err().kind(), ErrorKind::Usage);
}

#[tokio::test]
async fn test_per_query_failures_stay_with_their_handle() {
    let fake = Arc::new(
        FakeExecutor::new()
            .failing_on("getbytitle('Missing')")
            .with_rows(vec![json!({"Id": "a"})]),
    );
    let ctx = ExecutionContext::with_executor(fake, Transport::Rest);
    let mut batch = ctx.batch();

    let lists = ctx.collection::<List>().enqueue(&mut batch).unwrap();
    let missing = ctx
        .collection::<ListItem>()
        .at(ListItem::items_of("Missing", Transport::Rest))
        .enqueue(&mut batch)
        .unwrap();
    ctx.execute_batch(&mut batch).await.unwrap();

    assert_eq!(batch.results(&lists).unwrap().len(), 1);
    assert_eq!(batch.results(&missing).unwrap_err().kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_unsupported_query_is_rejected_at_enqueue() {
    let ctx = ExecutionContext::with_executor(Arc::new(FakeExecutor::new()), Transport::Rest);
    let mut batch = ctx.batch();

    let err = ctx
        .collection::<List>()
        .filter(field(ListField::Title).property("Length").eq(3))
        .enqueue(&mut batch)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TranslationUnsupported);
    assert!(batch.is_empty());
}

#[test]
fn test_blocking_flush() {
    let fake = Arc::new(FakeExecutor::new().with_rows(vec![json!({"sharepointIds": "a"})]));
    let ctx = ExecutionContext::with_executor(fake.clone(), Transport::Graph);
    let mut batch = ctx.batch();

    let handle = ctx.collection::<List>().take(1).enqueue(&mut batch).unwrap();
    ctx.execute_batch_blocking(&mut batch).unwrap();

    assert_eq!(fake.batch_calls(), 1);
    assert!(batch.results(&handle).is_ok());
    assert_eq!(ctx.execute_batch_blocking(&mut batch).unwrap_err().kind(), ErrorKind::Usage);
}
