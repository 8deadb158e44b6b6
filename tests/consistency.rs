mod common;

use common::FakeExecutor;
use m365_query::api::expression::field;
use m365_query::api::model::{List, ListField};
use m365_query::api::{Entity, ExecutionContext, Transport};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_rerun_sees_external_addition_and_keeps_loaded_properties() {
    let fake = Arc::new(
        FakeExecutor::new()
            .with_rows(vec![
                json!({"Id": "a", "Title": "Documents", "Description": "Shared files"}),
                json!({"Id": "b", "Title": "Site Pages", "Description": "Pages"}),
            ])
            .with_rows(vec![json!({"Id": "a", "Title": "Documents"})])
            .with_rows(vec![
                json!({"Id": "a", "Title": "Documents"}),
                json!({"Id": "b", "Title": "Site Pages"}),
                json!({"Id": "c", "Title": "Tasks"}),
            ]),
    );
    let ctx = ExecutionContext::with_executor(fake.clone(), Transport::Rest);

    let everything = ctx.collection::<List>();
    let first = everything.to_list(&ctx).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(ctx.len::<List>(), 2);

    // A narrower query touching one list only overwrites what it returned
    let titles = ctx
        .collection::<List>()
        .filter(field(ListField::Title).eq("Documents"))
        .load(&[ListField::Title]);
    titles.to_list(&ctx).await.unwrap();

    // "Tasks" was created remotely in the meantime
    let rerun = ctx.collection::<List>().load(&[ListField::Title]).to_list(&ctx).await.unwrap();
    assert_eq!(rerun.len(), 3);
    assert_eq!(ctx.len::<List>(), 3);

    let documents = ctx.find::<List>("a").unwrap();
    assert_eq!(documents.get(ListField::Description), Some(&json!("Shared files")));
    let pages = rerun.iter().find(|e| e.key() == "b").unwrap();
    assert!(pages.has_property(ListField::Description));
    assert!(!rerun[2].has_property(ListField::Description));

    let keys: Vec<String> = ctx.local::<List>().iter().map(|e| e.key().to_string()).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
    assert_eq!(fake.single_calls(), 3);
}

#[tokio::test]
async fn test_latest_response_wins_per_field() {
    let fake = Arc::new(
        FakeExecutor::new()
            .with_rows(vec![json!({"Id": "a", "Title": "Old", "Hidden": false})])
            .with_rows(vec![json!({"Id": "a", "Title": "New"})]),
    );
    let ctx = ExecutionContext::with_executor(fake, Transport::Rest);

    ctx.collection::<List>().to_list(&ctx).await.unwrap();
    let rows = ctx.collection::<List>().to_list(&ctx).await.unwrap();

    assert_eq!(rows[0].get(ListField::Title), Some(&json!("New")));
    assert_eq!(rows[0].get(ListField::Hidden), Some(&json!(false)));
}

#[tokio::test]
async fn test_local_mutations_are_visible_to_queries() {
    let fake =
        Arc::new(FakeExecutor::new().with_rows(vec![json!({"Id": "a", "Title": "Documents"})]));
    let ctx = ExecutionContext::with_executor(fake, Transport::Rest);

    ctx.add(Entity::<List>::new("a").with(ListField::Description, "added locally"));
    ctx.add(Entity::<List>::new("draft").with(ListField::Title, "Draft"));
    assert!(ctx.update(Entity::<List>::new("draft").with(ListField::Hidden, true)));

    let rows = ctx.collection::<List>().to_list(&ctx).await.unwrap();
    assert_eq!(rows[0].get(ListField::Description), Some(&json!("added locally")));
    assert_eq!(ctx.len::<List>(), 2);

    assert!(ctx.remove::<List>("draft").is_some());
    assert_eq!(ctx.len::<List>(), 1);
}

#[tokio::test]
async fn test_graph_rows_cache_under_member_names() {
    let fake = Arc::new(FakeExecutor::new().with_rows(vec![json!({
        "@odata.etag": "\"1\"",
        "sharepointIds": "a",
        "displayName": "Documents",
        "createdDateTime": "2024-01-05T10:00:00Z"
    })]));
    let ctx = ExecutionContext::with_executor(fake, Transport::Graph);

    let rows = ctx.collection::<List>().to_list(&ctx).await.unwrap();

    assert_eq!(rows[0].get(ListField::Title), Some(&json!("Documents")));
    assert_eq!(rows[0].get(ListField::Created), Some(&json!("2024-01-05T10:00:00Z")));
    assert_eq!(rows[0].properties().len(), 3);
}
