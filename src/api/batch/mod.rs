//! Deferred query batches
//!
//! Queries are queued with `Queryable::enqueue` and sent together by
//! `ExecutionContext::execute_batch`. Each queue entry remembers how to
//! merge its rows, so results come back typed through a [`BatchHandle`].

pub mod builder;
pub mod graph;
pub mod parser;

pub use builder::{BatchRequest, BatchRequestBuilder};
pub use graph::{GraphBatchRequest, GraphBatchResponse};
pub use parser::{BatchResponseItem, BatchResponseParser};

use crate::api::cache::Entity;
use crate::api::context::{ExecutionContext, QueryRequest};
use crate::api::error::{QueryError, Result};
use crate::api::expression::{Resource, Transport};
use crate::api::query::QueryResponse;
use log::warn;
use std::any::Any;
use std::marker::PhantomData;
use std::mem;
use uuid::Uuid;

type MergeFn = fn(&ExecutionContext, QueryResponse) -> Result<Box<dyn Any + Send>>;

fn merge_rows<T: Resource>(
    ctx: &ExecutionContext,
    response: QueryResponse,
) -> Result<Box<dyn Any + Send>> {
    let entities: Vec<Entity<T>> = ctx.merge_response::<T>(response)?;
    Ok(Box::new(entities))
}

enum Outcome {
    Pending,
    Ready(Result<Box<dyn Any + Send>>),
    Taken,
}

struct BatchEntry {
    request: QueryRequest,
    merge: MergeFn,
    outcome: Outcome,
}

/// Ticket for the result of one queued query
#[derive(Debug)]
pub struct BatchHandle<T: Resource> {
    batch_id: Uuid,
    index: usize,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> BatchHandle<T> {
    /// Position of the query in submission order
    pub fn index(&self) -> usize {
        self.index
    }
}

pub struct Batch {
    id: Uuid,
    transport: Transport,
    entries: Vec<BatchEntry>,
    executed: bool,
}

impl Batch {
    pub fn new(transport: Transport) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport,
            entries: Vec::new(),
            executed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Queued requests in submission order
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.entries.iter().map(|entry| entry.request.clone()).collect()
    }

    pub(crate) fn push<T: Resource>(&mut self, request: QueryRequest) -> Result<BatchHandle<T>> {
        if self.executed {
            return Err(QueryError::usage(
                "cannot enqueue on a batch that has already been executed",
            ));
        }
        self.entries.push(BatchEntry {
            request,
            merge: merge_rows::<T>,
            outcome: Outcome::Pending,
        });
        Ok(BatchHandle {
            batch_id: self.id,
            index: self.entries.len() - 1,
            _resource: PhantomData,
        })
    }

    /// Store the per-request outcomes of a flush
    pub(crate) fn complete(
        &mut self,
        ctx: &ExecutionContext,
        responses: Vec<anyhow::Result<QueryResponse>>,
    ) {
        for (entry, response) in self.entries.iter_mut().zip(responses) {
            let outcome = match response {
                Ok(response) => (entry.merge)(ctx, response),
                Err(e) => {
                    warn!("Batched query on {} failed: {:#}", entry.request.resource_path, e);
                    Err(QueryError::Transport(e))
                }
            };
            entry.outcome = Outcome::Ready(outcome);
        }
        self.executed = true;
    }

    /// Take the merged rows of a queued query
    ///
    /// Fails with a usage error before the batch is executed, for a handle
    /// issued by another batch, and when the result was already taken.
    pub fn results<T: Resource>(&mut self, handle: &BatchHandle<T>) -> Result<Vec<Entity<T>>> {
        if handle.batch_id != self.id {
            return Err(QueryError::usage("handle belongs to a different batch"));
        }
        if !self.executed {
            return Err(QueryError::usage("batch results requested before the batch was executed"));
        }
        let Some(entry) = self.entries.get_mut(handle.index) else {
            return Err(QueryError::usage(format!("no batched query at index {}", handle.index)));
        };

        match mem::replace(&mut entry.outcome, Outcome::Taken) {
            Outcome::Ready(Ok(rows)) => rows
                .downcast::<Vec<Entity<T>>>()
                .map(|rows| *rows)
                .map_err(|_| QueryError::usage("handle type does not match the queued query")),
            Outcome::Ready(Err(e)) => Err(e),
            Outcome::Taken => Err(QueryError::usage(format!(
                "results of query {} were already taken",
                handle.index
            ))),
            Outcome::Pending => {
                Err(QueryError::usage(format!("query {} has no result", handle.index)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;
    use crate::api::model::List;
    use crate::api::query::ODataQuery;

    fn request(path: &str) -> QueryRequest {
        QueryRequest::new(Transport::Rest, path, &ODataQuery::<List>::new())
    }

    #[test]
    fn test_handles_follow_submission_order() {
        let mut batch = Batch::new(Transport::Rest);
        let first = batch.push::<List>(request("web/lists")).unwrap();
        let second = batch.push::<List>(request("web/lists")).unwrap();

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_results_before_execution() {
        let mut batch = Batch::new(Transport::Rest);
        let handle = batch.push::<List>(request("web/lists")).unwrap();

        let err = batch.results(&handle).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_foreign_handle() {
        let mut batch = Batch::new(Transport::Rest);
        let mut other = Batch::new(Transport::Rest);
        let handle = other.push::<List>(request("web/lists")).unwrap();
        batch.push::<List>(request("web/lists")).unwrap();

        assert_eq!(batch.results(&handle).unwrap_err().kind(), ErrorKind::Usage);
    }
}
