//! Execution context
//!
//! Owns the executor collaborator, the active transport and the entity
//! caches. Collections are created from here and materialize against it.

use crate::api::batch::Batch;
use crate::api::cache::{Entity, EntityStore};
use crate::api::collection::Queryable;
use crate::api::error::{QueryError, Result};
use crate::api::expression::{Resource, Transport};
use crate::api::query::{ODataQuery, QueryResponse};
use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use log::{debug, info};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

/// One serialized query, addressed relative to the transport's api root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub transport: Transport,
    pub resource_path: String,
    /// Canonical, unencoded query string
    pub query_string: String,
    /// Same sections with percent-encoded values
    pub encoded_query: String,
}

impl QueryRequest {
    pub fn new<T: Resource>(
        transport: Transport,
        resource_path: impl Into<String>,
        query: &ODataQuery<T>,
    ) -> Self {
        Self {
            transport,
            resource_path: resource_path.into(),
            query_string: query.to_query_string(transport),
            encoded_query: query.to_encoded_query_string(transport),
        }
    }

    /// `path?query` relative to the api root, ready to put on the wire
    pub fn relative_url(&self) -> String {
        if self.encoded_query.is_empty() {
            self.resource_path.clone()
        } else {
            format!("{}?{}", self.resource_path, self.encoded_query)
        }
    }
}

/// Performs requests on behalf of a context
///
/// `execute_batch` must answer with one result per request, in request
/// order, using a single round trip.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: &QueryRequest) -> anyhow::Result<QueryResponse>;

    async fn execute_batch(
        &self,
        requests: &[QueryRequest],
    ) -> anyhow::Result<Vec<anyhow::Result<QueryResponse>>>;
}

pub struct ExecutionContext {
    executor: Arc<dyn QueryExecutor>,
    transport: Transport,
    stores: Mutex<HashMap<TypeId, Box<dyn Any + Send>>>,
}

impl ExecutionContext {
    pub fn new(executor: impl QueryExecutor + 'static, transport: Transport) -> Self {
        Self::with_executor(Arc::new(executor), transport)
    }

    pub fn with_executor(executor: Arc<dyn QueryExecutor>, transport: Transport) -> Self {
        Self {
            executor,
            transport,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Fresh, unfiltered collection of `T`
    pub fn collection<T: Resource>(&self) -> Queryable<T> {
        Queryable::new()
    }

    /// Empty batch bound to this context's transport
    pub fn batch(&self) -> Batch {
        Batch::new(self.transport)
    }

    fn with_store<T: Resource, R>(&self, f: impl FnOnce(&mut EntityStore<T>) -> R) -> R {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(EntityStore::<T>::new()));
        match slot.downcast_mut::<EntityStore<T>>() {
            Some(store) => f(store),
            None => unreachable!("entity store registered under a foreign type id"),
        }
    }

    /// Cached entities of `T` in first-seen order
    pub fn local<T: Resource>(&self) -> Vec<Entity<T>> {
        self.with_store::<T, _>(|store| store.iter().cloned().collect())
    }

    pub fn find<T: Resource>(&self, key: &str) -> Option<Entity<T>> {
        self.with_store::<T, _>(|store| store.get(key).cloned())
    }

    pub fn len<T: Resource>(&self) -> usize {
        self.with_store::<T, _>(|store| store.len())
    }

    pub fn add<T: Resource>(&self, entity: Entity<T>) {
        self.with_store::<T, _>(|store| store.add(entity))
    }

    /// Apply local changes to a cached entity, `false` when it is unknown
    pub fn update<T: Resource>(&self, entity: Entity<T>) -> bool {
        self.with_store::<T, _>(|store| store.update(entity))
    }

    pub fn remove<T: Resource>(&self, key: &str) -> Option<Entity<T>> {
        self.with_store::<T, _>(|store| store.remove(key))
    }

    /// Execute one request and merge its rows
    pub(crate) async fn fetch<T: Resource>(
        &self,
        request: &QueryRequest,
    ) -> Result<Vec<Entity<T>>> {
        info!("Executing {} query on {}", request.transport, request.resource_path);
        debug!("Query string: {}", request.query_string);

        let response = self.executor.execute(request).await.map_err(QueryError::Transport)?;
        self.merge_response::<T>(response)
    }

    /// Merge every row of a response into the store of `T`, one lock per row
    pub(crate) fn merge_response<T: Resource>(
        &self,
        response: QueryResponse,
    ) -> Result<Vec<Entity<T>>> {
        debug!("Merging {} rows", response.value.len());
        response
            .value
            .iter()
            .map(|row| {
                let entity =
                    Entity::<T>::from_wire(row, self.transport).map_err(QueryError::Transport)?;
                Ok(self.with_store::<T, _>(|store| store.merge(entity)))
            })
            .collect()
    }

    /// Flush every query queued on `batch` in a single round trip
    pub async fn execute_batch(&self, batch: &mut Batch) -> Result<()> {
        if batch.is_executed() {
            return Err(QueryError::usage("batch has already been executed"));
        }
        if batch.transport() != self.transport {
            return Err(QueryError::usage(format!(
                "batch was built for {} but the context uses {}",
                batch.transport(),
                self.transport
            )));
        }

        let requests = batch.requests();
        info!("Flushing batch {} with {} queries", batch.id(), requests.len());
        if requests.is_empty() {
            batch.complete(self, Vec::new());
            return Ok(());
        }

        let responses = self
            .executor
            .execute_batch(&requests)
            .await
            .map_err(QueryError::Transport)?;
        if responses.len() != requests.len() {
            return Err(QueryError::Transport(anyhow!(
                "batch returned {} responses for {} requests",
                responses.len(),
                requests.len()
            )));
        }

        batch.complete(self, responses);
        Ok(())
    }

    /// Blocking [`ExecutionContext::execute_batch`]
    ///
    /// Fails with a usage error when called from inside an async runtime.
    pub fn execute_batch_blocking(&self, batch: &mut Batch) -> Result<()> {
        block_on(self.execute_batch(batch))?
    }
}

/// Drive a future to completion on a current-thread runtime
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(QueryError::usage(
            "blocking calls cannot run inside an async runtime; use the async variant",
        ));
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime for blocking call")
        .map_err(QueryError::Transport)?;
    Ok(runtime.block_on(future))
}
