#![allow(dead_code)]

use async_trait::async_trait;
use m365_query::api::{QueryExecutor, QueryRequest, QueryResponse};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory executor that answers from a queue of canned row sets
#[derive(Default)]
pub struct FakeExecutor {
    responses: Mutex<VecDeque<Vec<Value>>>,
    requests: Mutex<Vec<QueryRequest>>,
    single_calls: Mutex<usize>,
    batch_calls: Mutex<usize>,
    failing_path: Option<String>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next request
    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        self.responses.lock().unwrap().push_back(rows);
        self
    }

    /// Fail every request whose path contains `path`
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_path = Some(path.to_string());
        self
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn query_strings(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.query_string).collect()
    }

    pub fn single_calls(&self) -> usize {
        *self.single_calls.lock().unwrap()
    }

    pub fn batch_calls(&self) -> usize {
        *self.batch_calls.lock().unwrap()
    }

    fn answer(&self, request: &QueryRequest) -> anyhow::Result<QueryResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(path) = &self.failing_path {
            if request.resource_path.contains(path.as_str()) {
                anyhow::bail!("404 Not Found: {}", request.resource_path);
            }
        }
        let rows = self.responses.lock().unwrap().pop_front().unwrap_or_default();
        Ok(QueryResponse::new(rows))
    }
}

#[async_trait]
impl QueryExecutor for FakeExecutor {
    async fn execute(&self, request: &QueryRequest) -> anyhow::Result<QueryResponse> {
        *self.single_calls.lock().unwrap() += 1;
        self.answer(request)
    }

    async fn execute_batch(
        &self,
        requests: &[QueryRequest],
    ) -> anyhow::Result<Vec<anyhow::Result<QueryResponse>>> {
        *self.batch_calls.lock().unwrap() += 1;
        Ok(requests.iter().map(|request| self.answer(request)).collect())
    }
}
