//! Microsoft Graph JSON batching
//!
//! Graph takes `{"requests": [...]}` on `/v1.0/$batch` and may answer the
//! parts in any order, so responses are matched back by id.

use crate::api::constants::methods;
use crate::api::context::QueryRequest;
use crate::api::query::QueryResponse;
use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct GraphBatchRequest {
    pub requests: Vec<GraphBatchItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphBatchItem {
    pub id: String,
    pub method: String,
    pub url: String,
}

impl GraphBatchRequest {
    /// Number the queries from 1 in submission order
    pub fn from_requests(requests: &[QueryRequest]) -> Self {
        let requests = requests
            .iter()
            .enumerate()
            .map(|(index, request)| GraphBatchItem {
                id: (index + 1).to_string(),
                method: methods::GET.to_string(),
                url: format!("/{}", request.relative_url()),
            })
            .collect();
        Self { requests }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphBatchResponse {
    pub responses: Vec<GraphBatchResponseItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphBatchResponseItem {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: Option<Value>,
}

impl GraphBatchResponse {
    /// One result per submitted request, in submission order
    pub fn into_results(self, count: usize) -> Vec<anyhow::Result<QueryResponse>> {
        let mut by_id: HashMap<String, GraphBatchResponseItem> =
            self.responses.into_iter().map(|item| (item.id.clone(), item)).collect();

        (1..=count)
            .map(|id| match by_id.remove(&id.to_string()) {
                Some(item) => item.into_query_response(),
                None => Err(anyhow!("batch response has no entry for request {}", id)),
            })
            .collect()
    }
}

impl GraphBatchResponseItem {
    fn into_query_response(self) -> anyhow::Result<QueryResponse> {
        if !(200..300).contains(&self.status) {
            let message = self
                .body
                .as_ref()
                .and_then(|b| b.pointer("/error/message"))
                .and_then(|m| m.as_str())
                .unwrap_or("no error message");
            bail!("batched request {} failed with status {}: {}", self.id, self.status, message);
        }
        let body = self
            .body
            .ok_or_else(|| anyhow!("batched request {} returned no body", self.id))?;
        QueryResponse::from_json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::expression::Transport;
    use crate::api::model::List;
    use crate::api::query::ODataQuery;
    use serde_json::json;

    #[test]
    fn test_request_body() {
        let mut query = ODataQuery::<List>::new();
        query.top = Some(2);
        let requests = vec![
            QueryRequest::new(Transport::Graph, "sites/root/lists", &query),
            QueryRequest::new(Transport::Graph, "sites/root/lists", &ODataQuery::<List>::new()),
        ];

        let body = serde_json::to_value(GraphBatchRequest::from_requests(&requests)).unwrap();

        assert_eq!(
            body,
            json!({
                "requests": [
                    {"id": "1", "method": "GET", "url": "/sites/root/lists?$top=2"},
                    {"id": "2", "method": "GET", "url": "/sites/root/lists"}
                ]
            })
        );
    }

    #[test]
    fn test_responses_matched_by_id() {
        let response: GraphBatchResponse = serde_json::from_value(json!({
            "responses": [
                {
                    "id": "2",
                    "status": 403,
                    "body": {"error": {"code": "accessDenied", "message": "Access denied"}}
                },
                {"id": "1", "status": 200, "body": {"value": [{"id": "x"}]}}
            ]
        }))
        .unwrap();

        let results = response.into_results(3);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().len(), 1);
        assert!(results[1].as_ref().unwrap_err().to_string().contains("Access denied"));
        assert!(results[2].is_err());
    }
}
