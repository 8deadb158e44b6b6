//! SharePoint REST $batch request builder
//!
//! Builds the multipart/mixed body for a set of read queries. Each query
//! becomes one `application/http` part carrying an absolute GET request.

use crate::api::constants::{self, headers, methods};
use crate::api::context::QueryRequest;
use crate::api::expression::Transport;
use uuid::Uuid;

const CRLF: &str = "\r\n";

/// Builder for SharePoint REST $batch requests
pub struct BatchRequestBuilder {
    batch_id: String,
    base_url: String,
    parts: Vec<BatchPart>,
}

/// One GET request inside the batch
#[derive(Debug, Clone)]
struct BatchPart {
    method: &'static str,
    url: String,
    headers: Vec<(&'static str, &'static str)>,
}

impl BatchRequestBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            batch_id: format!("batch_{}", Uuid::new_v4()),
            base_url: base_url.into(),
            parts: Vec::new(),
        }
    }

    pub fn add_query(mut self, request: &QueryRequest) -> Self {
        self.parts.push(BatchPart {
            method: methods::GET,
            url: constants::api_url(&self.base_url, Transport::Rest, &request.relative_url()),
            headers: vec![("Accept", headers::ACCEPT_REST_NOMETADATA)],
        });
        self
    }

    pub fn add_queries(self, requests: &[QueryRequest]) -> Self {
        requests.iter().fold(self, |builder, request| builder.add_query(request))
    }

    pub fn build(&self) -> BatchRequest {
        let mut body = String::new();

        for part in &self.parts {
            body.push_str(&format!("--{}{}", self.batch_id, CRLF));
            body.push_str(&format!("Content-Type: application/http{}", CRLF));
            body.push_str(&format!("Content-Transfer-Encoding: binary{}", CRLF));
            body.push_str(CRLF);

            body.push_str(&format!("{} {} HTTP/1.1{}", part.method, part.url, CRLF));
            for (name, value) in &part.headers {
                body.push_str(&format!("{}: {}{}", name, value, CRLF));
            }
            body.push_str(CRLF);
        }

        body.push_str(&format!("--{}--{}", self.batch_id, CRLF));

        BatchRequest {
            content_type: format!("multipart/mixed; boundary=\"{}\"", self.batch_id),
            body,
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }
}

/// Complete batch request ready to send
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub content_type: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::List;
    use crate::api::query::{FilterItem, ODataQuery};

    #[test]
    fn test_get_parts_in_order() {
        let mut query = ODataQuery::<List>::new();
        query.add_filter(FilterItem::eq("Title", "Site Pages"));
        let first = QueryRequest::new(Transport::Rest, "web/lists", &query);
        let second = QueryRequest::new(Transport::Rest, "web/lists", &ODataQuery::<List>::new());

        let builder = BatchRequestBuilder::new("https://contoso.sharepoint.com")
            .add_queries(&[first, second]);
        let batch = builder.build();

        assert!(batch.content_type.starts_with("multipart/mixed; boundary=\"batch_"));
        let lists = "GET https://contoso.sharepoint.com/_api/web/lists";
        let filtered = batch
            .body
            .find(&format!("{}?$filter=Title%20eq%20%27Site%20Pages%27 HTTP/1.1", lists))
            .unwrap();
        let plain = batch.body.find(&format!("{} HTTP/1.1", lists)).unwrap();
        assert!(filtered < plain);
        assert_eq!(batch.body.matches("Content-Type: application/http").count(), 2);
        assert!(batch.body.ends_with(&format!("--{}--\r\n", builder.batch_id())));
    }
}
