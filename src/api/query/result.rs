//! Query response handling
//!
//! Parses collection payloads from SharePoint REST (`nometadata` and verbose
//! shapes) and Microsoft Graph.

use anyhow::anyhow;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub value: Vec<Value>,
    pub count: Option<u64>,
    pub next_link: Option<String>,
}

impl QueryResponse {
    pub fn new(value: Vec<Value>) -> Self {
        Self {
            value,
            count: None,
            next_link: None,
        }
    }

    /// Parse a collection payload into QueryResponse
    pub fn from_json(json: Value) -> anyhow::Result<Self> {
        if let Some(verbose) = json.get("d") {
            let value = verbose
                .get("results")
                .and_then(|v| v.as_array())
                .ok_or_else(|| anyhow!("Missing or invalid 'd.results' array in response"))?
                .clone();
            let next_link = verbose.get("__next").and_then(|n| n.as_str()).map(|s| s.to_string());
            return Ok(Self {
                value,
                count: None,
                next_link,
            });
        }

        let value = json
            .get("value")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("Missing or invalid 'value' array in response"))?
            .clone();

        let count = json
            .get("@odata.count")
            .or_else(|| json.get("odata.count"))
            .and_then(|c| c.as_u64());

        let next_link = json
            .get("@odata.nextLink")
            .or_else(|| json.get("odata.nextLink"))
            .and_then(|n| n.as_str())
            .map(|s| s.to_string());

        Ok(Self {
            value,
            count,
            next_link,
        })
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Check if there are more results available
    pub fn has_more(&self) -> bool {
        self.next_link.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graph_response() {
        let json = json!({
            "value": [
                {"id": "1", "displayName": "Documents"},
                {"id": "2", "displayName": "Site Pages"}
            ],
            "@odata.count": 2,
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/sites/root/lists?$skiptoken=abc"
        });

        let response = QueryResponse::from_json(json).unwrap();

        assert_eq!(response.len(), 2);
        assert_eq!(response.count, Some(2));
        assert!(response.has_more());
    }

    #[test]
    fn test_rest_nometadata_response() {
        let json = json!({
            "odata.nextLink": "https://contoso.sharepoint.com/_api/web/lists?$skiptoken=Paged%3dTRUE",
            "value": [{"Id": "a", "Title": "Documents"}]
        });

        let response = QueryResponse::from_json(json).unwrap();

        assert_eq!(response.len(), 1);
        assert_eq!(response.count, None);
        assert!(response.has_more());
    }

    #[test]
    fn test_rest_verbose_response() {
        let json = json!({
            "d": {
                "results": [
                    {"__metadata": {"type": "SP.List"}, "Id": "a", "Title": "Documents"}
                ]
            }
        });

        let response = QueryResponse::from_json(json).unwrap();

        assert_eq!(response.len(), 1);
        assert!(!response.has_more());
    }

    #[test]
    fn test_missing_value_array() {
        assert!(QueryResponse::from_json(json!({"error": "nope"})).is_err());
        assert!(QueryResponse::from_json(json!({"d": {"Title": "single"}})).is_err());
    }
}
