//! API constants for SharePoint REST and Microsoft Graph

use crate::api::expression::Transport;

/// SharePoint REST api root, relative to the site URL
pub const REST_API_ROOT: &str = "_api";

/// Microsoft Graph api root, relative to the Graph host
pub const GRAPH_API_ROOT: &str = "v1.0";

/// Default Microsoft Graph host
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com";

/// Batch endpoint for multi-query requests
pub const BATCH_ENDPOINT: &str = "$batch";

/// Environment variable holding the bearer token
pub const ACCESS_TOKEN_ENV: &str = "M365_ACCESS_TOKEN";

pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Accept header for SharePoint REST without metadata annotations
    pub const ACCEPT_REST_NOMETADATA: &str = "application/json;odata=nometadata";
}

pub mod methods {
    pub const GET: &str = "GET";
}

pub fn api_root(transport: Transport) -> &'static str {
    match transport {
        Transport::Rest => REST_API_ROOT,
        Transport::Graph => GRAPH_API_ROOT,
    }
}

/// Absolute URL of a path under the transport's api root
pub fn api_url(base_url: &str, transport: Transport, relative: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        api_root(transport),
        relative.trim_start_matches('/')
    )
}

/// Batch endpoint URL for the transport
pub fn batch_endpoint(base_url: &str, transport: Transport) -> String {
    api_url(base_url, transport, BATCH_ENDPOINT)
}
