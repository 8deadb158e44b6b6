//! SharePoint REST $batch response parser
//!
//! Splits a multipart/mixed batch response into one result per part, in
//! the order the parts appear.

use crate::api::query::QueryResponse;
use anyhow::{anyhow, bail, Context};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
enum ParsingState {
    MultipartHeaders,
    HttpStatus,
    HttpHeaders,
    Body,
}

/// Individual response item from a batch
#[derive(Debug, Clone)]
pub struct BatchResponseItem {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl BatchResponseItem {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Parse the part body as a collection response
    pub fn into_query_response(self) -> anyhow::Result<QueryResponse> {
        if !self.is_success() {
            bail!(
                "batched request failed with status {}: {}",
                self.status_code,
                self.body.unwrap_or_default()
            );
        }
        let body = self.body.ok_or_else(|| anyhow!("batched request returned no body"))?;
        let json = serde_json::from_str(&body).context("batched response body is not JSON")?;
        QueryResponse::from_json(json)
    }
}

pub struct BatchResponseParser;

impl BatchResponseParser {
    /// Parse a batch response into one result per part
    pub fn parse(response_text: &str) -> anyhow::Result<Vec<anyhow::Result<QueryResponse>>> {
        Ok(Self::parse_items(response_text)?
            .into_iter()
            .map(BatchResponseItem::into_query_response)
            .collect())
    }

    /// Parse the multipart response into raw items
    pub fn parse_items(response_text: &str) -> anyhow::Result<Vec<BatchResponseItem>> {
        let boundary = Self::extract_batch_boundary(response_text)?;

        let items = response_text
            .split(&format!("--{}", boundary))
            .map(str::trim)
            .filter(|part| !part.is_empty() && *part != "--")
            .filter(|part| part.contains("Content-Type: application/http"))
            .map(Self::parse_http_response)
            .collect();

        Ok(items)
    }

    /// Parse an individual HTTP response
    fn parse_http_response(response_text: &str) -> BatchResponseItem {
        let mut status_code = 500;
        let mut headers = HashMap::new();
        let mut state = ParsingState::MultipartHeaders;
        let mut body_lines = Vec::new();

        for line in response_text.lines() {
            let line = line.trim();

            match state {
                ParsingState::MultipartHeaders => {
                    if line.is_empty() {
                        state = ParsingState::HttpStatus;
                    }
                }
                ParsingState::HttpStatus => {
                    if line.starts_with("HTTP/1.1") {
                        if let Some(status_str) = line.split_whitespace().nth(1) {
                            status_code = status_str.parse().unwrap_or(500);
                        }
                        state = ParsingState::HttpHeaders;
                    }
                }
                ParsingState::HttpHeaders => {
                    if line.is_empty() {
                        state = ParsingState::Body;
                        continue;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        headers.insert(name.trim().to_string(), value.trim().to_string());
                    }
                }
                ParsingState::Body => body_lines.push(line),
            }
        }

        let body = Some(body_lines.join("\n").trim().to_string()).filter(|b| !b.is_empty());

        BatchResponseItem {
            status_code,
            headers,
            body,
        }
    }

    fn extract_batch_boundary(text: &str) -> anyhow::Result<String> {
        if let Some(line) = text.lines().find(|line| line.starts_with("--batchresponse")) {
            return Ok(line.trim().trim_start_matches("--").to_string());
        }

        // Fall back to the boundary parameter of an inlined Content-Type
        if let Some(line) = text.lines().find(|line| line.contains("boundary=")) {
            if let Some((_, boundary)) = line.split_once("boundary=") {
                let boundary = boundary
                    .split_whitespace()
                    .next()
                    .unwrap_or(boundary)
                    .trim_matches('"');
                return Ok(boundary.to_string());
            }
        }

        bail!("Could not find batch boundary in response")
    }
}
