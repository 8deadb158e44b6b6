//! Query descriptor
//!
//! Accumulates filters, projections, sort keys and paging for one resource
//! and serializes them in a fixed section order.

use super::filters::{render_filters, ODataFilter};
use super::orderby::{OrderBy, OrderByClause};
use crate::api::expression::{map_member, Resource, Transport};
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct ODataQuery<T: Resource> {
    pub filters: Vec<ODataFilter>,
    pub select: Vec<String>,
    pub expand: Vec<String>,
    pub order_by: OrderByClause,
    pub top: Option<u32>,
    pub skip: Option<u32>,
    _resource: PhantomData<fn() -> T>,
}

impl<T: Resource> Default for ODataQuery<T> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            select: Vec::new(),
            expand: Vec::new(),
            order_by: OrderByClause::new(),
            top: None,
            skip: None,
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> ODataQuery<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&mut self, filter: impl Into<ODataFilter>) -> &mut Self {
        self.filters.push(filter.into());
        self
    }

    pub fn add_select(&mut self, field: impl Into<String>) -> &mut Self {
        self.select.push(field.into());
        self
    }

    pub fn add_expand(&mut self, field: impl Into<String>) -> &mut Self {
        self.expand.push(field.into());
        self
    }

    pub fn add_order_by(&mut self, order: OrderBy) -> &mut Self {
        self.order_by.push(order);
        self
    }

    /// Ordered `(name, value)` pairs, unencoded, empty sections left out
    pub fn to_query_params(&self, transport: Transport) -> Vec<(&'static str, String)> {
        let map = |member: &str| map_member::<T::Field>(member, transport).to_string();
        let mut params = Vec::new();

        if !self.select.is_empty() {
            let fields: Vec<String> = self.select.iter().map(|f| map(f.as_str())).collect();
            params.push(("$select", fields.join(",")));
        }

        let filter = render_filters(&self.filters, &map);
        if !filter.is_empty() {
            params.push(("$filter", filter));
        }

        if let Some(top) = self.top {
            params.push(("$top", top.to_string()));
        }

        if let Some(skip) = self.skip {
            params.push(("$skip", skip.to_string()));
        }

        if let Some(orderby) = self.order_by.render(&map) {
            params.push(("$orderby", orderby));
        }

        if !self.expand.is_empty() {
            let fields: Vec<String> = self.expand.iter().map(|f| map(f.as_str())).collect();
            params.push(("$expand", fields.join(",")));
        }

        params
    }

    /// Canonical query string, e.g. `$select=Title&$filter=Hidden eq false&$top=10`
    pub fn to_query_string(&self, transport: Transport) -> String {
        self.to_query_params(transport)
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Percent-encoded query string for use in a request URL
    pub fn to_encoded_query_string(&self, transport: Transport) -> String {
        self.to_query_params(transport)
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full request URL for the collection at `resource_url`
    pub fn to_url(&self, resource_url: &str, transport: Transport) -> String {
        let query = self.to_encoded_query_string(transport);
        if query.is_empty() {
            resource_url.to_string()
        } else {
            format!("{}?{}", resource_url, query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::List;
    use crate::api::query::filters::{FilterConcatOperator, FilterItem, FiltersGroup};

    #[test]
    fn test_empty_query() {
        let query = ODataQuery::<List>::new();
        assert_eq!(query.to_query_string(Transport::Rest), "");
        assert_eq!(
            query.to_url("https://contoso.sharepoint.com/_api/web/lists", Transport::Rest),
            "https://contoso.sharepoint.com/_api/web/lists"
        );
    }

    #[test]
    fn test_filters_with_paging() {
        let mut query = ODataQuery::<List>::new();
        query.add_filter(FilterItem::eq("Title", "Test 01"));
        query.add_filter(
            FilterItem::ne("Description", "Test 02").with_concat(FilterConcatOperator::And),
        );
        query.top = Some(10);
        query.skip = Some(5);

        assert_eq!(
            query.to_query_string(Transport::Graph),
            "$filter=displayName eq 'Test 01' and description ne 'Test 02'&$top=10&$skip=5"
        );
    }

    #[test]
    fn test_single_group_keeps_parentheses() {
        let mut query = ODataQuery::<List>::new();
        query.add_filter(FiltersGroup::new(vec![
            FilterItem::eq("Id", 1).into(),
            FilterItem::eq("AuthorID", 2).with_concat(FilterConcatOperator::Or).into(),
        ]));

        assert_eq!(
            query.to_query_string(Transport::Graph),
            "$filter=(sharepointIds eq 1 or AuthorID eq 2)"
        );
    }

    #[test]
    fn test_section_order() {
        let mut query = ODataQuery::<List>::new();
        query
            .add_expand("Items")
            .add_order_by(OrderBy::desc("Created"))
            .add_filter(FilterItem::eq("Hidden", false))
            .add_select("Title");
        query.skip = Some(20);
        query.top = Some(10);

        assert_eq!(
            query.to_query_string(Transport::Rest),
            "$select=Title&$filter=Hidden eq false&$top=10&$skip=20&$orderby=Created desc&$expand=Items"
        );
    }

    #[test]
    fn test_expand_not_deduplicated() {
        let mut query = ODataQuery::<List>::new();
        query.add_expand("Items").add_expand("Items");
        assert_eq!(query.to_query_string(Transport::Graph), "$expand=items,items");
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let mut query = ODataQuery::<List>::new();
        query.add_select("Title").add_filter(FilterItem::eq("Title", "A"));
        let first = query.to_query_string(Transport::Rest);
        assert_eq!(first, query.to_query_string(Transport::Rest));
    }

    #[test]
    fn test_encoded_url() {
        let mut query = ODataQuery::<List>::new();
        query.add_select("Title").add_filter(FilterItem::eq("Title", "A B"));
        assert_eq!(
            query.to_url("https://contoso.sharepoint.com/_api/web/lists", Transport::Rest),
            "https://contoso.sharepoint.com/_api/web/lists?$select=Title&$filter=Title%20eq%20%27A%20B%27"
        );
    }
}
