//! Composable, lazily executed collections
//!
//! A [`Queryable`] records operators without doing any I/O. Predicates are
//! kept as expression trees and translated only when the query is
//! serialized, so an untranslatable shape surfaces as an error at
//! materialization rather than while chaining.

use crate::api::batch::{Batch, BatchHandle};
use crate::api::cache::Entity;
use crate::api::context::{block_on, ExecutionContext, QueryRequest};
use crate::api::error::{QueryError, Result};
use crate::api::expression::translator::translate_sort;
use crate::api::expression::{
    translate_predicate, translate_projection, Expr, Field, Resource, Transport,
};
use crate::api::query::{FilterConcatOperator, ODataQuery, SortDirection};
use log::debug;

#[derive(Debug, Clone)]
pub struct Queryable<T: Resource> {
    query: ODataQuery<T>,
    predicates: Vec<Expr<T::Field>>,
    usage_error: Option<String>,
    resource_path: Option<String>,
}

impl<T: Resource> Default for Queryable<T> {
    fn default() -> Self {
        Self {
            query: ODataQuery::new(),
            predicates: Vec::new(),
            usage_error: None,
            resource_path: None,
        }
    }
}

impl<T: Resource> Queryable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_usage_error(mut self, message: String) -> Self {
        self.usage_error.get_or_insert(message);
        self
    }

    /// Keep only instances matching `predicate`; repeated calls AND together
    pub fn filter(&self, predicate: Expr<T::Field>) -> Self {
        let mut next = self.clone();
        next.predicates.push(predicate);
        next
    }

    /// Load the given members, navigation members through `$expand`
    pub fn load(&self, fields: &[T::Field]) -> Self {
        if fields.is_empty() {
            return self.clone().with_usage_error("load requires at least one member".to_string());
        }
        let projection = translate_projection(fields);
        let mut next = self.clone();
        next.query.select.extend(projection.select);
        next.query.expand.extend(projection.expand);
        next
    }

    pub fn select(&self, fields: &[T::Field]) -> Self {
        self.load(fields)
    }

    /// Property-availability projection, routed like [`Queryable::load`]
    pub fn query_properties(&self, fields: &[T::Field]) -> Self {
        self.load(fields)
    }

    /// Expand the given members regardless of their kind
    pub fn include(&self, fields: &[T::Field]) -> Self {
        if fields.is_empty() {
            return self
                .clone()
                .with_usage_error("include requires at least one member".to_string());
        }
        let mut next = self.clone();
        next.query.expand.extend(fields.iter().map(|field| field.name().to_string()));
        next
    }

    pub fn expand(&self, fields: &[T::Field]) -> Self {
        self.include(fields)
    }

    pub fn order_by(&self, field: T::Field) -> Self {
        let mut next = self.clone();
        next.query.add_order_by(translate_sort(field, SortDirection::Ascending));
        next
    }

    pub fn order_by_descending(&self, field: T::Field) -> Self {
        let mut next = self.clone();
        next.query.add_order_by(translate_sort(field, SortDirection::Descending));
        next
    }

    pub fn skip(&self, count: u32) -> Self {
        let mut next = self.clone();
        next.query.skip = Some(count);
        next
    }

    pub fn take(&self, count: u32) -> Self {
        let mut next = self.clone();
        next.query.top = Some(count);
        next
    }

    /// Query a collection at `path` instead of the resource's default one
    pub fn at(&self, path: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.resource_path = Some(path.into());
        next
    }

    /// Translate pending predicates into the final query descriptor
    pub fn to_odata_query(&self) -> Result<ODataQuery<T>> {
        if let Some(message) = &self.usage_error {
            return Err(QueryError::usage(message.clone()));
        }

        let mut query = self.query.clone();
        for predicate in &self.predicates {
            let mut filters = translate_predicate(predicate)?;
            if !query.filters.is_empty() {
                if let Some(first) = filters.first_mut() {
                    first.set_concat(FilterConcatOperator::And);
                }
            }
            query.filters.extend(filters);
        }
        Ok(query)
    }

    /// The query string materialization would send
    pub fn serialize(&self, transport: Transport) -> Result<String> {
        Ok(self.to_odata_query()?.to_query_string(transport))
    }

    pub fn to_request(&self, transport: Transport) -> Result<QueryRequest> {
        let query = self.to_odata_query()?;
        let path = match &self.resource_path {
            Some(path) => path.clone(),
            None => T::resource_path(transport)
                .ok_or_else(|| {
                    QueryError::usage(format!(
                        "{} has no default collection path on {}; use at()",
                        std::any::type_name::<T>(),
                        transport
                    ))
                })?
                .to_string(),
        };
        let request = QueryRequest::new(transport, path, &query);
        debug!("Serialized {}?{}", request.resource_path, request.query_string);
        Ok(request)
    }

    /// Execute the query and merge the rows into the context's cache
    pub async fn to_list(&self, ctx: &ExecutionContext) -> Result<Vec<Entity<T>>> {
        let request = self.to_request(ctx.transport())?;
        ctx.fetch::<T>(&request).await
    }

    /// Blocking [`Queryable::to_list`]; a usage error inside an async runtime
    pub fn to_list_blocking(&self, ctx: &ExecutionContext) -> Result<Vec<Entity<T>>> {
        block_on(self.to_list(ctx))?
    }

    /// First matching instance, fetched with `$top=1`
    pub async fn first(&self, ctx: &ExecutionContext) -> Result<Option<Entity<T>>> {
        Ok(self.take(1).to_list(ctx).await?.into_iter().next())
    }

    /// Queue the query on `batch` instead of executing it
    pub fn enqueue(&self, batch: &mut Batch) -> Result<BatchHandle<T>> {
        let request = self.to_request(batch.transport())?;
        batch.push::<T>(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;
    use crate::api::expression::{field, value};
    use crate::api::model::{List, ListField, ListItem, ListItemField};

    #[test]
    fn test_operators_do_not_mutate_source() {
        let lists = Queryable::<List>::new();
        let filtered = lists.filter(field(ListField::Hidden)).take(5);

        assert_eq!(lists.serialize(Transport::Rest).unwrap(), "");
        assert_eq!(filtered.serialize(Transport::Rest).unwrap(), "$filter=Hidden eq true&$top=5");
    }

    #[test]
    fn test_where_calls_and_together() {
        let sequential = Queryable::<List>::new()
            .filter(field(ListField::Title).eq("A"))
            .filter(field(ListField::Hidden).or(field(ListField::TemplateType).eq(100)));
        let combined = Queryable::<List>::new().filter(
            field(ListField::Title)
                .eq("A")
                .and(field(ListField::Hidden).or(field(ListField::TemplateType).eq(100))),
        );

        let expected = "$filter=Title eq 'A' and (Hidden eq true or BaseTemplate eq 100)";
        assert_eq!(sequential.serialize(Transport::Rest).unwrap(), expected);
        assert_eq!(combined.serialize(Transport::Rest).unwrap(), expected);
    }

    #[test]
    fn test_load_routes_navigation_to_expand() {
        let query = Queryable::<List>::new().load(&[ListField::Title, ListField::RootFolder]);
        assert_eq!(query.serialize(Transport::Rest).unwrap(), "$select=Title&$expand=RootFolder");
    }

    #[test]
    fn test_include_always_expands() {
        let query = Queryable::<List>::new()
            .include(&[ListField::Items])
            .expand(&[ListField::Items]);
        assert_eq!(query.serialize(Transport::Graph).unwrap(), "$expand=items,items");
    }

    #[test]
    fn test_ordering_and_paging() {
        let query = Queryable::<List>::new()
            .order_by(ListField::Title)
            .order_by_descending(ListField::Created)
            .skip(0)
            .take(20)
            .take(10);

        assert_eq!(
            query.serialize(Transport::Rest).unwrap(),
            "$top=10&$skip=0&$orderby=Title,Created desc"
        );
    }

    #[test]
    fn test_empty_load_is_deferred_usage_error() {
        let query = Queryable::<List>::new().load(&[]);
        assert_eq!(query.serialize(Transport::Rest).unwrap_err().kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_unsupported_predicate_is_lazy() {
        let query = Queryable::<List>::new().filter(value::<ListField>("Count").cast("int").eq(5));
        let err = query.serialize(Transport::Rest).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TranslationUnsupported);
    }

    #[test]
    fn test_resource_path() {
        let lists = Queryable::<List>::new();
        assert_eq!(lists.to_request(Transport::Graph).unwrap().resource_path, "sites/root/lists");

        let items = Queryable::<ListItem>::new().filter(field(ListItemField::Id).gt(3));
        assert_eq!(items.to_request(Transport::Rest).unwrap_err().kind(), ErrorKind::Usage);

        let request = items
            .at(ListItem::items_of("Site Pages", Transport::Rest))
            .to_request(Transport::Rest)
            .unwrap();
        assert_eq!(request.resource_path, "web/lists/getbytitle('Site Pages')/items");
        assert_eq!(request.query_string, "$filter=Id gt 3");
    }
}
