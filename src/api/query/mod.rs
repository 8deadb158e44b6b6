//! OData query descriptor module
//!
//! Filter model, sort keys, the `ODataQuery` descriptor and response parsing.

pub mod filters;
pub mod orderby;
pub mod query;
pub mod result;

pub use filters::{
    render_filters, DatePart, FieldRef, FilterConcatOperator, FilterField, FilterItem, FilterValue,
    FilteringCriteria, FiltersGroup, ODataFilter,
};
pub use orderby::{OrderBy, OrderByClause, SortDirection};
pub use query::ODataQuery;
pub use result::QueryResponse;
