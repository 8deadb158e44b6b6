//! OData query composition for SharePoint REST and Microsoft Graph
//!
//! Collections of typed resources are filtered with expression trees,
//! translated to OData query strings and executed through a pluggable
//! [`QueryExecutor`]. Results merge into an identity-keyed cache held by the
//! [`ExecutionContext`].

pub mod batch;
pub mod cache;
pub mod client;
pub mod collection;
pub mod constants;
pub mod context;
pub mod error;
pub mod expression;
pub mod model;
pub mod query;

pub use batch::{Batch, BatchHandle};
pub use cache::{Entity, EntityStore};
pub use client::HttpExecutor;
pub use collection::Queryable;
pub use context::{ExecutionContext, QueryExecutor, QueryRequest};
pub use error::{ErrorKind, QueryError, Result};
pub use expression::{field, value, Expr, Field, FieldKind, Resource, Transport};
pub use query::{ODataQuery, QueryResponse};
