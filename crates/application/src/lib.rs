//! Application services and ports for content queries.

#![forbid(unsafe_code)]

mod cancellation;
mod filter_binder;
mod filter_compiler;
mod json_query_engine;
mod order_by;
pub mod portable_filter;
mod query_ports;
mod settings;
mod view_query_service;

pub use cancellation::CancellationSignal;
pub use filter_compiler::FilterCompiler;
pub use json_query_engine::{JsonQueryEngine, JsonQueryRequest};
pub use order_by::{OrderByItem, default_order_by, parse_order_by, resolve_order_by};
pub use query_ports::{
    BoundFilter, ContentItemQueryExecutor, ContentItemQueryPlan, ContentTypeRepository,
    FieldPredicate, FieldTarget, OrderTerm, PageWindow, QueryPage, SearchColumn, SearchPredicate,
    ViewRepository,
};
pub use settings::{DEFAULT_PAGE_SIZE, JsonQuerySettings, MAX_PAGE_SIZE};
pub use view_query_service::{ViewQueryRequest, ViewQueryService};
