//! Domain types for content types, field values and filter trees.

#![forbid(unsafe_code)]

mod condition_operator;
mod content_item;
mod content_type;
mod database_provider;
mod date_format;
mod field_type;
mod field_value;
mod filter;
pub mod sql_fragments;
mod view;

pub use condition_operator::{BooleanOperator, ConditionOperator};
pub use content_item::{ContentItem, ContentItemProjection};
pub use content_type::{
    BuiltInColumn, ContentTypeDefinition, ContentTypeField, FieldChoice, ResolvedField,
};
pub use database_provider::DatabaseProvider;
pub use date_format::{DEFAULT_DATE_FORMAT, DateFormat, sql_server_style_code};
pub use field_type::BaseFieldType;
pub use field_value::{
    ArrayFieldValue, BooleanFieldValue, DateTimeFieldValue, DecimalFieldValue, FieldValue,
    GuidFieldValue, StringFieldValue, TypedValue,
};
pub use filter::{FilterCondition, FilterConditionGroup, FilterNode};
pub use view::{SortDirection, ViewDefinition, ViewSort};
