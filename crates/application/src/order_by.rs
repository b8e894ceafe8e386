use std::str::FromStr;

use vellum_core::AppResult;
use vellum_domain::{BuiltInColumn, ContentTypeDefinition, SortDirection, ViewSort};

use crate::query_ports::{FieldTarget, OrderTerm};

/// One requested ordering before it is resolved against a content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByItem {
    /// Field developer name.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl From<&ViewSort> for OrderByItem {
    fn from(value: &ViewSort) -> Self {
        Self {
            field: value.developer_name().as_str().to_owned(),
            direction: value.direction(),
        }
    }
}

/// Parses `"<field> [asc|desc], ..."`.
///
/// A missing direction means ascending. Items with an unrecognized
/// direction or extra tokens are dropped; the rest are kept in order.
#[must_use]
pub fn parse_order_by(text: &str) -> Vec<OrderByItem> {
    text.split(',')
        .filter_map(|item| {
            let mut parts = item.split_whitespace();
            let field = parts.next()?;
            let direction = match parts.next() {
                None => SortDirection::Asc,
                Some(token) => SortDirection::from_str(token).ok()?,
            };
            if parts.next().is_some() {
                return None;
            }

            Some(OrderByItem {
                field: field.to_owned(),
                direction,
            })
        })
        .collect()
}

/// Ordering used when nothing usable was requested.
#[must_use]
pub fn default_order_by() -> Vec<OrderTerm> {
    let column = BuiltInColumn::CreationTime;
    vec![OrderTerm {
        target: FieldTarget::Column(column),
        field_type: column.field_type(),
        direction: SortDirection::Desc,
    }]
}

/// Resolves items against the content type, falling back to the default
/// order when the list is empty. Unknown fields are rejected.
pub fn resolve_order_by(
    content_type: &ContentTypeDefinition,
    items: &[OrderByItem],
) -> AppResult<Vec<OrderTerm>> {
    if items.is_empty() {
        return Ok(default_order_by());
    }

    items
        .iter()
        .map(|item| {
            let field = content_type.require_field(item.field.as_str())?;
            Ok(OrderTerm {
                target: FieldTarget::from(field),
                field_type: field.field_type(),
                direction: item.direction,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use vellum_core::{AppError, ContentTypeId};
    use vellum_domain::{
        BaseFieldType, BuiltInColumn, ContentTypeDefinition, ContentTypeField, SortDirection,
    };

    use super::{OrderByItem, parse_order_by, resolve_order_by};
    use crate::query_ports::FieldTarget;

    fn item(field: &str, direction: SortDirection) -> OrderByItem {
        OrderByItem {
            field: field.to_owned(),
            direction,
        }
    }

    #[test]
    fn parses_directions_and_defaults_to_ascending() {
        assert_eq!(
            parse_order_by("price desc, title,published_on ASC"),
            vec![
                item("price", SortDirection::Desc),
                item("title", SortDirection::Asc),
                item("published_on", SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn drops_items_with_unrecognized_directions() {
        assert_eq!(
            parse_order_by("price sideways, title desc, , summary asc extra"),
            vec![item("title", SortDirection::Desc)]
        );
        assert!(parse_order_by("").is_empty());
    }

    #[test]
    fn empty_order_falls_back_to_newest_first() {
        let content_type = ContentTypeDefinition::new(
            ContentTypeId::new(),
            "page",
            "Page",
            "Pages",
            "title",
            vec![
                ContentTypeField::new("title", "Title", BaseFieldType::SingleLineText, true, Vec::new(), None)
                    .unwrap_or_else(|_| unreachable!()),
            ],
        )
        .unwrap_or_else(|_| unreachable!());

        let terms = resolve_order_by(&content_type, &[]).unwrap_or_else(|_| unreachable!());
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].target, FieldTarget::Column(BuiltInColumn::CreationTime));
        assert_eq!(terms[0].direction, SortDirection::Desc);

        let result = resolve_order_by(&content_type, &[item("rating", SortDirection::Asc)]);
        assert!(matches!(result, Err(AppError::InvalidField { .. })));
    }
}
