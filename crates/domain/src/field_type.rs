use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vellum_core::{AppError, AppResult};

use crate::field_value::{
    ArrayFieldValue, BooleanFieldValue, DateTimeFieldValue, DecimalFieldValue, GuidFieldValue,
    StringFieldValue, TypedValue,
};
use crate::sql_fragments::{
    json_array_value, json_text_value, postgres_date_value, postgres_number_value,
};
use crate::{ConditionOperator, DatabaseProvider, DateFormat, FieldValue, SortDirection};
use crate::ConditionOperator as Op;

/// Kind of a content type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BaseFieldType {
    /// Short single-line text.
    SingleLineText,
    /// Multi-line plain text.
    LongText,
    /// Rich text stored as HTML.
    Wysiwyg,
    /// One choice rendered as radio buttons.
    Radio,
    /// One choice rendered as a dropdown.
    Dropdown,
    /// Any number of choices.
    MultipleSelect,
    /// Boolean flag.
    Checkbox,
    /// Calendar date stored as text in the organization date format.
    Date,
    /// Decimal number.
    Number,
    /// File key of an uploaded attachment.
    Attachment,
    /// GUID of one related content item.
    OneToOneRelationship,
    /// Built-in identifier column. Not offered to administrators.
    Id,
}

const TEXT_OPERATORS: [ConditionOperator; 10] = [
    Op::Equals,
    Op::NotEquals,
    Op::Contains,
    Op::NotContains,
    Op::StartsWith,
    Op::NotStartsWith,
    Op::EndsWith,
    Op::NotEndsWith,
    Op::IsEmpty,
    Op::IsNotEmpty,
];
const SINGLE_SELECT_OPERATORS: [ConditionOperator; 4] =
    [Op::Equals, Op::NotEquals, Op::IsEmpty, Op::IsNotEmpty];
const MULTIPLE_SELECT_OPERATORS: [ConditionOperator; 4] =
    [Op::Has, Op::HasNot, Op::IsEmpty, Op::IsNotEmpty];
const COMPARABLE_OPERATORS: [ConditionOperator; 8] = [
    Op::Equals,
    Op::NotEquals,
    Op::GreaterThan,
    Op::LessThan,
    Op::GreaterThanOrEqual,
    Op::LessThanOrEqual,
    Op::IsEmpty,
    Op::IsNotEmpty,
];
const ID_OPERATORS: [ConditionOperator; 2] = [Op::Equals, Op::NotEquals];
const ATTACHMENT_OPERATORS: [ConditionOperator; 2] = [Op::IsEmpty, Op::IsNotEmpty];
const CHECKBOX_OPERATORS: [ConditionOperator; 2] = [Op::IsTrue, Op::IsFalse];
const RELATIONSHIP_OPERATORS: [ConditionOperator; 4] =
    [Op::Equals, Op::NotEquals, Op::IsEmpty, Op::IsNotEmpty];

impl BaseFieldType {
    const SUPPORTED: [Self; 11] = [
        Self::SingleLineText,
        Self::LongText,
        Self::Wysiwyg,
        Self::Radio,
        Self::Dropdown,
        Self::MultipleSelect,
        Self::Checkbox,
        Self::Date,
        Self::Number,
        Self::Attachment,
        Self::OneToOneRelationship,
    ];

    /// Returns the field types an administrator can pick.
    #[must_use]
    pub fn supported_types() -> &'static [Self] {
        &Self::SUPPORTED
    }

    /// Returns the stable developer name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleLineText => "single_line_text",
            Self::LongText => "long_text",
            Self::Wysiwyg => "wysiwyg",
            Self::Radio => "radio",
            Self::Dropdown => "dropdown",
            Self::MultipleSelect => "multiple_select",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Number => "number",
            Self::Attachment => "attachment",
            Self::OneToOneRelationship => "one_to_one_relationship",
            Self::Id => "id",
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::SingleLineText => "Single line text",
            Self::LongText => "Long text",
            Self::Wysiwyg => "Wysiwyg",
            Self::Radio => "Radio",
            Self::Dropdown => "Dropdown",
            Self::MultipleSelect => "Multiple select",
            Self::Checkbox => "Checkbox",
            Self::Date => "Date",
            Self::Number => "Number",
            Self::Attachment => "Attachment",
            Self::OneToOneRelationship => "One to one relationship",
            Self::Id => "Id",
        }
    }

    /// Returns whether the field is configured with a list of choices.
    #[must_use]
    pub fn has_choices(&self) -> bool {
        matches!(self, Self::Radio | Self::Dropdown | Self::MultipleSelect)
    }

    /// Returns whether the field stores free text.
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::SingleLineText | Self::LongText | Self::Wysiwyg)
    }

    /// Returns the condition operators a filter may apply to this field.
    #[must_use]
    pub fn supported_condition_operators(&self) -> &'static [ConditionOperator] {
        match self {
            Self::SingleLineText | Self::LongText | Self::Wysiwyg => &TEXT_OPERATORS,
            Self::Radio | Self::Dropdown => &SINGLE_SELECT_OPERATORS,
            Self::MultipleSelect => &MULTIPLE_SELECT_OPERATORS,
            Self::Number | Self::Date => &COMPARABLE_OPERATORS,
            Self::Id => &ID_OPERATORS,
            Self::Attachment => &ATTACHMENT_OPERATORS,
            Self::Checkbox => &CHECKBOX_OPERATORS,
            Self::OneToOneRelationship => &RELATIONSHIP_OPERATORS,
        }
    }

    /// Returns whether `operator` may be applied to this field.
    #[must_use]
    pub fn supports(&self, operator: ConditionOperator) -> bool {
        self.supported_condition_operators().contains(&operator)
    }

    /// Normalizes raw input into a typed value.
    ///
    /// Null and empty strings produce a value without `has_value()`.
    /// Non-empty text that does not parse for number, date, checkbox or
    /// identifier fields fails with [`AppError::Format`].
    pub fn value_from(&self, raw: &Value) -> AppResult<FieldValue> {
        self.value_from_with_format(raw, None)
    }

    /// Normalizes raw input, parsing date text with `date_format` first.
    pub fn value_from_with_format(
        &self,
        raw: &Value,
        date_format: Option<&DateFormat>,
    ) -> AppResult<FieldValue> {
        let value = match self {
            Self::SingleLineText
            | Self::LongText
            | Self::Wysiwyg
            | Self::Radio
            | Self::Dropdown
            | Self::Attachment => TypedValue::Text(StringFieldValue::from_json(raw)),
            Self::MultipleSelect => TypedValue::Array(ArrayFieldValue::from_json(raw)?),
            Self::Checkbox => TypedValue::Boolean(BooleanFieldValue::from_json(raw)?),
            Self::Date => {
                TypedValue::DateTime(DateTimeFieldValue::from_json_with_format(raw, date_format)?)
            }
            Self::Number => TypedValue::Decimal(DecimalFieldValue::from_json(raw)?),
            Self::OneToOneRelationship | Self::Id => {
                TypedValue::Guid(GuidFieldValue::from_json(raw)?)
            }
        };

        Ok(FieldValue::new(*self, value))
    }

    /// Renders the ORDER BY fragment for a value stored under `json_key`
    /// in the JSON column `table.column`.
    ///
    /// Numbers sort numerically with a raw-text tiebreak, dates are parsed
    /// with `date_format` (the default pattern when `None`), and every
    /// other type sorts by the raw JSON text.
    #[must_use]
    pub fn order_by_expression(
        &self,
        provider: DatabaseProvider,
        table: &str,
        column: &str,
        json_key: &str,
        direction: SortDirection,
        date_format: Option<&DateFormat>,
    ) -> String {
        let direction = direction.as_sql();
        match self {
            Self::Number => {
                let value = json_text_value(provider, table, column, json_key);
                match provider {
                    DatabaseProvider::SqlServer => format!(
                        "CASE WHEN ISNUMERIC({value}) = 1 THEN TRY_CAST({value} AS DECIMAL(38, 10)) ELSE NULL END {direction}, {value} {direction}"
                    ),
                    DatabaseProvider::Postgres => format!(
                        "{} {direction}, {value} {direction}",
                        postgres_number_value(value.as_str())
                    ),
                }
            }
            Self::Date => {
                let value = json_text_value(provider, table, column, json_key);
                let default_format = DateFormat::default();
                let date_format = date_format.unwrap_or(&default_format);
                match provider {
                    DatabaseProvider::SqlServer => format!(
                        "TRY_CONVERT(DATETIME, {value}, {}) {direction}",
                        date_format.sql_server_style_code()
                    ),
                    DatabaseProvider::Postgres => format!(
                        "{} {direction}",
                        postgres_date_value(value.as_str(), date_format)
                    ),
                }
            }
            Self::MultipleSelect if provider == DatabaseProvider::SqlServer => format!(
                "{} {direction}",
                json_array_value(provider, table, column, json_key)
            ),
            _ => format!(
                "{} {direction}",
                json_text_value(provider, table, column, json_key)
            ),
        }
    }
}

impl Display for BaseFieldType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for BaseFieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::SUPPORTED
            .iter()
            .chain(std::iter::once(&Self::Id))
            .copied()
            .find(|field_type| field_type.as_str() == value)
            .ok_or_else(|| AppError::Unsupported(format!("unsupported field type '{value}'")))
    }
}

impl TryFrom<String> for BaseFieldType {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BaseFieldType> for &'static str {
    fn from(value: BaseFieldType) -> Self {
        value.as_str()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vellum_core::AppError;

    use super::BaseFieldType;
    use crate::{ConditionOperator, DatabaseProvider, DateFormat, SortDirection};

    #[test]
    fn supported_types_round_trip_developer_names() {
        assert_eq!(BaseFieldType::supported_types().len(), 11);
        for field_type in BaseFieldType::supported_types() {
            let parsed = field_type
                .as_str()
                .parse::<BaseFieldType>()
                .unwrap_or_else(|_| unreachable!());
            assert_eq!(parsed, *field_type);
            assert_eq!(parsed.to_string(), field_type.as_str());
        }
        assert!(!BaseFieldType::supported_types().contains(&BaseFieldType::Id));
        assert_eq!("id".parse::<BaseFieldType>().ok(), Some(BaseFieldType::Id));
    }

    #[test]
    fn unknown_field_type_fails_closed() {
        let result = "rating".parse::<BaseFieldType>();
        assert!(matches!(result, Err(AppError::Unsupported(message)) if message.contains("rating")));
        assert!("Number".parse::<BaseFieldType>().is_err());
    }

    #[test]
    fn operator_counts_per_variant() {
        let expected = [
            (BaseFieldType::SingleLineText, 10),
            (BaseFieldType::LongText, 10),
            (BaseFieldType::Wysiwyg, 10),
            (BaseFieldType::Radio, 4),
            (BaseFieldType::Dropdown, 4),
            (BaseFieldType::MultipleSelect, 4),
            (BaseFieldType::Number, 8),
            (BaseFieldType::Date, 8),
            (BaseFieldType::Id, 2),
            (BaseFieldType::Attachment, 2),
            (BaseFieldType::Checkbox, 2),
            (BaseFieldType::OneToOneRelationship, 4),
        ];

        for (field_type, count) in expected {
            assert_eq!(
                field_type.supported_condition_operators().len(),
                count,
                "{}",
                field_type.as_str()
            );
        }
    }

    #[test]
    fn choice_flags() {
        assert!(BaseFieldType::Radio.has_choices());
        assert!(BaseFieldType::MultipleSelect.has_choices());
        assert!(!BaseFieldType::SingleLineText.has_choices());
        assert!(BaseFieldType::Checkbox.supports(ConditionOperator::IsTrue));
        assert!(!BaseFieldType::Number.supports(ConditionOperator::Contains));
    }

    #[test]
    fn numeric_and_date_value_from_fail_loud() {
        assert!(matches!(
            BaseFieldType::Number.value_from(&json!("not a number")),
            Err(AppError::Format(_))
        ));
        assert!(matches!(
            BaseFieldType::Date.value_from(&json!("yesterday-ish")),
            Err(AppError::Format(_))
        ));
    }

    #[test]
    fn value_from_tags_field_type() {
        let value = BaseFieldType::Dropdown
            .value_from(&json!("red"))
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(value.field_type(), BaseFieldType::Dropdown);
        assert_eq!(value.text(), "red");
        assert!(value.has_value());
    }

    #[test]
    fn numeric_sql_server_ordering_fragment() {
        let fragment = BaseFieldType::Number.order_by_expression(
            DatabaseProvider::SqlServer,
            "t",
            "c",
            "k",
            SortDirection::Asc,
            None,
        );
        assert_eq!(
            fragment,
            "CASE WHEN ISNUMERIC(JSON_VALUE([t].[c], '$.k')) = 1 THEN TRY_CAST(JSON_VALUE([t].[c], '$.k') AS DECIMAL(38, 10)) ELSE NULL END ASC, JSON_VALUE([t].[c], '$.k') ASC"
        );
    }

    #[test]
    fn numeric_postgres_ordering_fragment() {
        let fragment = BaseFieldType::Number.order_by_expression(
            DatabaseProvider::Postgres,
            "t",
            "c",
            "k",
            SortDirection::Desc,
            None,
        );
        assert_eq!(
            fragment,
            r#"CASE WHEN ("t"."c" ->> 'k') ~ '^-?[0-9]+(\.[0-9]+)?$' THEN CAST("t"."c" ->> 'k' AS DECIMAL) END DESC, "t"."c" ->> 'k' DESC"#
        );
    }

    #[test]
    fn date_sql_server_ordering_uses_style_codes() {
        let render = |pattern: &str| {
            let format = DateFormat::new(pattern).unwrap_or_else(|_| unreachable!());
            BaseFieldType::Date.order_by_expression(
                DatabaseProvider::SqlServer,
                "t",
                "c",
                "k",
                SortDirection::Asc,
                Some(&format),
            )
        };

        assert_eq!(
            render("MM/dd/yyyy"),
            "TRY_CONVERT(DATETIME, JSON_VALUE([t].[c], '$.k'), 101) ASC"
        );
        assert_eq!(
            render("dd/MM/yyyy"),
            "TRY_CONVERT(DATETIME, JSON_VALUE([t].[c], '$.k'), 103) ASC"
        );
        assert_eq!(
            render("d MMMM yyyy"),
            "TRY_CONVERT(DATETIME, JSON_VALUE([t].[c], '$.k'), 0) ASC"
        );
    }

    #[test]
    fn date_postgres_ordering_skips_text_outside_the_format() {
        let fragment = BaseFieldType::Date.order_by_expression(
            DatabaseProvider::Postgres,
            "t",
            "c",
            "k",
            SortDirection::Asc,
            None,
        );
        assert_eq!(
            fragment,
            r#"CASE WHEN ("t"."c" ->> 'k') ~ '^(0?[1-9]|1[0-2])/(0?[1-9]|[12][0-9]|3[01])/[0-9]{4}$' THEN TO_DATE("t"."c" ->> 'k', 'MM/DD/YYYY') END ASC"#
        );
    }

    #[test]
    fn other_types_fall_back_to_json_text() {
        let fragment = BaseFieldType::SingleLineText.order_by_expression(
            DatabaseProvider::Postgres,
            "t",
            "c",
            "title",
            SortDirection::Desc,
            None,
        );
        assert_eq!(fragment, r#""t"."c" ->> 'title' DESC"#);

        let fragment = BaseFieldType::Checkbox.order_by_expression(
            DatabaseProvider::SqlServer,
            "t",
            "c",
            "featured",
            SortDirection::Asc,
            None,
        );
        assert_eq!(fragment, "JSON_VALUE([t].[c], '$.featured') ASC");
    }
}
