//! Dialect-specific SQL text helpers shared by ordering and predicate rendering.

use crate::{DatabaseProvider, DateFormat};

const POSTGRES_NUMBER_PATTERN: &str = "'^-?[0-9]+(\\.[0-9]+)?$'";

/// Quotes an identifier for the provider.
#[must_use]
pub fn quote_identifier(provider: DatabaseProvider, name: &str) -> String {
    match provider {
        DatabaseProvider::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
        DatabaseProvider::SqlServer => format!("[{}]", name.replace(']', "]]")),
    }
}

/// Quotes a string literal.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Returns a qualified `table.column` reference.
#[must_use]
pub fn qualified_column(provider: DatabaseProvider, table: &str, column: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier(provider, table),
        quote_identifier(provider, column)
    )
}

/// Extracts a scalar JSON member as text.
#[must_use]
pub fn json_text_value(provider: DatabaseProvider, table: &str, column: &str, json_key: &str) -> String {
    let column = qualified_column(provider, table, column);
    match provider {
        DatabaseProvider::Postgres => format!("{column} ->> {}", quote_literal(json_key)),
        DatabaseProvider::SqlServer => {
            format!("JSON_VALUE({column}, {})", quote_literal(format!("$.{json_key}").as_str()))
        }
    }
}

/// Extracts an array JSON member as JSON text.
#[must_use]
pub fn json_array_value(provider: DatabaseProvider, table: &str, column: &str, json_key: &str) -> String {
    let column = qualified_column(provider, table, column);
    match provider {
        DatabaseProvider::Postgres => format!("{column} -> {}", quote_literal(json_key)),
        DatabaseProvider::SqlServer => {
            format!("JSON_QUERY({column}, {})", quote_literal(format!("$.{json_key}").as_str()))
        }
    }
}

/// Reads Postgres text as a decimal; text that is not a plain number reads as NULL.
#[must_use]
pub fn postgres_number_value(text: &str) -> String {
    format!("CASE WHEN ({text}) ~ {POSTGRES_NUMBER_PATTERN} THEN CAST({text} AS DECIMAL) END")
}

/// Reads Postgres text as a date in `date_format`.
///
/// `TO_DATE` raises on text outside its mask, so only text matching the
/// format's pattern reaches it; everything else reads as NULL.
#[must_use]
pub fn postgres_date_value(text: &str, date_format: &DateFormat) -> String {
    format!(
        "CASE WHEN ({text}) ~ {} THEN TO_DATE({text}, {}) END",
        quote_literal(date_format.postgres_pattern().as_str()),
        quote_literal(date_format.postgres_mask().as_str())
    )
}

#[cfg(test)]
mod tests {
    use super::{
        json_array_value, json_text_value, postgres_date_value, postgres_number_value,
        quote_identifier, quote_literal,
    };
    use crate::{DatabaseProvider, DateFormat};

    #[test]
    fn quotes_identifiers_per_dialect() {
        assert_eq!(quote_identifier(DatabaseProvider::Postgres, "a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_identifier(DatabaseProvider::SqlServer, "a]b"), "[a]]b]");
    }

    #[test]
    fn escapes_single_quotes_in_literals() {
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }

    #[test]
    fn renders_json_member_access() {
        assert_eq!(
            json_text_value(DatabaseProvider::Postgres, "t", "c", "k"),
            "\"t\".\"c\" ->> 'k'"
        );
        assert_eq!(
            json_text_value(DatabaseProvider::SqlServer, "t", "c", "k"),
            "JSON_VALUE([t].[c], '$.k')"
        );
        assert_eq!(
            json_array_value(DatabaseProvider::SqlServer, "t", "c", "tags"),
            "JSON_QUERY([t].[c], '$.tags')"
        );
    }

    #[test]
    fn postgres_number_accepts_signed_decimals_only() {
        assert_eq!(
            postgres_number_value("v"),
            r"CASE WHEN (v) ~ '^-?[0-9]+(\.[0-9]+)?$' THEN CAST(v AS DECIMAL) END"
        );
    }

    #[test]
    fn postgres_date_only_parses_text_shaped_like_the_format() {
        assert_eq!(
            postgres_date_value("v", &DateFormat::default()),
            "CASE WHEN (v) ~ '^(0?[1-9]|1[0-2])/(0?[1-9]|[12][0-9]|3[01])/[0-9]{4}$' THEN TO_DATE(v, 'MM/DD/YYYY') END"
        );
    }
}
