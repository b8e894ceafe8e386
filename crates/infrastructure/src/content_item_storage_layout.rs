use std::borrow::Cow;

use vellum_core::{AppResult, DeveloperName};
use vellum_domain::BuiltInColumn;

/// Table and column names of the content item store.
///
/// Configured names are validated as developer names so they can be quoted
/// and inlined into generated SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItemStorageLayout {
    table: Cow<'static, str>,
    alias: Cow<'static, str>,
    json_column: Cow<'static, str>,
    content_type_id_column: &'static str,
    built_in_columns: [&'static str; 6],
}

impl ContentItemStorageLayout {
    /// Creates a layout with the default built-in column names.
    pub fn new(
        table: impl Into<String>,
        alias: impl Into<String>,
        json_column: impl Into<String>,
    ) -> AppResult<Self> {
        let validated = |name: String| -> AppResult<Cow<'static, str>> {
            Ok(Cow::Owned(DeveloperName::new(name)?.as_str().to_owned()))
        };

        Ok(Self {
            table: validated(table.into())?,
            alias: validated(alias.into())?,
            json_column: validated(json_column.into())?,
            ..Self::default()
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the table alias used in generated SQL.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the JSON payload column.
    #[must_use]
    pub fn json_column(&self) -> &str {
        &self.json_column
    }

    /// Returns the content type foreign key column.
    #[must_use]
    pub fn content_type_id_column(&self) -> &str {
        self.content_type_id_column
    }

    /// Returns the table column backing a built-in column.
    #[must_use]
    pub fn column(&self, column: BuiltInColumn) -> &str {
        let index = BuiltInColumn::ALL
            .iter()
            .position(|candidate| *candidate == column)
            .unwrap_or_default();
        self.built_in_columns[index]
    }

    /// Returns every selected column in row order.
    #[must_use]
    pub fn selected_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = vec![self.column(BuiltInColumn::Id), self.content_type_id_column()];
        columns.extend(
            BuiltInColumn::ALL
                .iter()
                .filter(|column| **column != BuiltInColumn::Id)
                .map(|column| self.column(*column)),
        );
        columns.push(self.json_column());
        columns
    }
}

impl Default for ContentItemStorageLayout {
    fn default() -> Self {
        Self {
            table: Cow::Borrowed("content_items"),
            alias: Cow::Borrowed("ci"),
            json_column: Cow::Borrowed("published_content"),
            content_type_id_column: "content_type_id",
            built_in_columns: BuiltInColumn::ALL.map(|column| column.developer_name()),
        }
    }
}
