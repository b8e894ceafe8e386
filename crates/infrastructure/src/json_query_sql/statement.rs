use std::fmt::{Display, Formatter};

use uuid::Uuid;
use vellum_domain::DatabaseProvider;
use vellum_domain::sql_fragments::quote_literal;

/// Positional parameter bound to a rendered statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// Text parameter.
    Text(String),
    /// Identifier parameter.
    Uuid(Uuid),
    /// Integer parameter used for paging.
    Integer(i64),
}

impl Display for SqlParam {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => formatter.write_str(quote_literal(value).as_str()),
            Self::Uuid(value) => write!(formatter, "'{value}'"),
            Self::Integer(value) => write!(formatter, "{value}"),
        }
    }
}

/// SQL text with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// Statement text using `$n` or `@pn` placeholders.
    pub sql: String,
    /// Parameter values; the first binds to placeholder one.
    pub params: Vec<SqlParam>,
}

/// Accumulates SQL text and numbered parameters for one dialect.
#[derive(Debug)]
pub(crate) struct SqlStatementBuilder {
    provider: DatabaseProvider,
    sql: String,
    params: Vec<SqlParam>,
}

impl SqlStatementBuilder {
    pub(crate) fn new(provider: DatabaseProvider) -> Self {
        Self {
            provider,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, fragment: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(fragment.as_ref());
        self
    }

    /// Registers a parameter and returns its placeholder without writing it.
    pub(crate) fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        let position = self.params.len();
        match self.provider {
            DatabaseProvider::Postgres => format!("${position}"),
            DatabaseProvider::SqlServer => format!("@p{position}"),
        }
    }

    pub(crate) fn push_bind(&mut self, param: SqlParam) -> &mut Self {
        let placeholder = self.bind(param);
        self.push(placeholder)
    }

    pub(crate) fn build(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}
