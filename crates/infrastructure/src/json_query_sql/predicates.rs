use vellum_application::{BoundFilter, FieldPredicate, FieldTarget, SearchPredicate};
use vellum_core::{AppError, AppResult};
use vellum_domain::sql_fragments::{postgres_date_value, postgres_number_value};
use vellum_domain::{BaseFieldType, ConditionOperator, DatabaseProvider, FieldValue, TypedValue};

use super::{JsonQuerySqlRenderer, SqlParam, SqlStatementBuilder};

const SQL_SERVER_DECIMAL: &str = "DECIMAL(38, 10)";
const TRUE_TEXT_VALUES: &str = "('true', '1', 'yes', 'on', 'checked')";
const ISO_DATE_STYLE: u16 = 23;

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Contains,
    StartsWith,
    EndsWith,
}

impl Pattern {
    fn wrap(self, escaped: &str) -> String {
        match self {
            Self::Contains => format!("%{escaped}%"),
            Self::StartsWith => format!("{escaped}%"),
            Self::EndsWith => format!("%{escaped}"),
        }
    }
}

impl JsonQuerySqlRenderer {
    pub(super) fn render_filter(
        &self,
        builder: &mut SqlStatementBuilder,
        filter: &BoundFilter,
    ) -> AppResult<()> {
        match filter {
            BoundFilter::And(children) => self.render_group(builder, children, true),
            BoundFilter::Or(children) => self.render_group(builder, children, false),
            BoundFilter::Not(child) => {
                builder.push("NOT (");
                self.render_filter(builder, child)?;
                builder.push(")");
                Ok(())
            }
            BoundFilter::Predicate(predicate) => {
                let condition = self.render_predicate(builder, predicate)?;
                builder.push(self.two_valued(condition.as_str()));
                Ok(())
            }
        }
    }

    fn render_group(
        &self,
        builder: &mut SqlStatementBuilder,
        children: &[BoundFilter],
        conjunction: bool,
    ) -> AppResult<()> {
        if children.is_empty() {
            builder.push(match (self.provider, conjunction) {
                (DatabaseProvider::Postgres, true) => "TRUE",
                (DatabaseProvider::Postgres, false) => "FALSE",
                (DatabaseProvider::SqlServer, true) => "1 = 1",
                (DatabaseProvider::SqlServer, false) => "1 = 0",
            });
            return Ok(());
        }

        let separator = if conjunction { " AND " } else { " OR " };
        builder.push("(");
        for (index, child) in children.iter().enumerate() {
            if index > 0 {
                builder.push(separator);
            }
            self.render_filter(builder, child)?;
        }
        builder.push(")");

        Ok(())
    }

    /// Renders free-text search as an OR of case-insensitive contains checks.
    pub(super) fn render_search(&self, builder: &mut SqlStatementBuilder, search: &SearchPredicate) {
        let pattern = Pattern::Contains.wrap(self.escape_like(search.term.as_str()).as_str());
        let placeholder = builder.bind(SqlParam::Text(pattern));
        let conditions = search
            .columns
            .iter()
            .map(|column| {
                let text = self.text_expression(&column.target, column.field_type);
                self.two_valued(self.like_condition(text.as_str(), placeholder.as_str()).as_str())
            })
            .collect::<Vec<_>>()
            .join(" OR ");

        builder.push("(").push(conditions).push(")");
    }

    fn render_predicate(
        &self,
        builder: &mut SqlStatementBuilder,
        predicate: &FieldPredicate,
    ) -> AppResult<String> {
        match predicate.operator {
            ConditionOperator::IsEmpty => Ok(self.empty_condition(predicate)),
            ConditionOperator::IsTrue => Ok(self.true_condition(&predicate.target)),
            ConditionOperator::Equals => {
                let operand = required_operand(predicate)?;
                self.equals_condition(builder, predicate, operand)
            }
            ConditionOperator::Contains => {
                self.pattern_condition(builder, predicate, Pattern::Contains)
            }
            ConditionOperator::StartsWith => {
                self.pattern_condition(builder, predicate, Pattern::StartsWith)
            }
            ConditionOperator::EndsWith => {
                self.pattern_condition(builder, predicate, Pattern::EndsWith)
            }
            ConditionOperator::Has => self.has_condition(builder, predicate),
            ConditionOperator::GreaterThan => self.ordered_condition(builder, predicate, ">"),
            ConditionOperator::LessThan => self.ordered_condition(builder, predicate, "<"),
            ConditionOperator::GreaterThanOrEqual => {
                self.ordered_condition(builder, predicate, ">=")
            }
            ConditionOperator::LessThanOrEqual => {
                self.ordered_condition(builder, predicate, "<=")
            }
            operator => Err(AppError::Internal(format!(
                "operator '{}' on field '{}' must be normalized before rendering",
                operator.as_str(),
                predicate.target.developer_name()
            ))),
        }
    }

    fn two_valued(&self, condition: &str) -> String {
        match self.provider {
            DatabaseProvider::Postgres => format!("COALESCE({condition}, FALSE)"),
            DatabaseProvider::SqlServer => format!("CASE WHEN {condition} THEN 1 ELSE 0 END = 1"),
        }
    }

    fn empty_condition(&self, predicate: &FieldPredicate) -> String {
        match &predicate.target {
            FieldTarget::Column(column) => format!("{} IS NULL", self.column(*column)),
            FieldTarget::JsonKey(_) if predicate.field_type == BaseFieldType::MultipleSelect => {
                let text = self.text_expression(&predicate.target, predicate.field_type);
                format!("({text} IS NULL OR {text} IN ('', '[]'))")
            }
            FieldTarget::JsonKey(key) => {
                let text = self.json_text(key.as_str());
                format!("({text} IS NULL OR {text} = '')")
            }
        }
    }

    fn true_condition(&self, target: &FieldTarget) -> String {
        match (target, self.provider) {
            (FieldTarget::Column(column), DatabaseProvider::Postgres) => {
                format!("{} = TRUE", self.column(*column))
            }
            (FieldTarget::Column(column), DatabaseProvider::SqlServer) => {
                format!("{} = 1", self.column(*column))
            }
            (FieldTarget::JsonKey(key), _) => {
                format!("LOWER({}) IN {TRUE_TEXT_VALUES}", self.json_text(key.as_str()))
            }
        }
    }

    fn equals_condition(
        &self,
        builder: &mut SqlStatementBuilder,
        predicate: &FieldPredicate,
        operand: &FieldValue,
    ) -> AppResult<String> {
        match (predicate.field_type, &predicate.target) {
            (BaseFieldType::Number | BaseFieldType::Date, _) => {
                self.ordered_condition(builder, predicate, "=")
            }
            (BaseFieldType::Checkbox | BaseFieldType::MultipleSelect, _) => {
                Err(unsupported(predicate))
            }
            (BaseFieldType::Id, FieldTarget::Column(column)) => {
                let TypedValue::Guid(value) = operand.value() else {
                    return Err(operand_mismatch(predicate));
                };
                let placeholder = builder.bind(SqlParam::Uuid(value.value()));
                Ok(format!("{} = {placeholder}", self.column(*column)))
            }
            _ => {
                let text = self.text_expression(&predicate.target, predicate.field_type);
                let placeholder = builder.bind(SqlParam::Text(operand.text()));
                Ok(format!("LOWER({text}) = LOWER({placeholder})"))
            }
        }
    }

    fn pattern_condition(
        &self,
        builder: &mut SqlStatementBuilder,
        predicate: &FieldPredicate,
        pattern: Pattern,
    ) -> AppResult<String> {
        let operand = required_operand(predicate)?;
        let escaped = self.escape_like(operand.text().as_str());
        let placeholder = builder.bind(SqlParam::Text(pattern.wrap(escaped.as_str())));
        let text = self.text_expression(&predicate.target, predicate.field_type);

        Ok(self.like_condition(text.as_str(), placeholder.as_str()))
    }

    fn like_condition(&self, text: &str, placeholder: &str) -> String {
        match self.provider {
            DatabaseProvider::Postgres => format!("{text} ILIKE {placeholder} ESCAPE '\\'"),
            DatabaseProvider::SqlServer => {
                format!("LOWER({text}) LIKE LOWER({placeholder}) ESCAPE '\\'")
            }
        }
    }

    /// A multi-select value holds an item when its array contains it, or
    /// when a scalar stored in place of the array equals it.
    fn has_condition(
        &self,
        builder: &mut SqlStatementBuilder,
        predicate: &FieldPredicate,
    ) -> AppResult<String> {
        let FieldTarget::JsonKey(key) = &predicate.target else {
            return Err(unsupported(predicate));
        };
        if predicate.field_type != BaseFieldType::MultipleSelect {
            return Err(unsupported(predicate));
        }
        let operand = required_operand(predicate)?;
        let TypedValue::Array(items) = operand.value() else {
            return Err(operand_mismatch(predicate));
        };
        let Some(item) = items.value().first() else {
            return Err(operand_mismatch(predicate));
        };

        let placeholder = builder.bind(SqlParam::Text(item.clone()));
        let scalar = self.json_text(key.as_str());
        let array = self.json_array(key.as_str());
        Ok(match self.provider {
            DatabaseProvider::Postgres => format!(
                "(LOWER({scalar}) = LOWER({placeholder}) OR EXISTS (SELECT 1 FROM jsonb_array_elements_text(CASE WHEN jsonb_typeof({array}) = 'array' THEN {array} ELSE '[]'::jsonb END) AS choice(value) WHERE LOWER(choice.value) = LOWER({placeholder})))"
            ),
            DatabaseProvider::SqlServer => format!(
                "(LOWER({scalar}) = LOWER({placeholder}) OR EXISTS (SELECT 1 FROM OPENJSON(COALESCE({array}, '[]')) WHERE LOWER([value]) = LOWER({placeholder})))"
            ),
        })
    }

    fn ordered_condition(
        &self,
        builder: &mut SqlStatementBuilder,
        predicate: &FieldPredicate,
        comparison: &str,
    ) -> AppResult<String> {
        let operand = required_operand(predicate)?;
        match (predicate.field_type, operand.value()) {
            (BaseFieldType::Number, TypedValue::Decimal(value)) => {
                let placeholder = builder.bind(SqlParam::Text(value.text()));
                let left = self.number_expression(&predicate.target);
                Ok(match self.provider {
                    DatabaseProvider::Postgres => {
                        format!("{left} {comparison} CAST({placeholder} AS DECIMAL)")
                    }
                    DatabaseProvider::SqlServer => {
                        format!("{left} {comparison} CAST({placeholder} AS {SQL_SERVER_DECIMAL})")
                    }
                })
            }
            (BaseFieldType::Date, TypedValue::DateTime(value)) => {
                let Some(day) = value.date() else {
                    return Err(operand_mismatch(predicate));
                };
                let placeholder =
                    builder.bind(SqlParam::Text(day.format("%Y-%m-%d").to_string()));
                let left = self.date_expression(&predicate.target);
                Ok(match self.provider {
                    DatabaseProvider::Postgres => {
                        format!("{left} {comparison} CAST({placeholder} AS DATE)")
                    }
                    DatabaseProvider::SqlServer => format!(
                        "{left} {comparison} CAST(CONVERT(DATETIME, {placeholder}, {ISO_DATE_STYLE}) AS DATE)"
                    ),
                })
            }
            (BaseFieldType::Number | BaseFieldType::Date, _) => Err(operand_mismatch(predicate)),
            _ => Err(unsupported(predicate)),
        }
    }

    /// Numeric form of a target; non-numeric text reads as NULL.
    fn number_expression(&self, target: &FieldTarget) -> String {
        let text = match target {
            FieldTarget::Column(column) => self.column(*column),
            FieldTarget::JsonKey(key) => self.json_text(key.as_str()),
        };
        match self.provider {
            DatabaseProvider::Postgres => postgres_number_value(text.as_str()),
            DatabaseProvider::SqlServer => format!("TRY_CAST({text} AS {SQL_SERVER_DECIMAL})"),
        }
    }

    /// Day-level form of a target; stored text is read with the configured format.
    fn date_expression(&self, target: &FieldTarget) -> String {
        match (target, self.provider) {
            (FieldTarget::Column(column), _) => format!("CAST({} AS DATE)", self.column(*column)),
            (FieldTarget::JsonKey(key), DatabaseProvider::Postgres) => {
                postgres_date_value(self.json_text(key.as_str()).as_str(), &self.date_format)
            }
            (FieldTarget::JsonKey(key), DatabaseProvider::SqlServer) => format!(
                "CAST(TRY_CONVERT(DATETIME, {}, {}) AS DATE)",
                self.json_text(key.as_str()),
                self.date_format.sql_server_style_code()
            ),
        }
    }

    /// Escapes LIKE wildcards so the operand matches literally.
    fn escape_like(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for ch in text.chars() {
            let special = matches!(ch, '\\' | '%' | '_')
                || (ch == '[' && self.provider == DatabaseProvider::SqlServer);
            if special {
                escaped.push('\\');
            }
            escaped.push(ch);
        }
        escaped
    }
}

fn required_operand(predicate: &FieldPredicate) -> AppResult<&FieldValue> {
    predicate.operand.as_ref().ok_or_else(|| {
        AppError::Internal(format!(
            "operator '{}' on field '{}' is missing its operand",
            predicate.operator.as_str(),
            predicate.target.developer_name()
        ))
    })
}

fn unsupported(predicate: &FieldPredicate) -> AppError {
    AppError::Internal(format!(
        "operator '{}' cannot be rendered for {} field '{}'",
        predicate.operator.as_str(),
        predicate.field_type.as_str(),
        predicate.target.developer_name()
    ))
}

fn operand_mismatch(predicate: &FieldPredicate) -> AppError {
    AppError::Internal(format!(
        "operand of field '{}' does not match its {} type",
        predicate.target.developer_name(),
        predicate.field_type.as_str()
    ))
}
