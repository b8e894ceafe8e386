use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use vellum_core::{AppError, AppResult};

/// Organization-wide date pattern used to store date fields as text.
///
/// Patterns use the `MM/dd/yyyy` token style. The same pattern is converted
/// into a chrono format string, a Postgres `TO_DATE` mask and a SQL Server
/// `CONVERT` style code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateFormat(String);

/// Pattern used when nothing is configured.
pub const DEFAULT_DATE_FORMAT: &str = "MM/dd/yyyy";

const ISO_DATE_FORMAT: &str = "yyyy-MM-dd";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateToken {
    Year4,
    Year2,
    Month2,
    Month1,
    MonthAbbreviated,
    MonthName,
    Day2,
    Day1,
    Hour24,
    Hour12,
    Minute,
    Second,
    Literal(char),
}

impl DateFormat {
    /// Creates a validated date format.
    pub fn new(pattern: impl Into<String>) -> AppResult<Self> {
        let pattern = pattern.into();
        let tokens = tokenize(pattern.as_str());
        let has_year = tokens
            .iter()
            .any(|token| matches!(token, DateToken::Year4 | DateToken::Year2));
        let has_month = tokens.iter().any(|token| {
            matches!(
                token,
                DateToken::Month2
                    | DateToken::Month1
                    | DateToken::MonthAbbreviated
                    | DateToken::MonthName
            )
        });
        let has_day = tokens
            .iter()
            .any(|token| matches!(token, DateToken::Day2 | DateToken::Day1));

        if !(has_year && has_month && has_day) {
            return Err(AppError::Validation(format!(
                "date format '{pattern}' must include year, month and day tokens"
            )));
        }

        Ok(Self(pattern))
    }

    /// Returns the `yyyy-MM-dd` pattern compiled filters write dates in.
    #[must_use]
    pub fn iso() -> Self {
        Self(ISO_DATE_FORMAT.to_owned())
    }

    /// Returns the configured pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the SQL Server `CONVERT` style code for this pattern.
    ///
    /// Unrecognized patterns map to `0`, the server default.
    #[must_use]
    pub fn sql_server_style_code(&self) -> u16 {
        sql_server_style_code(self.0.as_str())
    }

    /// Returns the Postgres `TO_DATE` mask for this pattern.
    #[must_use]
    pub fn postgres_mask(&self) -> String {
        tokenize(self.0.as_str())
            .into_iter()
            .map(|token| match token {
                DateToken::Year4 => "YYYY".to_owned(),
                DateToken::Year2 => "YY".to_owned(),
                DateToken::Month2 => "MM".to_owned(),
                DateToken::Month1 => "FMMM".to_owned(),
                DateToken::MonthAbbreviated => "Mon".to_owned(),
                DateToken::MonthName => "FMMonth".to_owned(),
                DateToken::Day2 => "DD".to_owned(),
                DateToken::Day1 => "FMDD".to_owned(),
                DateToken::Hour24 => "HH24".to_owned(),
                DateToken::Hour12 => "HH12".to_owned(),
                DateToken::Minute => "MI".to_owned(),
                DateToken::Second => "SS".to_owned(),
                DateToken::Literal('\'') => "''".to_owned(),
                DateToken::Literal(ch) => ch.to_string(),
            })
            .collect()
    }

    /// Returns an anchored Postgres regular expression for text that
    /// [`Self::postgres_mask`] reads without raising.
    #[must_use]
    pub fn postgres_pattern(&self) -> String {
        let body: String = tokenize(self.0.as_str())
            .into_iter()
            .map(|token| match token {
                DateToken::Year4 => "[0-9]{4}".to_owned(),
                DateToken::Year2 => "[0-9]{2}".to_owned(),
                DateToken::Month2 | DateToken::Month1 | DateToken::Hour12 => {
                    "(0?[1-9]|1[0-2])".to_owned()
                }
                DateToken::MonthAbbreviated => "[A-Za-z]{3}".to_owned(),
                DateToken::MonthName => "[A-Za-z]+".to_owned(),
                DateToken::Day2 | DateToken::Day1 => "(0?[1-9]|[12][0-9]|3[01])".to_owned(),
                DateToken::Hour24 => "([01]?[0-9]|2[0-3])".to_owned(),
                DateToken::Minute | DateToken::Second => "[0-5]?[0-9]".to_owned(),
                DateToken::Literal(ch) if "\\^$.|?*+()[]{}".contains(ch) => format!("\\{ch}"),
                DateToken::Literal(ch) => ch.to_string(),
            })
            .collect();

        format!("^{body}$")
    }

    /// Returns the chrono format string for this pattern.
    #[must_use]
    pub fn chrono_pattern(&self) -> String {
        tokenize(self.0.as_str())
            .into_iter()
            .map(|token| match token {
                DateToken::Year4 => "%Y".to_owned(),
                DateToken::Year2 => "%y".to_owned(),
                DateToken::Month2 | DateToken::Month1 => "%m".to_owned(),
                DateToken::MonthAbbreviated => "%b".to_owned(),
                DateToken::MonthName => "%B".to_owned(),
                DateToken::Day2 | DateToken::Day1 => "%d".to_owned(),
                DateToken::Hour24 => "%H".to_owned(),
                DateToken::Hour12 => "%I".to_owned(),
                DateToken::Minute => "%M".to_owned(),
                DateToken::Second => "%S".to_owned(),
                DateToken::Literal('%') => "%%".to_owned(),
                DateToken::Literal(ch) => ch.to_string(),
            })
            .collect()
    }

    /// Parses text written in this pattern.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let pattern = self.chrono_pattern();
        let text = text.trim();
        NaiveDateTime::parse_from_str(text, pattern.as_str())
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, pattern.as_str())
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }

    /// Formats a value in this pattern.
    #[must_use]
    pub fn format(&self, value: &NaiveDateTime) -> String {
        value.format(self.chrono_pattern().as_str()).to_string()
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(DEFAULT_DATE_FORMAT.to_owned())
    }
}

impl Display for DateFormat {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for DateFormat {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DateFormat> for String {
    fn from(value: DateFormat) -> Self {
        value.0
    }
}

/// Maps a date pattern to a SQL Server `CONVERT` style code.
#[must_use]
pub fn sql_server_style_code(pattern: &str) -> u16 {
    match pattern {
        "MM/dd/yyyy" => 101,
        "yyyy.MM.dd" => 102,
        "dd/MM/yyyy" => 103,
        "dd.MM.yyyy" => 104,
        "dd-MM-yyyy" => 105,
        "MM-dd-yyyy" => 110,
        "yyyy/MM/dd" => 111,
        "yyyyMMdd" => 112,
        "yyyy-MM-dd" => 23,
        _ => 0,
    }
}

fn tokenize(pattern: &str) -> Vec<DateToken> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];
        let mut run = 1;
        while index + run < chars.len() && chars[index + run] == current {
            run += 1;
        }

        match current {
            'y' => tokens.push(if run <= 2 {
                DateToken::Year2
            } else {
                DateToken::Year4
            }),
            'M' => tokens.push(match run {
                1 => DateToken::Month1,
                2 => DateToken::Month2,
                3 => DateToken::MonthAbbreviated,
                _ => DateToken::MonthName,
            }),
            'd' => tokens.push(if run == 1 {
                DateToken::Day1
            } else {
                DateToken::Day2
            }),
            'H' => tokens.push(DateToken::Hour24),
            'h' => tokens.push(DateToken::Hour12),
            'm' => tokens.push(DateToken::Minute),
            's' => tokens.push(DateToken::Second),
            other => {
                tokens.extend(std::iter::repeat_n(DateToken::Literal(other), run));
            }
        }

        index += run;
    }

    tokens
}
