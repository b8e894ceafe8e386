use vellum_core::{AppError, AppResult};
use vellum_domain::DateFormat;

/// Page size used when a request asks for zero rows.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size a request may receive.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Tunables of the JSON query engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonQuerySettings {
    date_format: DateFormat,
    default_page_size: u32,
    max_page_size: u32,
}

impl JsonQuerySettings {
    /// Creates validated settings.
    pub fn new(
        date_format: DateFormat,
        default_page_size: u32,
        max_page_size: u32,
    ) -> AppResult<Self> {
        if default_page_size == 0 || max_page_size == 0 {
            return Err(AppError::Validation(
                "page sizes must be greater than zero".to_owned(),
            ));
        }

        if default_page_size > max_page_size {
            return Err(AppError::Validation(format!(
                "default page size {default_page_size} exceeds max page size {max_page_size}"
            )));
        }

        Ok(Self {
            date_format,
            default_page_size,
            max_page_size,
        })
    }

    /// Returns the organization date format.
    #[must_use]
    pub fn date_format(&self) -> &DateFormat {
        &self.date_format
    }

    /// Returns the page size used for zero-sized requests.
    #[must_use]
    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Returns the page size ceiling.
    #[must_use]
    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    /// Clamps a requested page size into `1..=max_page_size`.
    #[must_use]
    pub fn effective_page_size(&self, requested: u32) -> u32 {
        match requested {
            0 => self.default_page_size,
            size => size.min(self.max_page_size),
        }
    }
}

impl Default for JsonQuerySettings {
    fn default() -> Self {
        Self {
            date_format: DateFormat::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}
