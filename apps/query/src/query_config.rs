use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use vellum_application::{DEFAULT_PAGE_SIZE, JsonQuerySettings, MAX_PAGE_SIZE};
use vellum_core::AppError;
use vellum_domain::DateFormat;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub database_url: String,
    pub catalog_path: PathBuf,
    pub settings: JsonQuerySettings,
    pub db_max_connections: u32,
}

impl QueryConfig {
    pub fn load() -> Result<Self, AppError> {
        let database_url = required_non_empty_env("DATABASE_URL")?;
        let catalog_path = PathBuf::from(required_non_empty_env("VELLUM_CATALOG_PATH")?);

        let date_format = env::var("VELLUM_DATE_FORMAT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(DateFormat::new)
            .transpose()?
            .unwrap_or_default();
        let default_page_size = parse_env_u32("VELLUM_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_page_size = parse_env_u32("VELLUM_MAX_PAGE_SIZE", MAX_PAGE_SIZE)?;
        let settings = JsonQuerySettings::new(date_format, default_page_size, max_page_size)?;

        let db_max_connections =
            parse_env_u32("VELLUM_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(AppError::Validation(
                "VELLUM_DB_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            catalog_path,
            settings,
            db_max_connections,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u32>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        _ => Ok(default),
    }
}
