//! Vellum saved-view query tool.

#![forbid(unsafe_code)]

mod catalog_file;
mod cli;
mod query_config;

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;
use vellum_application::{
    CancellationSignal, ContentItemQueryExecutor, JsonQueryEngine, ViewQueryService,
};
use vellum_core::{AppError, AppResult, ViewId};
use vellum_domain::{DatabaseProvider, ViewDefinition};
use vellum_infrastructure::{
    ContentItemStorageLayout, InMemoryContentCatalog, InMemoryContentItemStore,
    JsonQuerySqlRenderer, PostgresStatementRunner, SqlContentItemQueryExecutor, SqlStatement,
};

use crate::cli::{Command, VellumQueryCli, ViewQueryArgs};
use crate::query_config::{QueryConfig, init_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = VellumQueryCli::parse();
    let config = QueryConfig::load()?;
    let catalog = Arc::new(catalog_file::load_catalog(&config.catalog_path).await?);
    info!(catalog = %config.catalog_path.display(), "loaded view catalog");

    match cli.command {
        Command::Explain(args) => explain(&config, catalog, &args).await,
        Command::Run(args) => run(&config, catalog, &args).await,
        Command::Compile { view } => compile(&config, catalog, view.as_str()).await,
    }
}

async fn explain(
    config: &QueryConfig,
    catalog: Arc<InMemoryContentCatalog>,
    args: &ViewQueryArgs,
) -> AppResult<()> {
    let provider = DatabaseProvider::detect(config.database_url.as_str())?;
    let store = Arc::new(InMemoryContentItemStore::new(
        config.settings.date_format().clone(),
    ));
    let service = view_query_service(config, catalog, store);

    let view = resolve_view(&service, args.view.as_str()).await?;
    let content_type = service.load_content_type(&view).await?;
    let request = service.build_request(&content_type, &view, args.to_request())?;
    let plan = service.engine().plan(&content_type, &request)?;

    let renderer = JsonQuerySqlRenderer::new(
        provider,
        ContentItemStorageLayout::default(),
        config.settings.date_format().clone(),
    );
    info!(provider = provider.as_str(), view = %view.developer_name(), "explaining view");

    print_statement("select", &renderer.render_select(&plan)?);
    print_statement("count", &renderer.render_count(&plan)?);
    Ok(())
}

async fn run(
    config: &QueryConfig,
    catalog: Arc<InMemoryContentCatalog>,
    args: &ViewQueryArgs,
) -> AppResult<()> {
    let provider = DatabaseProvider::detect(config.database_url.as_str())?;
    if provider != DatabaseProvider::Postgres {
        return Err(AppError::Unsupported(format!(
            "running queries against '{}' is not supported; use explain instead",
            provider.as_str()
        )));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    let executor = SqlContentItemQueryExecutor::new(
        config.database_url.as_str(),
        Arc::new(PostgresStatementRunner::new(pool)),
        ContentItemStorageLayout::default(),
        config.settings.date_format().clone(),
    )?;
    let service = view_query_service(config, catalog, Arc::new(executor));

    let view = resolve_view(&service, args.view.as_str()).await?;
    info!(view = %view.developer_name(), "running view");
    let page = service
        .query_loaded_view(&view, args.to_request(), &CancellationSignal::new())
        .await?;

    let output = serde_json::to_string_pretty(&page)
        .map_err(|error| AppError::Internal(format!("failed to serialize page: {error}")))?;
    println!("{output}");
    Ok(())
}

async fn compile(
    config: &QueryConfig,
    catalog: Arc<InMemoryContentCatalog>,
    view: &str,
) -> AppResult<()> {
    let store = Arc::new(InMemoryContentItemStore::new(
        config.settings.date_format().clone(),
    ));
    let service = view_query_service(config, catalog, store);

    let view = resolve_view(&service, view).await?;
    let content_type = service.load_content_type(&view).await?;
    match service.compile_view_filter(&content_type, &view)? {
        Some(filter) => println!("{filter}"),
        None => info!(view = %view.developer_name(), "view has no filter"),
    }
    Ok(())
}

fn view_query_service(
    config: &QueryConfig,
    catalog: Arc<InMemoryContentCatalog>,
    executor: Arc<dyn ContentItemQueryExecutor>,
) -> ViewQueryService {
    let engine = JsonQueryEngine::new(catalog.clone(), executor, config.settings.clone());
    ViewQueryService::new(catalog, engine)
}

/// Resolves a view by identifier, falling back to its developer name.
async fn resolve_view(service: &ViewQueryService, view: &str) -> AppResult<ViewDefinition> {
    match Uuid::parse_str(view) {
        Ok(view_id) => service.load_view(ViewId::from_uuid(view_id)).await,
        Err(_) => service.load_view_by_name(view).await,
    }
}

fn print_statement(label: &str, statement: &SqlStatement) {
    println!("-- {label}");
    println!("{}", statement.sql);
    for (index, param) in statement.params.iter().enumerate() {
        println!("--   {} = {param}", index + 1);
    }
}
