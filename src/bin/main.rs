//! crm-query CLI - Compile tenant-scoped CRM searches to SQL
//!
//! Usage:
//!   crm-query compile --entity <entity> --tenant <id> <request.json> [--dialect <dialect>]
//!   crm-query params --entity <entity> --tenant <id> [key=value ...]
//!   crm-query search --entity <entity> --tenant <id> <request.json>
//!   crm-query fields --entity <entity>
//!   crm-query entities
//!
//! Examples:
//!   crm-query compile --entity lead --tenant t1 request.json --dialect mysql
//!   crm-query params --entity lead --tenant t1 status=QUALIFIED 'leadScore[GREATER_THAN]=80'
//!
//! Logging goes to stderr and is controlled by `CRM_QUERY_LOG` (e.g. `debug`).

use clap::{Parser, Subcommand, ValueEnum};
use crm_query::compile::{compile_search, CompileOptions, CompiledSearch};
use crm_query::config::Settings;
use crm_query::params::parse_flat;
use crm_query::sql::Dialect;
use crm_query::store::{self, SqliteStore};
use crm_query::{Catalog, SearchRequest, TenantId};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CRM_QUERY_LOG";

#[derive(Parser)]
#[command(name = "crm-query")]
#[command(about = "Compile tenant-scoped CRM searches to SQL")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $CRM_QUERY_CONFIG, then ./crm-query.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON search request to SQL
    Compile {
        /// Path to the request JSON
        file: PathBuf,

        #[arg(short, long)]
        entity: String,

        #[arg(short, long)]
        tenant: String,

        /// SQL dialect to generate (overrides the config file)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Compile flat query parameters (key=value) to SQL
    Params {
        #[arg(short, long)]
        entity: String,

        #[arg(short, long)]
        tenant: String,

        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Parameters as key=value
        params: Vec<String>,
    },

    /// Run a JSON search request against the configured SQLite store
    Search {
        file: PathBuf,

        #[arg(short, long)]
        entity: String,

        #[arg(short, long)]
        tenant: String,
    },

    /// List the searchable fields of an entity
    Fields {
        #[arg(short, long)]
        entity: String,
    },

    /// List entities
    Entities,
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Sqlite,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Sqlite => Dialect::Sqlite,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with comments
    Verbose,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let catalog = Catalog::crm();

    match cli.command {
        Commands::Compile {
            file,
            entity,
            tenant,
            dialect,
            output,
        } => cmd_compile(&catalog, &settings, file, &entity, &tenant, dialect, output),
        Commands::Params {
            entity,
            tenant,
            dialect,
            params,
        } => cmd_params(&catalog, &settings, &entity, &tenant, dialect, params),
        Commands::Search {
            file,
            entity,
            tenant,
        } => cmd_search(&catalog, &settings, file, &entity, &tenant),
        Commands::Fields { entity } => cmd_fields(&catalog, &entity),
        Commands::Entities => {
            for name in catalog.names() {
                println!("{}", name);
            }
            ExitCode::SUCCESS
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn options(settings: &Settings, dialect: Option<DialectArg>) -> CompileOptions {
    CompileOptions::default()
        .with_dialect(dialect.map_or(settings.dialect, Dialect::from))
        .with_limits(settings.pagination)
}

fn tenant_id(tenant: &str) -> Option<TenantId> {
    if tenant.trim().is_empty() {
        eprintln!("Tenant id must not be empty");
        return None;
    }
    Some(TenantId::new(tenant))
}

fn read_request(file: &PathBuf) -> Option<SearchRequest> {
    let source = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&source) {
        Ok(request) => Some(request),
        Err(e) => {
            eprintln!("Invalid request in '{}': {}", file.display(), e);
            None
        }
    }
}

fn print_sql(compiled: &CompiledSearch) {
    println!("{};", compiled.select_sql);
    println!("{};", compiled.count_sql);
}

fn cmd_compile(
    catalog: &Catalog,
    settings: &Settings,
    file: PathBuf,
    entity: &str,
    tenant: &str,
    dialect: Option<DialectArg>,
    output: OutputFormat,
) -> ExitCode {
    let (Some(tenant), Some(request)) = (tenant_id(tenant), read_request(&file)) else {
        return ExitCode::FAILURE;
    };

    match compile_search(catalog, entity, &tenant, &request, &options(settings, dialect)) {
        Ok(compiled) => {
            if let OutputFormat::Verbose = output {
                println!("-- Source: {}", file.display());
                println!("-- Entity: {}", entity);
                println!("-- Dialect: {}", compiled.dialect);
                println!(
                    "-- Page: {} (limit {}, offset {})",
                    compiled.page.page, compiled.page.limit, compiled.page.offset
                );
                for field in compiled.specification.best_effort_fields() {
                    println!("-- Best-effort custom field: {}", field);
                }
                println!();
            }
            print_sql(&compiled);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_params(
    catalog: &Catalog,
    settings: &Settings,
    entity: &str,
    tenant: &str,
    dialect: Option<DialectArg>,
    params: Vec<String>,
) -> ExitCode {
    let Some(tenant) = tenant_id(tenant) else {
        return ExitCode::FAILURE;
    };
    let Some(schema) = catalog.entity(entity) else {
        eprintln!("Unknown entity type: {}", entity);
        return ExitCode::FAILURE;
    };

    let mut pairs = Vec::with_capacity(params.len());
    for param in &params {
        match param.split_once('=') {
            Some(pair) => pairs.push(pair),
            None => {
                eprintln!("Expected key=value, got '{}'", param);
                return ExitCode::FAILURE;
            }
        }
    }

    let request = match parse_flat(pairs, schema, catalog, settings.filters.enum_parse_mode) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Invalid parameters: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match compile_search(catalog, entity, &tenant, &request, &options(settings, dialect)) {
        Ok(compiled) => {
            print_sql(&compiled);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_search(
    catalog: &Catalog,
    settings: &Settings,
    file: PathBuf,
    entity: &str,
    tenant: &str,
) -> ExitCode {
    let (Some(tenant), Some(request)) = (tenant_id(tenant), read_request(&file)) else {
        return ExitCode::FAILURE;
    };

    let opened = match settings.store.resolved_path() {
        Ok(Some(path)) => SqliteStore::open(path),
        Ok(None) => SqliteStore::open_in_memory(),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = match opened.and_then(|s| s.create_tables(catalog).map(|_| s)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Store error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let page = store::search(
        &store,
        catalog,
        entity,
        &tenant,
        &request,
        &options(settings, None),
    );
    match page.and_then(|p| Ok(serde_json::to_string_pretty(&p)?)) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Search error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_fields(catalog: &Catalog, entity: &str) -> ExitCode {
    let Some(schema) = catalog.entity(entity) else {
        eprintln!("Unknown entity type: {}", entity);
        return ExitCode::FAILURE;
    };

    println!("Entity: {} (table: \"{}\")", schema.name, schema.table);
    println!();
    println!("Fields:");
    for column in &schema.columns {
        if column.variants.is_empty() {
            println!("  - {} ({})", column.field, column.kind);
        } else {
            println!(
                "  - {} ({}: {})",
                column.field,
                column.kind,
                column.variants.join(", ")
            );
        }
    }

    if !schema.relationships.is_empty() {
        println!();
        println!("Relationships:");
        for rel in &schema.relationships {
            println!("  - {} -> {}", rel.name, rel.target);
        }
    }
    if schema.custom_fields_column.is_some() {
        println!();
        println!("Custom fields: customFields.<key>");
    }
    ExitCode::SUCCESS
}
