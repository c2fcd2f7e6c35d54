use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use criteria_core::{DynRecord, FieldSchema, FilterCondition, Scope};
use criteria_store::{InMemoryStore, ListRequest, PageError, Paginator};

mod schemas;

use schemas::Entity;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Exit status for requests rejected because of caller input.
const EXIT_BAD_REQUEST: u8 = 2;

/// Listkit - filter, search and page through entity datasets
#[derive(Parser)]
#[command(name = "listkit")]
#[command(about = "Listkit - filter, search and page through entity datasets")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one list query against a JSON dataset
    List(ListArgs),
    /// Check configuration and entity schemas
    Check,
}

#[derive(Args)]
struct ListArgs {
    /// Entity type of the dataset rows
    #[arg(long, value_enum)]
    entity: Entity,

    /// JSON file holding an array of row objects
    #[arg(long)]
    data: PathBuf,

    /// Mandatory scope constraint, e.g. workspaceId=W1
    #[arg(long)]
    scope: String,

    /// Filter as field=op:value[,op:value], repeatable
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// Combine the values of this field's filter with OR instead of AND
    #[arg(long = "any")]
    any_fields: Vec<String>,

    /// Free-text search across the entity's searchable fields
    #[arg(long)]
    search: Option<String>,

    /// Sort token such as desc:createdAt, repeatable
    #[arg(long = "sort")]
    sort: Vec<String>,

    /// Page size (clamped to the configured maximum)
    #[arg(long)]
    size: Option<u64>,

    /// Cursor from a previous page
    #[arg(long, conflicts_with = "page")]
    cursor: Option<String>,

    /// Zero-based page number; switches to offset pagination
    #[arg(long)]
    page: Option<u64>,

    /// Follow next-page cursors and print every matching row
    #[arg(long, conflicts_with_all = ["cursor", "page"])]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // CLI args passed down to config
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, &config.log_base_dir());
    tracing::info!("listkit starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Some(Commands::List(list)) => run_list(&config, list).await,
        Some(Commands::Check) | None => check_config(&config),
    }
}

async fn run_list(config: &AppConfig, args: ListArgs) -> Result<ExitCode> {
    let schema = Arc::new(
        args.entity
            .schema()
            .with_context(|| format!("Failed to build {:?} schema", args.entity))?,
    );
    let rows = load_rows(&schema, &args.data)?;
    tracing::info!(entity = schema.entity(), rows = rows.len(), "dataset loaded");

    let store = InMemoryStore::new(rows);
    let paginator = Paginator::new(schema.clone(), &config.query);
    let scope = parse_scope(&schema, &args.scope)?;
    let request = build_request(&args)?;

    let output = if args.all {
        paginator
            .fetch_all(&store, &request, Some(&scope))
            .await
            .map(serde_json::to_value)
    } else {
        paginator
            .fetch_page(&store, &request, Some(&scope))
            .await
            .map(serde_json::to_value)
    };

    match output {
        Ok(json) => {
            println!("{}", serde_json::to_string_pretty(&json?)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(PageError::Query(err)) if err.is_client_error() => {
            eprintln!("error[{}]: {}", err.code(), err);
            Ok(ExitCode::from(EXIT_BAD_REQUEST))
        }
        Err(err) => Err(err.into()),
    }
}

fn check_config(config: &AppConfig) -> Result<ExitCode> {
    tracing::info!("Checking configuration...");
    for entity in Entity::ALL {
        entity
            .schema()
            .with_context(|| format!("Invalid {:?} schema", entity))?;
    }
    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(ExitCode::SUCCESS)
}

fn load_rows(schema: &FieldSchema, path: &Path) -> Result<Vec<DynRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
    let items = json
        .as_array()
        .ok_or_else(|| anyhow!("dataset {} must be a JSON array", path.display()))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("dataset row {} is not an object", i))?;
            DynRecord::from_json(schema, obj).with_context(|| format!("dataset row {}", i))
        })
        .collect()
}

/// `field=value`, typed by the schema.
fn parse_scope(schema: &FieldSchema, raw: &str) -> Result<Scope> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("scope must look like field=value (got: {})", raw))?;
    let field = schema
        .get(name.trim())
        .ok_or_else(|| anyhow!("unknown scope field: {}", name.trim()))?;
    let value = field
        .spec
        .parse_value(value.trim())
        .map_err(|e| anyhow!("invalid scope value: {}", e))?;
    Ok(Scope::equals(field.name, value))
}

/// `field=op:value[,op:value]`
fn parse_filter_arg(raw: &str) -> Result<FilterCondition> {
    let Some((field, values)) = raw.split_once('=') else {
        bail!("filter must look like field=op:value (got: {})", raw);
    };
    Ok(FilterCondition::new(
        field.trim(),
        values.split(',').map(str::trim).filter(|v| !v.is_empty()),
    ))
}

fn build_request(args: &ListArgs) -> Result<ListRequest> {
    let mut request = ListRequest::default();
    for raw in &args.filters {
        let mut condition = parse_filter_arg(raw)?;
        if args
            .any_fields
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&condition.field))
        {
            condition = condition.any();
        }
        request = request.filter(condition);
    }
    if let Some(search) = &args.search {
        request = request.search(search.clone());
    }
    for token in &args.sort {
        request = request.sort_by(token.clone());
    }
    request = match args.page {
        Some(page) => request.offset(page, args.size),
        None => request.keyset(args.size, args.cursor.clone()),
    };
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use criteria_core::{Combinator, Criteria, Value};
    use criteria_store::Pagination;

    fn list_args(argv: &[&str]) -> ListArgs {
        let mut full = vec!["listkit", "list"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Some(Commands::List(args)) => args,
            _ => panic!("expected list subcommand"),
        }
    }

    #[test]
    fn filter_arg_splits_operator_values() {
        let cond = parse_filter_arg("createdAt=gte:2024-01-01, lt:2024-02-01").unwrap();
        assert_eq!(cond.field, "createdAt");
        assert_eq!(cond.operator_values, ["gte:2024-01-01", "lt:2024-02-01"]);
        assert!(parse_filter_arg("status").is_err());
    }

    #[test]
    fn any_flag_switches_combinator() {
        let args = list_args(&[
            "--entity",
            "subscriber",
            "--data",
            "rows.json",
            "--scope",
            "workspaceId=W1",
            "--filter",
            "status=eq:ENABLED,eq:DISABLED",
            "--any",
            "status",
            "--sort",
            "desc:createdAt",
            "--size",
            "5",
        ]);
        let request = build_request(&args).unwrap();
        assert_eq!(request.filters[0].combinator, Combinator::Or);
        assert_eq!(request.sort, ["desc:createdAt"]);
        assert_eq!(
            request.pagination,
            Pagination::Keyset {
                size: Some(5),
                cursor: None
            }
        );
    }

    #[test]
    fn page_selects_offset_mode() {
        let args = list_args(&[
            "--entity", "tag", "--data", "rows.json", "--scope", "workspaceId=W1", "--page", "2",
        ]);
        let request = build_request(&args).unwrap();
        assert_eq!(
            request.pagination,
            Pagination::Offset {
                page: 2,
                size: None
            }
        );
    }

    #[test]
    fn cursor_and_page_conflict() {
        let parsed = Cli::try_parse_from([
            "listkit", "list", "--entity", "tag", "--data", "x.json", "--scope", "workspaceId=W1",
            "--cursor", "abc", "--page", "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn scope_is_typed_by_schema() {
        let schema = Entity::Subscriber.schema().unwrap();
        let scope = parse_scope(&schema, "WORKSPACEID = W1").unwrap();
        assert_eq!(
            scope.criteria(),
            &Criteria::Equals("workspaceId".into(), Value::from("W1"))
        );
        assert!(parse_scope(&schema, "tenant=W1").is_err());
        assert!(parse_scope(&schema, "workspaceId").is_err());
    }
}
