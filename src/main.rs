use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use search_proxy::config::{Config, ObservabilityConfig};
use search_proxy::engine::TantivyEngine;
use search_proxy::models::{AttrValue, IndexEntry, SearchAttribute, SearchQuery, Sort, SortDirection};
use search_proxy::search::{EngineIndex, Index};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "search-proxy", version)]
#[command(about = "Index and query entries in a local full-text index", long_about = None)]
struct Cli {
    /// Configuration file overriding the built-in defaults
    #[arg(short, long, env = "SEARCH_PROXY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index JSON-lines entries through a batch
    Ingest {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Free-text search across all fields
    Search {
        #[arg(value_name = "TEXT")]
        text: String,

        #[arg(short, long, default_value = "10")]
        max: usize,
    },

    /// Attribute search
    Query {
        /// name=value; integers match exactly, text matches fuzzily
        #[arg(short, long, value_parser = parse_pair)]
        attr: Vec<(String, String)>,

        /// name=value matched as an exact term
        #[arg(short, long, value_parser = parse_pair)]
        exact: Vec<(String, String)>,

        /// name=value inclusive lower bound
        #[arg(long, value_parser = parse_pair)]
        gte: Vec<(String, String)>,

        /// name=value inclusive upper bound
        #[arg(long, value_parser = parse_pair)]
        lte: Vec<(String, String)>,

        /// name=low..high inclusive range
        #[arg(short, long, value_parser = parse_between)]
        between: Vec<(String, i64, i64)>,

        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(short, long, default_value = "0")]
        from: usize,

        /// field or field:asc|desc
        #[arg(short, long, value_parser = parse_sort)]
        sort: Option<Sort>,
    },

    /// Show index statistics
    Metrics,

    /// Remove every entry from the index
    Clear,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got {}", raw))
}

fn parse_between(raw: &str) -> Result<(String, i64, i64), String> {
    let (name, bounds) = parse_pair(raw)?;
    let (low, high) = bounds
        .split_once("..")
        .ok_or_else(|| format!("expected name=low..high, got {}", raw))?;
    let bound = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid bound {}: {}", s, e))
    };
    Ok((name, bound(low)?, bound(high)?))
}

fn parse_sort(raw: &str) -> Result<Sort, String> {
    match raw.split_once(':') {
        Some((field, direction)) => {
            let direction: SortDirection = direction
                .parse()
                .map_err(|_| format!("invalid sort direction {}", direction))?;
            Ok(Sort::new(field, direction))
        }
        None => Ok(Sort::asc(raw)),
    }
}

fn attr_value(raw: &str) -> AttrValue {
    match raw.trim().parse::<i64>() {
        Ok(n) => AttrValue::Integer(n),
        Err(_) => AttrValue::Text(raw.to_string()),
    }
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    // Logs go to stderr so command output stays parseable
    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn ingest(index: &impl Index, file: &Path) -> anyhow::Result<usize> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    index.begin_batch().await?;
    let mut count = 0;
    for (line_number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: IndexEntry = serde_json::from_str(line)
            .with_context(|| format!("Invalid entry on line {}", line_number + 1))?;
        index.submit_batch_entry(&entry).await?;
        count += 1;
    }
    index.end_batch().await?;

    Ok(count)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load_from(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.observability);

    tracing::debug!("Starting search-proxy v{}", env!("CARGO_PKG_VERSION"));

    let engine = Arc::new(TantivyEngine::new(config.engine.clone()));
    let index = EngineIndex::new(engine, config.index.clone())?;

    let output = match cli.command {
        Commands::Ingest { file } => {
            let count = ingest(&index, &file).await?;
            serde_json::json!({ "ingested": count })
        }

        Commands::Search { text, max } => serde_json::to_value(index.search_text(&text, max).await?)?,

        Commands::Query {
            attr,
            exact,
            gte,
            lte,
            between,
            limit,
            from,
            sort,
        } => {
            let mut query = SearchQuery::new().limit(limit).from(from);
            for (name, value) in attr {
                query = query.and(name, attr_value(&value));
            }
            for (name, value) in exact {
                query = query.with_attribute(SearchAttribute::exact(name, attr_value(&value)));
            }
            for (name, value) in gte {
                query = query.with_attribute(SearchAttribute::gte(name, attr_value(&value)));
            }
            for (name, value) in lte {
                query = query.with_attribute(SearchAttribute::lte(name, attr_value(&value)));
            }
            for (name, low, high) in between {
                query = query.with_attribute(SearchAttribute::between(name, low, high));
            }
            if let Some(sort) = sort {
                query = query.sort(sort);
            }
            if query.attributes.is_empty() {
                return Err(anyhow!("at least one attribute is required"));
            }

            serde_json::to_value(index.search(&query).await?)?
        }

        Commands::Metrics => serde_json::to_value(index.fetch_metrics().await?)?,

        Commands::Clear => {
            index.clear_index().await?;
            serde_json::json!({ "cleared": config.index.name })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
