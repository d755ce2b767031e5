use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use schoolfinder_core::settings::{self, Backend, Settings};
use schoolfinder_core::{Criterion, CriterionField, RecordSource};
use schoolfinder_directory::DirectoryState;
use schoolfinder_places::{HttpSource, PlacesSource};
use schoolfinder_store::seed::generate_catalog;
use schoolfinder_store::{CatalogSource, Database, SchoolRepo};
use schoolfinder_telemetry::{init_telemetry, LogQuery, SqliteLogSink, TelemetryConfig};

#[derive(Parser)]
#[command(name = "schoolfinder", version, about = "Lagos school directory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the directory API.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// catalog | places
        #[arg(long)]
        backend: Option<Backend>,
        /// Artificial delay before each /api/places response.
        #[arg(long)]
        latency_ms: Option<u64>,
    },
    /// Replace the local catalog with generated listings.
    Seed {
        #[arg(long)]
        count: Option<usize>,
        /// Fixed seed for a reproducible catalog.
        #[arg(long)]
        rng_seed: Option<u64>,
    },
    /// Page through a running server and print the filtered listings.
    Browse {
        #[arg(long)]
        url: Option<String>,
        /// Number of pages to accumulate.
        #[arg(long, default_value_t = 1)]
        pages: usize,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        min_price: Option<u64>,
        #[arg(long)]
        max_price: Option<u64>,
        #[arg(long)]
        curriculum: Vec<String>,
        #[arg(long = "type")]
        school_type: Vec<String>,
        #[arg(long)]
        facility: Vec<String>,
        #[arg(long)]
        location: Vec<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show persisted warnings and errors, newest first.
    Logs {
        /// Only entries logged under this directory session id.
        #[arg(long)]
        session: Option<String>,
        /// Only entries about this record source (catalog, places, http).
        #[arg(long)]
        source: Option<String>,
        /// warn | error
        #[arg(long)]
        level: Option<String>,
        /// Only entries at or after this RFC 3339 timestamp.
        #[arg(long)]
        since: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = settings::load_settings().context("failed to load settings")?;

    // These commands print to stdout, so keep logs quiet there.
    let level = match cli.command {
        Command::Browse { .. } | Command::Logs { .. } => "warn",
        _ => settings.logging.level.as_str(),
    };
    let telemetry = init_telemetry(
        TelemetryConfig {
            log_to_sqlite: settings.logging.log_to_sqlite,
            log_db_path: settings.logging.log_db_path.clone(),
            ..Default::default()
        }
        .with_level_str(level),
    );

    match cli.command {
        Command::Serve {
            port,
            backend,
            latency_ms,
        } => serve(settings, port, backend, latency_ms).await,
        Command::Seed { count, rng_seed } => seed(&settings, count, rng_seed),
        Command::Browse {
            url,
            pages,
            query,
            min_price,
            max_price,
            curriculum,
            school_type,
            facility,
            location,
            json,
        } => {
            let url = url.unwrap_or_else(|| format!("http://127.0.0.1:{}", settings.server.port));
            let mut state = DirectoryState::new(Arc::new(HttpSource::new(url)));
            state.set_query(query);
            state.set_criterion(Criterion::MinPrice(min_price));
            state.set_criterion(Criterion::MaxPrice(max_price));
            for (field, values) in [
                (CriterionField::Curriculum, curriculum),
                (CriterionField::SchoolType, school_type),
                (CriterionField::Facilities, facility),
                (CriterionField::Locations, location),
            ] {
                if let Some(criterion) = Criterion::values(field, values) {
                    state.set_criterion(criterion);
                }
            }
            browse(&mut state, pages, json).await
        }
        Command::Logs {
            session,
            source,
            level,
            since,
            limit,
            json,
        } => {
            let query = LogQuery {
                level: level.map(|l| l.to_uppercase()),
                session_id: session,
                source,
                since,
                limit: Some(limit),
                ..Default::default()
            };
            match telemetry.logs() {
                Some(sink) => show_logs(sink, &query, json),
                None => {
                    let path = &settings.logging.log_db_path;
                    let sink = SqliteLogSink::new(path)
                        .with_context(|| format!("failed to open log database at {}", path.display()))?;
                    show_logs(&sink, &query, json)
                }
            }
        }
    }
}

fn open_catalog(settings: &Settings) -> anyhow::Result<SchoolRepo> {
    let path = &settings.catalog.db_path;
    let db = Database::open(path).with_context(|| format!("failed to open catalog at {}", path.display()))?;
    tracing::info!(path = %path.display(), "catalog opened");
    Ok(SchoolRepo::new(db))
}

fn seed(settings: &Settings, count: Option<usize>, rng_seed: Option<u64>) -> anyhow::Result<()> {
    let repo = open_catalog(settings)?;
    let count = count.unwrap_or(settings.catalog.seed_count);
    let mut rng = match rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let written = repo.replace_all(&generate_catalog(count, &mut rng))?;
    tracing::info!(written, "catalog seeded");
    println!("Seeded {written} schools into {}", settings.catalog.db_path.display());
    Ok(())
}

async fn serve(
    mut settings: Settings,
    port: Option<u16>,
    backend: Option<Backend>,
    latency_ms: Option<u64>,
) -> anyhow::Result<()> {
    if let Some(port) = port {
        settings.server.port = port;
    }
    if let Some(latency_ms) = latency_ms {
        settings.server.simulated_latency_ms = latency_ms;
    }
    let backend = backend.unwrap_or(settings.places.backend);

    let (source, catalog): (Arc<dyn RecordSource>, Option<SchoolRepo>) = match backend {
        Backend::Catalog => {
            let repo = open_catalog(&settings)?;
            if repo.count()? == 0 {
                let written = repo.replace_all(&generate_catalog(
                    settings.catalog.seed_count,
                    &mut StdRng::from_entropy(),
                ))?;
                tracing::info!(written, "empty catalog seeded");
            }
            let source = CatalogSource::with_page_size(repo.clone(), settings.catalog.page_size);
            (Arc::new(source), Some(repo))
        }
        Backend::Places => {
            if settings.places.api_key.is_none() {
                tracing::warn!(
                    env = settings::PLACES_KEY_ENV,
                    "places backend selected without an API key; requests will fail"
                );
            }
            (Arc::new(PlacesSource::new(&settings.places)), None)
        }
    };

    let config = schoolfinder_server::ServerConfig::from(&settings.server);
    let handle = schoolfinder_server::start(config, source, catalog)
        .await
        .context("failed to start server")?;
    tracing::info!(port = handle.port, "SchoolFinder ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;
    tracing::info!("Shutting down");
    handle.abort();
    Ok(())
}

async fn browse(state: &mut DirectoryState, pages: usize, json: bool) -> anyhow::Result<()> {
    state.fetch(false).await?;
    for _ in 1..pages {
        if !state.has_more() {
            break;
        }
        state.fetch(true).await?;
    }
    state.apply_filters();

    if json {
        let body = serde_json::json!({
            "total": state.records().len(),
            "has_more": state.has_more(),
            "results": state.filtered(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for school in state.filtered() {
        println!(
            "{:<12} {:<34} {:<16} {:<10} {:<28} {:.1}",
            school.id.as_str(),
            school.name,
            school.address.lga,
            school.school_type.as_deref().unwrap_or("-"),
            school.price_range.as_deref().unwrap_or("-"),
            school.rating,
        );
    }
    println!(
        "{} of {} loaded schools match ({} active filters){}",
        state.filtered().len(),
        state.records().len(),
        state.criteria().active_count(),
        if state.has_more() { "; more pages available" } else { "" },
    );
    Ok(())
}

fn show_logs(sink: &SqliteLogSink, query: &LogQuery, json: bool) -> anyhow::Result<()> {
    let records = sink.query(query).context("failed to query logs")?;
    let total = sink.count().context("failed to count logs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        println!(
            "{} {:<5} {:<10} {:<36} {}",
            record.timestamp,
            record.level,
            record.source.as_deref().unwrap_or("-"),
            record.session_id.as_deref().unwrap_or("-"),
            record.message,
        );
        if let Some(fields) = &record.fields {
            println!("    {fields}");
        }
    }
    println!("showing {} of {total} persisted entries", records.len());
    Ok(())
}
