use pump_select::config::{LoggingSettings, Settings};
use pump_select::core::Selector;
use pump_select::models::SelectionRequest;
use pump_select::services::{CacheManager, PostgresClient, SelectionService};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  pump-select select <flow> <head>      rank catalog pumps for a duty point
  pump-select regenerate [item-id...]   rebuild stored curves (all items if none given)";

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn parse_number(arg: Option<&String>, name: &str) -> Result<f64, String> {
    let raw = arg.ok_or_else(|| format!("missing <{}>", name))?;
    raw.parse::<f64>()
        .map_err(|e| format!("invalid <{}> {:?}: {}", name, raw, e))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings.logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    let postgres = match PostgresClient::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to connect to PostgreSQL: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("PostgreSQL client initialized");

    let selector = Selector::new(settings.scoring_weights(), settings.scoring.cost_assumptions());
    info!("Selector initialized with weights: {:?}", selector.weights());

    let mut service = SelectionService::new(Arc::clone(&postgres), selector)
        .with_candidate_limit(settings.selection.candidate_limit)
        .with_store_timeout(Duration::from_secs(settings.selection.store_timeout_secs));

    // The cache is optional; selections still work straight from PostgreSQL
    if settings.cache.enabled {
        let ttl = settings.cache.ttl_secs.unwrap_or(300);
        let l1_size = settings.cache.l1_cache_size.unwrap_or(1000);
        match CacheManager::new(&settings.cache.redis_url, l1_size, ttl).await {
            Ok(cache) => {
                info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
                tracing::debug!("Cache stats: {:?}", cache.stats());
                service = service.with_cache(Arc::new(cache));
            }
            Err(e) => warn!("Failed to connect to Redis ({}), running without cache", e),
        }
    }

    match command {
        "select" => {
            let duty = parse_number(args.get(1), "flow")
                .and_then(|flow| Ok((flow, parse_number(args.get(2), "head")?)));
            let (flow, head) = match duty {
                Ok(duty) => duty,
                Err(e) => {
                    eprintln!("{}\n{}", e, USAGE);
                    return ExitCode::FAILURE;
                }
            };

            match service.select_items(&SelectionRequest::new(flow, head)).await {
                Ok(ranked) => match serde_json::to_string_pretty(&ranked) {
                    Ok(json) => {
                        println!("{}", json);
                        ExitCode::SUCCESS
                    }
                    Err(e) => {
                        error!("Failed to serialize selection: {}", e);
                        ExitCode::FAILURE
                    }
                },
                Err(e) => {
                    error!("Selection failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        "regenerate" => {
            let item_ids = if args.len() > 1 {
                args[1..].to_vec()
            } else {
                match postgres.list_item_ids().await {
                    Ok(ids) => ids,
                    Err(e) => {
                        error!("Failed to list catalog items: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            };

            let mut failures = 0;
            for item_id in &item_ids {
                match service.regenerate_curve(item_id).await {
                    Ok(count) => {
                        let generated_at = postgres.curve_generated_at(item_id).await.ok().flatten();
                        info!("Regenerated {} ({} samples, at {:?})", item_id, count, generated_at);
                    }
                    Err(e) => {
                        failures += 1;
                        error!("Failed to regenerate curve for {}: {}", item_id, e);
                    }
                }
            }

            info!("Regenerated {} of {} curves", item_ids.len() - failures, item_ids.len());
            if failures == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        other => {
            eprintln!("unknown command {:?}\n{}", other, USAGE);
            ExitCode::FAILURE
        }
    }
}
