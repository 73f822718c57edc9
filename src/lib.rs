pub mod analytics;
pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod geo;
pub mod history;
pub mod models;
pub mod ranking;
pub mod services;
pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use analytics::TracingSink;
use clients::{DisabledPlacesClient, HttpDirectoryClient, HttpPlacesClient, PlaceAutocomplete};
pub use config::Config;
use models::{Coordinates, FilterUpdate, SuggestionKind};
use services::Engine;
use storage::JsonFileStore;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "search" | "s" => {
            if args.len() < 3 {
                println!("Usage: kompass search <query> [--category <name>] [--near <lat,lon>]");
                return Ok(());
            }
            let (query, category, near) = parse_search_args(&args[2..])?;
            cmd_search(&config, &query, category, near).await
        }

        "suggest" => {
            if args.len() < 3 {
                println!("Usage: kompass suggest <partial input>");
                return Ok(());
            }
            let input = args[2..].join(" ");
            cmd_suggest(&config, &input).await
        }

        "history" | "h" => {
            let limit = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);
            cmd_history(&config, limit).await
        }

        "clear-history" => {
            let engine = build_engine(&config).await?;
            engine.clear_history().await;
            println!("Search history cleared");
            Ok(())
        }

        "clear-cache" => {
            let engine = build_engine(&config).await?;
            engine.clear_cache().await;
            println!("Result cache cleared");
            Ok(())
        }

        "init" => {
            if Config::create_default_if_missing()? {
                println!("Created default config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        unknown => {
            println!("Unknown command: {}", unknown);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn parse_search_args(args: &[String]) -> anyhow::Result<(String, Option<String>, Option<Coordinates>)> {
    let mut words = Vec::new();
    let mut category = None;
    let mut near = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--category" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--category requires a value"))?;
                category = Some(value.clone());
                i += 2;
            }
            "--near" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--near requires <lat,lon>"))?;
                near = Some(parse_coordinates(value)?);
                i += 2;
            }
            word => {
                words.push(word.to_string());
                i += 1;
            }
        }
    }

    if words.is_empty() {
        anyhow::bail!("Search query cannot be empty");
    }

    Ok((words.join(" "), category, near))
}

fn parse_coordinates(value: &str) -> anyhow::Result<Coordinates> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Expected <lat,lon>, got '{value}'"))?;

    let coordinates = Coordinates::new(lat.trim().parse()?, lon.trim().parse()?);
    if !coordinates.is_valid() {
        anyhow::bail!("Coordinates out of range: '{value}'");
    }
    Ok(coordinates)
}

async fn build_engine(config: &Config) -> anyhow::Result<Arc<Engine>> {
    let http = clients::build_shared_http_client(config.directory.timeout_seconds)?;

    let store = Arc::new(
        JsonFileStore::open(PathBuf::from(&config.general.data_dir).join("kompass.json")).await?,
    );
    let directory = Arc::new(HttpDirectoryClient::new(
        http.clone(),
        config.directory.base_url.clone(),
    ));
    let places: Arc<dyn PlaceAutocomplete> = if config.places.enabled {
        Arc::new(HttpPlacesClient::new(http, config.places.base_url.clone()))
    } else {
        Arc::new(DisabledPlacesClient)
    };
    let analytics = Arc::new(TracingSink);

    Ok(Arc::new(Engine::new(
        config, store, directory, places, analytics,
    )))
}

async fn cmd_search(
    config: &Config,
    query: &str,
    category: Option<String>,
    near: Option<Coordinates>,
) -> anyhow::Result<()> {
    let engine = build_engine(config).await?;

    if let Some(coordinates) = near {
        engine.set_location(Some(coordinates)).await;
    }
    if let Some(category) = category {
        engine
            .update_filters(FilterUpdate {
                category: Some(Some(category)),
                ..FilterUpdate::default()
            })
            .await;
    }

    println!("Searching for: {}", query);
    let results = match engine.search(query).await {
        Ok(results) => results,
        Err(e) => {
            let message = engine
                .error_message()
                .await
                .unwrap_or_else(|| e.to_string());
            println!("{}", message);
            return Ok(());
        }
    };

    if results.is_empty() {
        println!("No businesses found matching '{}'", query);
        return Ok(());
    }

    println!();
    println!("Results:");
    println!("{:-<60}", "");

    for result in results.iter().take(10) {
        let business = &result.business;
        let distance = result
            .distance_m
            .map(geo::format_distance)
            .unwrap_or_else(|| "distance unknown".to_string());

        println!("• {} ({})", business.name, business.category);
        println!("  {}", business.address);
        println!(
            "  Rating: {:.1} ({} reviews) | Score: {:.0} | {}",
            business.average_rating,
            business.review_count,
            result.relevance_score,
            distance
        );
        println!();
    }

    Ok(())
}

async fn cmd_suggest(config: &Config, input: &str) -> anyhow::Result<()> {
    let engine = build_engine(config).await?;
    let suggestions = engine.suggestions(input).await?;

    if suggestions.is_empty() {
        println!("No suggestions for '{}'", input);
        return Ok(());
    }

    for suggestion in &suggestions {
        let kind = match suggestion.kind {
            SuggestionKind::Business => "business",
            SuggestionKind::Category => "category",
            SuggestionKind::Location => "location",
            SuggestionKind::Recent => "recent",
        };
        println!("{:>9}  {}", kind, suggestion.text);
    }

    Ok(())
}

async fn cmd_history(config: &Config, limit: usize) -> anyhow::Result<()> {
    let engine = build_engine(config).await?;
    let items = engine.history(limit).await;

    if items.is_empty() {
        println!("No search history yet");
        return Ok(());
    }

    println!("Recent searches:");
    println!("{:-<60}", "");

    for item in &items {
        println!(
            "• {} ({} results, {})",
            item.query,
            item.result_count,
            item.timestamp.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn print_help() {
    println!("Kompass - Location-Aware Business Search");
    println!();
    println!("USAGE:");
    println!("  kompass <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  search <query>    Search businesses (ranked by relevance)");
    println!("    --category <name>   Restrict to one category");
    println!("    --near <lat,lon>    Rank by distance from this point");
    println!("  suggest <input>   Show suggestions for partial input");
    println!("  history [n]       Show recent searches (default: 10)");
    println!("  clear-history     Delete the search history");
    println!("  clear-cache       Drop all cached search results");
    println!("  init              Create default config file");
    println!("  help              Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  kompass search \"coffee\" --near 52.52,13.40");
    println!("  kompass search plumber --category Plumbing");
    println!("  kompass suggest \"pizz\"");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_with_flags() {
        let args: Vec<String> = ["best", "coffee", "--category", "Cafe", "--near", "52.5,13.4"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let (query, category, near) = parse_search_args(&args).unwrap();
        assert_eq!(query, "best coffee");
        assert_eq!(category.as_deref(), Some("Cafe"));
        let near = near.unwrap();
        assert!((near.latitude - 52.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_empty_query_and_bad_coordinates() {
        let args: Vec<String> = ["--category", "Cafe"].iter().map(ToString::to_string).collect();
        assert!(parse_search_args(&args).is_err());

        assert!(parse_coordinates("91.0,0.0").is_err());
        assert!(parse_coordinates("not-a-pair").is_err());
    }
}
