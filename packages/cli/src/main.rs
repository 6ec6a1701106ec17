#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the wildlife sighting map.
//!
//! Talks to the sighting provider's REST API, normalizes filters into
//! query parameters, and renders the species density map as a `GeoJSON`
//! heat layer.

mod config;
mod filters;
mod source;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use wildlife_map_client::{ApiClient, RefreshOutcome, refresh_heatmap};
use wildlife_map_heatmap::models::VisibilityMask;
use wildlife_map_heatmap::render::{GeoJsonHeatLayer, HeatLayerRenderer};
use wildlife_map_sighting_models::{ObservationRecord, YearLabel};

use crate::config::Config;
use crate::filters::FilterArgs;
use crate::source::FileSource;

/// Number of sightings the table view shows by default.
const DEFAULT_SIGHTING_LIMIT: usize = 1000;

#[derive(Parser)]
#[command(name = "wildlife_map", about = "Wildlife sighting map toolkit")]
struct Cli {
    /// Base URL of the sighting API (overrides `WILDLIFE_MAP_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Path to a TOML config file (overrides `WILDLIFE_MAP_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized query string for a set of filters
    Query {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List sightings matching a set of filters
    Sightings {
        #[command(flatten)]
        filters: FilterArgs,
        /// Maximum number of rows to print
        #[arg(long, default_value_t = DEFAULT_SIGHTING_LIMIT)]
        limit: usize,
    },
    /// Aggregate all sightings into a `GeoJSON` heat layer
    Heatmap {
        /// Read observations from a JSON file instead of the API
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write the layer here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Species to leave off the map (repeatable)
        #[arg(long)]
        hide: Vec<String>,
    },
    /// List registered cameras
    Cameras,
    /// List known species
    Species,
    /// List years with sightings
    Years,
    /// Print the yearly population summary for a species
    Summary {
        /// Year to summarize
        #[arg(long)]
        year: String,
        /// Species to summarize
        #[arg(long)]
        species: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = Config::resolve(cli.api_url.as_deref(), cli.config.as_deref())?;

    match cli.command {
        Commands::Query { filters } => {
            let query = filters.to_query()?;
            println!("{}", query.to_query_string());
        }
        Commands::Sightings { filters, limit } => {
            let query = filters.to_query()?;
            let client = api_client(&config)?;
            let raw = client.fetch_observations(&query).await?;

            let records: Vec<ObservationRecord> = raw
                .iter()
                .filter_map(|r| r.coerce().map_err(|e| log::warn!("Skipping {e}")).ok())
                .collect();
            print_sightings(&records, limit);
        }
        Commands::Heatmap {
            input,
            output,
            hide,
        } => {
            let mut mask = VisibilityMask::new();
            for species in hide {
                mask.hide(species);
            }

            let outcome = match input {
                Some(path) => refresh_heatmap(&FileSource::new(path), &mask).await,
                None => refresh_heatmap(&api_client(&config)?, &mask).await,
            };

            let mut layer = GeoJsonHeatLayer::new();
            match outcome {
                RefreshOutcome::Loaded(aggregation) => {
                    if aggregation.skipped > 0 {
                        log::warn!("Skipped {} malformed records", aggregation.skipped);
                    }
                    layer.render(&aggregation.heat_points(), &config.heat_layer)?;
                }
                RefreshOutcome::NoData => {
                    eprintln!("No sightings available.");
                }
                RefreshOutcome::Failed(e) => return Err(e.into()),
            }

            if let Some(path) = output {
                layer.write_to(BufWriter::new(File::create(&path)?))?;
                log::info!("Wrote heat layer to {}", path.display());
            } else {
                layer.write_to(std::io::stdout().lock())?;
            }
        }
        Commands::Cameras => {
            let cameras = api_client(&config)?.fetch_cameras().await?;
            println!("{:<12} {:>10} {:>11}  REGISTERED", "CAMERA", "LAT", "LON");
            println!("{}", "-".repeat(60));
            for camera in &cameras {
                println!(
                    "{:<12} {:>10.4} {:>11.4}  {}",
                    camera.camera_id,
                    camera.latitude,
                    camera.longitude,
                    camera
                        .addtime
                        .map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
                );
            }
        }
        Commands::Species => {
            for species in api_client(&config)?.fetch_species().await? {
                println!("{species}");
            }
        }
        Commands::Years => {
            for year in api_client(&config)?.fetch_years().await? {
                println!("{year}");
            }
        }
        Commands::Summary { year, species } => {
            let year = year
                .parse::<i32>()
                .map_or_else(|_| YearLabel::Text(year.clone()), YearLabel::Number);
            let summary = api_client(&config)?
                .fetch_yearly_summary(&year, &species)
                .await?;

            println!("{:<8} COUNT", "YEAR");
            for point in &summary {
                println!("{:<8} {}", point.year.to_string(), point.count);
            }
        }
    }

    Ok(())
}

fn api_client(config: &Config) -> Result<ApiClient, Box<dyn std::error::Error>> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(ApiClient::with_client(http, &config.api_url)?)
}

fn print_sightings(records: &[ObservationRecord], limit: usize) {
    println!(
        "{:<8} {:<20} {:>5} {:>10} {:>11} {:<25} {:<10} BEHAVIOUR",
        "ID", "SPECIES", "COUNT", "LAT", "LON", "TIMESTAMP", "CAMERA"
    );
    println!("{}", "-".repeat(110));

    for record in records.iter().take(limit) {
        println!(
            "{:<8} {:<20} {:>5} {:>10.4} {:>11.4} {:<25} {:<10} {}",
            record
                .id
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string),
            record.species,
            record.count,
            record.latitude,
            record.longitude,
            record
                .timestamp
                .map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
            record.camera_id.as_deref().unwrap_or("-"),
            record.behaviour.as_deref().unwrap_or(""),
        );
    }

    if records.len() > limit {
        println!("Showing {limit} of {} sightings", records.len());
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn heatmap_accepts_repeated_hide() {
        let cli = Cli::parse_from([
            "wildlife_map",
            "heatmap",
            "--hide",
            "Lion",
            "--hide",
            "Elephant",
        ]);
        let Commands::Heatmap { hide, .. } = cli.command else {
            panic!("expected heatmap");
        };
        assert_eq!(hide, vec!["Lion", "Elephant"]);
    }

    #[test]
    fn sightings_limit_defaults_to_table_cap() {
        let cli = Cli::parse_from(["wildlife_map", "sightings", "--species", "Lion"]);
        let Commands::Sightings { filters, limit } = cli.command else {
            panic!("expected sightings");
        };
        assert_eq!(limit, DEFAULT_SIGHTING_LIMIT);
        assert_eq!(filters.species.as_deref(), Some("Lion"));
    }

    #[test]
    fn negative_bounds_parse() {
        let cli = Cli::parse_from([
            "wildlife_map",
            "query",
            "--lat-min",
            "-1.5",
            "--api-url",
            "http://example.org/",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://example.org/"));
        let Commands::Query { filters } = cli.command else {
            panic!("expected query");
        };
        assert_eq!(filters.lat_min, Some(-1.5));
    }
}
