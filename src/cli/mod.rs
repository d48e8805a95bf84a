//! CLI module for ipscope-rs
//!
//! This module handles command line argument parsing and dispatches each
//! subcommand to its entry point.

use crate::config::AppConfig;
use crate::entry;
use crate::error::{GeoError, Result};
use crate::geo::GeoClient;
use crate::history::SearchHistoryStore;
use crate::lookup::{GeolocationErrorCode, LookupOrchestrator, LookupOutcome, PositionFix, SessionToken};
use crate::render::{self, MapPin, OutputFormat};
use crate::storage::{FileStore, MemoryStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "ipscope-rs")]
#[command(version, about = "Look up the geolocation of an IP address")]
#[command(long_about = "ipscope-rs looks up country, city, ISP, timezone and coordinates \
    of an IP address through online providers.\n\n\
    Private and reserved addresses are recognized locally and never sent out.\n\n\
    Examples:\n  \
    $ ipscope-rs lookup 8.8.8.8\n  \
    $ ipscope-rs lookup --save 1.1.1.1\n  \
    $ ipscope-rs lookup            (your own address)\n  \
    $ ipscope-rs detect --lookup\n  \
    $ ipscope-rs locate --lat 48.8584 --lon 2.2945\n  \
    $ ipscope-rs history list")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use a specific config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up an address (your own address when omitted)
    Lookup {
        /// IPv4 or IPv6 address
        #[arg(value_name = "ADDRESS")]
        address: Option<String>,

        /// Save the result to the search history
        #[arg(long)]
        save: bool,
    },

    /// Detect your own public address
    Detect {
        /// Look up the detected address right away
        #[arg(long)]
        lookup: bool,
    },

    /// Describe a device position
    Locate {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Accuracy radius in meters
        #[arg(long)]
        accuracy: Option<f64>,
    },

    /// Manage the search history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum HistoryAction {
    /// List saved lookups, most recent first
    List,
    /// Show the map link of a saved lookup
    Show { id: i64 },
    /// Remove one saved lookup
    Remove { id: i64 },
    /// Remove all saved lookups
    Clear,
    /// Show totals
    Stats,
}

impl Cli {
    pub async fn run(&self, mut config: AppConfig) -> Result<()> {
        // Apply CLI options to config
        if self.json {
            config.output.json = true;
        }
        if self.no_color || !atty::is(atty::Stream::Stdout) {
            config.output.enable_colors = false;
        }

        match &self.command {
            Command::Lookup { address, save } => {
                self.handle_lookup(&config, address.as_deref(), *save).await
            }
            Command::Detect { lookup } => self.handle_detect(&config, *lookup).await,
            Command::Locate { lat, lon, accuracy } => {
                let position = match (lat, lon) {
                    (Some(latitude), Some(longitude)) => Ok(PositionFix {
                        latitude: *latitude,
                        longitude: *longitude,
                        accuracy_m: *accuracy,
                    }),
                    _ => Err(GeolocationErrorCode::PositionUnavailable),
                };
                self.handle_locate(&config, position).await
            }
            Command::History { action } => self.handle_history(&config, action),
        }
    }

    fn output_format(&self, config: &AppConfig) -> OutputFormat {
        if config.output.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// Orchestrator whose display sink prints every delivered outcome
    fn orchestrator(&self, config: &AppConfig) -> Result<LookupOrchestrator<GeoClient>> {
        let client = GeoClient::new(config.providers.clone())?;
        let format = self.output_format(config);
        let use_color = config.output.enable_colors;

        let sink = move |token: SessionToken, outcome: LookupOutcome| {
            log::debug!("Displaying outcome of session {}", token);
            print_outcome(&outcome, format, use_color);
        };
        Ok(LookupOrchestrator::new(Arc::new(client), Arc::new(sink)))
    }

    fn history(&self, config: &AppConfig) -> Result<SearchHistoryStore<FileStore>> {
        let store = FileStore::new(config.storage_path()?);
        Ok(SearchHistoryStore::with_capacity(store, config.history.capacity))
    }

    async fn handle_lookup(&self, config: &AppConfig, address: Option<&str>, save: bool) -> Result<()> {
        let session = MemoryStore::new();
        if let Some(address) = address {
            entry::home_submit(address, &session)?;
        }

        let orchestrator = self.orchestrator(config)?;
        let outcome = entry::location_page(&orchestrator, &session).await?;

        if save && let Some(ref outcome) = outcome {
            self.save_outcome(config, outcome)?;
        }
        outcome_status(outcome.as_ref())
    }

    async fn handle_detect(&self, config: &AppConfig, lookup: bool) -> Result<()> {
        let orchestrator = self.orchestrator(config)?;
        let address = match entry::detect_own_address(orchestrator.backend().as_ref()).await {
            Ok(address) => address,
            Err(e) => {
                eprintln!(
                    "Could not detect your public IP automatically. Please check your internet \
                     connection and try again, or enter your IP manually."
                );
                return Err(e);
            }
        };

        if !lookup {
            if config.output.json {
                println!("{}", serde_json::json!({ "ip": address }));
            } else {
                println!("{}", address);
            }
            return Ok(());
        }

        let session = MemoryStore::new();
        entry::home_submit(&address, &session)?;
        let outcome = entry::location_page(&orchestrator, &session).await?;
        outcome_status(outcome.as_ref())
    }

    async fn handle_locate(
        &self,
        config: &AppConfig,
        position: std::result::Result<PositionFix, GeolocationErrorCode>,
    ) -> Result<()> {
        let orchestrator = self.orchestrator(config)?;
        let outcome = entry::current_position(&orchestrator, position).await;
        outcome_status(outcome.as_ref())
    }

    fn handle_history(&self, config: &AppConfig, action: &HistoryAction) -> Result<()> {
        let history = self.history(config)?;
        let use_color = config.output.enable_colors;

        match action {
            HistoryAction::List => {
                let entries = history.list()?;
                if config.output.json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else {
                    println!("{}", render::format_history_text(&entries, use_color));
                }
            }
            HistoryAction::Show { id } => {
                let entry = history
                    .find(*id)?
                    .ok_or_else(|| GeoError::invalid_entry(format!("no history entry with id {}", id)))?;
                let pin = match geo_from_text(&entry.coordinates_text) {
                    Some((lat, lon)) => MapPin::new(lat, lon, format!("IP: {}", entry.address)),
                    None => MapPin::world(),
                };
                if config.output.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({ "entry": entry, "map": pin }))?
                    );
                } else {
                    println!("{}", render::format_history_text(std::slice::from_ref(&entry), use_color));
                    println!("Map: {}", pin.url());
                }
            }
            HistoryAction::Remove { id } => {
                history.remove(*id)?;
                println!("Removed {} from history", id);
            }
            HistoryAction::Clear => {
                history.clear()?;
                println!("Search history cleared");
            }
            HistoryAction::Stats => {
                let stats = history.stats()?;
                if config.output.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    println!("{}", render::format_stats_text(&stats));
                }
            }
        }
        Ok(())
    }

    fn save_outcome(&self, config: &AppConfig, outcome: &LookupOutcome) -> Result<()> {
        let history = self.history(config)?;
        match entry::save_displayed(&history, outcome) {
            Ok(saved) => {
                eprintln!("Saved {} to history (id {})", saved.address, saved.id);
                Ok(())
            }
            Err(GeoError::InvalidEntry(reason)) => {
                eprintln!("Not saved: {}", reason);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn print_outcome(outcome: &LookupOutcome, format: OutputFormat, use_color: bool) {
    match format {
        OutputFormat::Json => match render::format_outcome_json(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to serialize outcome: {}", e),
        },
        OutputFormat::Text => println!("{}", render::format_outcome_text(outcome, use_color)),
    }
}

/// Exit status of a lookup command: failed outcomes become errors
fn outcome_status(outcome: Option<&LookupOutcome>) -> Result<()> {
    match outcome {
        Some(LookupOutcome::Failed(failure)) => Err(failure.to_error()),
        _ => Ok(()),
    }
}

/// Parse the `"lat,lon"` text kept in history entries
fn geo_from_text(text: &str) -> Option<(f64, f64)> {
    crate::geo::Coordinates::parse(text).map(|c| (c.latitude, c.longitude))
}
