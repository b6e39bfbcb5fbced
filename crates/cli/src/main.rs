//! Hostel Rent Predictor CLI
//!
//! A command-line form for rent predictions, either against a locally
//! loaded model artifact or a running rent-server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{predict, schema, status};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Hostel Rent Predictor CLI
#[derive(Parser)]
#[command(name = "rent")]
#[command(author, version, about = "CLI for the Hostel Rent Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via RENT_API_URL env var)
    #[arg(long, env = "RENT_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the annual rent for a hostel room
    Predict {
        /// Model artifact manifest; predicts locally instead of calling the server
        #[arg(long, env = "RENT_MODEL_PATH")]
        model: Option<PathBuf>,

        #[command(flatten)]
        form: predict::FormArgs,
    },

    /// List the features the model expects
    Schema,

    /// Show the sample input and its assembled feature record
    Sample,

    /// Show server health and readiness
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = config::Config::load()?;
    let api_url = config.api_url(cli.api_url.as_deref());

    match cli.command {
        Commands::Predict { model, form } => match config.model_path(model) {
            Some(path) => predict::predict_local(&path, &form, cli.format)?,
            None => {
                let client = client::ApiClient::new(&api_url)?;
                predict::predict_remote(&client, &form, cli.format).await?;
            }
        },
        Commands::Schema => schema::show_schema(cli.format)?,
        Commands::Sample => schema::show_sample(cli.format)?,
        Commands::Status => {
            let client = client::ApiClient::new(&api_url)?;
            status::show_status(&client, cli.format).await?;
        }
    }

    Ok(())
}
