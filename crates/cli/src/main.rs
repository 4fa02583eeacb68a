//! Employee Attrition Predictor CLI
//!
//! A command-line client for submitting employee records to the prediction
//! server and inspecting the schema, loaded model and server health.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{configure, inspect, predict};
use std::path::PathBuf;

/// Employee Attrition Predictor CLI
#[derive(Parser)]
#[command(name = "attrition")]
#[command(author, version, about = "CLI for the Employee Attrition Predictor", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via ATTRITION_API_URL env var)
    #[arg(long, env = "ATTRITION_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict whether an employee is likely to leave
    Predict {
        /// Field value, e.g. --set Age=45 (repeatable)
        #[arg(long = "set", short = 's', value_name = "FIELD=VALUE", value_parser = predict::parse_assignment)]
        assignments: Vec<(String, String)>,

        /// JSON file holding an object of field values
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List the employee record fields
    Fields,

    /// Show the loaded model
    Model,

    /// Show server health
    Status,

    /// Show or update saved CLI defaults
    Configure {
        /// Server URL to save
        #[arg(long = "set-api-url", value_name = "URL")]
        api_url: Option<String>,

        /// Output format to save
        #[arg(long = "set-format", value_name = "FORMAT")]
        format: Option<output::OutputFormat>,
    },
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = config::Config::path()?;

    if let Commands::Configure { api_url, format } = cli.command {
        return configure::configure(&config_path, api_url, format);
    }

    let config = config::Config::load_from(&config_path)?;
    let format = cli
        .format
        .or_else(|| {
            config
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_config)
        })
        .unwrap_or_default();

    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url.as_deref()))?;

    match cli.command {
        Commands::Predict { assignments, file } => {
            predict::predict(&client, file.as_deref(), &assignments, format).await?;
        }
        Commands::Fields => inspect::show_fields(&client, format).await?,
        Commands::Model => inspect::show_model(&client, format).await?,
        Commands::Status => inspect::show_status(&client, format).await?,
        Commands::Configure { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
