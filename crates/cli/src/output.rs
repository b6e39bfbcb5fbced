//! Terminal rendering for predictions, schema rows and status

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::PredictResponse;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines and tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Print rows as a rounded table, or as a JSON array
pub fn print_table<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows).with(Style::rounded())),
        OutputFormat::Json => print_json(rows),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Cannot render JSON: {}", e)),
    }
}

/// Print the prediction line, then the model that produced it
pub fn print_estimate(estimate: &PredictResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(estimate),
        OutputFormat::Table => {
            println!("{} {}", "✓".green().bold(), estimate.display.bold());
            println!("  {}", format!("model {}", estimate.model_version).dimmed());
        }
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Colour a health or readiness word
pub fn color_status(status: &str) -> String {
    match status {
        "healthy" | "ready" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" | "not ready" => status.red().to_string(),
        _ => status.to_string(),
    }
}
