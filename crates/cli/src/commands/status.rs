//! Server status command

use anyhow::Result;
use colored::Colorize;
use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::output::{color_status, print_info, print_json, OutputFormat};

/// Show server health and readiness
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (_, health) = client.get_with_status("healthz").await?;
    let (ready_status, readiness) = client.get_with_status("readyz").await?;

    match format {
        OutputFormat::Json => print_json(&json!({ "health": health, "readiness": readiness })),
        OutputFormat::Table => {
            println!("{}", "Server Status".bold());
            println!("{}", "=".repeat(40));

            let status = health["status"].as_str().unwrap_or("unknown");
            println!("Health:          {}", color_status(status));

            let ready = if ready_status.is_success() { "ready" } else { "not ready" };
            println!("Readiness:       {}", color_status(ready));

            if let Some(version) = readiness["model_version"].as_str() {
                println!("Model version:   {}", version.cyan());
            }
            if let Some(reason) = readiness["reason"].as_str() {
                print_info(reason);
            }

            if let Some(components) = health["components"].as_object() {
                println!();
                println!("{}", "Components".bold());
                println!("{}", "-".repeat(40));
                for (name, component) in components {
                    let status = component["status"].as_str().unwrap_or("unknown");
                    let message = component
                        .get("message")
                        .and_then(Value::as_str)
                        .map(|m| format!(" ({})", m))
                        .unwrap_or_default();
                    println!("{:<16} {}{}", name, color_status(status), message);
                }
            }
        }
    }

    Ok(())
}
