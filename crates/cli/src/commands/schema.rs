//! Form schema and sample input commands

use anyhow::Result;
use colored::Colorize;
use rent_lib::predictor::{FeatureKind, FeatureValue, FEATURE_SCHEMA, SCHEMA_VERSION};
use rent_lib::{FeatureAssembler, RentInputs};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_json, print_table, OutputFormat};

/// Row for the schema table
#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Feature")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Domain")]
    domain: String,
}

/// Row for the sample record table
#[derive(Tabled, Serialize)]
struct FeatureRow {
    #[tabled(rename = "Feature")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Show every feature the model expects
pub fn show_schema(format: OutputFormat) -> Result<()> {
    let rows: Vec<FieldRow> = FEATURE_SCHEMA
        .iter()
        .map(|spec| {
            let (kind, domain) = match spec.kind {
                FeatureKind::Continuous => ("number", "≥ 0".to_string()),
                FeatureKind::Discrete { max } => ("integer", format!("0-{}", max)),
                FeatureKind::Derived { source } => ("derived", format!("ln(1 + {})", source)),
                FeatureKind::Categorical { labels } => ("category", labels.join(" | ")),
                FeatureKind::Binary => ("flag", "0 | 1".to_string()),
            };
            FieldRow {
                name: spec.name.to_string(),
                kind: kind.to_string(),
                domain,
            }
        })
        .collect();

    if let OutputFormat::Table = format {
        println!(
            "{} (schema v{}, {} features)",
            "Model Features".bold(),
            SCHEMA_VERSION,
            rows.len()
        );
    }
    print_table(&rows, format);
    Ok(())
}

#[derive(Serialize)]
struct SampleOutput<'a> {
    inputs: &'a RentInputs,
    features: &'a rent_lib::FeatureRecord,
}

/// Show the default form and the record it assembles to
pub fn show_sample(format: OutputFormat) -> Result<()> {
    let inputs = RentInputs::default();
    let record = FeatureAssembler::assemble(&inputs)?;

    match format {
        OutputFormat::Json => print_json(&SampleOutput {
            inputs: &inputs,
            features: &record,
        }),
        OutputFormat::Table => {
            println!("{}", "Sample Input".bold());
            let rows: Vec<FeatureRow> = record
                .iter()
                .map(|(name, value)| FeatureRow {
                    name: name.to_string(),
                    value: match value {
                        FeatureValue::Number(v) => format!("{:.4}", v),
                        FeatureValue::Category(label) => label.to_string(),
                        FeatureValue::Flag(v) => v.to_string(),
                    },
                })
                .collect();
            print_table(&rows, format);
        }
    }
    Ok(())
}
