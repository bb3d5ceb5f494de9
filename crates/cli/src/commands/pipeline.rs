//! `tracerail pipeline show|set`.

use std::io::Write;

use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use tr_core::config::loader::load_services_file;
use tr_core::config::models::AppConfig;
use tr_core::gateway::{save_message, Gateway, HttpGateway};
use tr_protocol::{PipelineService, Stage};

use crate::cli::PipelineCommand;

pub async fn execute(config: &AppConfig, command: PipelineCommand) -> Result<()> {
    let gateway = HttpGateway::from_config(&config.client)?;
    let mut out = std::io::stdout().lock();

    match command {
        PipelineCommand::Show { json } => {
            let services = gateway
                .fetch_pipeline()
                .await
                .wrap_err_with(|| format!("Failed to load pipeline from {}", gateway.base_url()))?;
            if json {
                serde_json::to_writer_pretty(&mut out, &services)?;
                writeln!(out)?;
            } else {
                write_services(&mut out, &services)?;
            }
        }
        PipelineCommand::Set { file } => {
            let services = load_services_file(&file)?;
            let response = gateway.save_pipeline(&services).await?;
            writeln!(out, "{}", save_message(&response).green())?;
        }
    }
    Ok(())
}

/// One line per stage, gateway first, in track order.
pub fn write_services(out: &mut impl Write, services: &[PipelineService]) -> std::io::Result<()> {
    if services.is_empty() {
        writeln!(out, "{}", "No services configured.".dimmed())?;
    }
    for (index, stage) in Stage::sequence_for(services).iter().enumerate() {
        let detail = index
            .checked_sub(1)
            .and_then(|i| services.get(i))
            .map(describe_service)
            .unwrap_or_else(|| "(local submission)".to_string());
        writeln!(
            out,
            "{index:>2}. {} {:<14} {}",
            stage.display_icon,
            stage.display_label.bold(),
            detail.dimmed()
        )?;
    }
    Ok(())
}

fn describe_service(service: &PipelineService) -> String {
    let types = match (service.input_type.trim(), service.output_type.trim()) {
        ("", "") => String::new(),
        (input, output) => format!("  [{} → {}]", or_any(input), or_any(output)),
    };
    format!("{}{types}", service.url)
}

fn or_any(value: &str) -> &str {
    if value.is_empty() {
        "any"
    } else {
        value
    }
}
