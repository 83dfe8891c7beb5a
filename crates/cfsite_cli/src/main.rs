//! Operator CLI for the site backend.
//!
//! # Responsibility
//! - Load settings, optionally start file logging, and run one command.
//! - Print results as JSON on stdout; errors on stderr with exit code 1.

mod cli;

use cfsite_core::webhook::HttpClient;
use cfsite_core::{
    init_logging, send_webhook, ContentKey, ContentPayload, Settings, SiteService,
    WebhookEnvelope,
};
use clap::Parser;
use cli::{Cli, Commands};
use log::{error, info};
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Ping => {
            println!("cfsite_core ping={}", cfsite_core::ping());
            return Ok(());
        }
        Commands::Version => {
            println!("cfsite_core version={}", cfsite_core::core_version());
            return Ok(());
        }
        _ => {}
    }

    let settings = Settings::load(cli.config.as_deref())?;
    if let Some(log_dir) = settings.logging.dir.as_deref() {
        init_logging(&settings.logging.level, log_dir)?;
    }

    match cli.command {
        Commands::Ping | Commands::Version => Ok(()),
        Commands::Content { key } => {
            let service = SiteService::connect(&settings)?;
            let payload = service.content().get_content(&ContentKey::new(key)).await?;
            print_json(&payload.map_or(Value::Null, Value::Object))
        }
        Commands::Stats => {
            let service = SiteService::connect(&settings)?;
            let stats = service.dashboard().load_dashboard_stats().await?;
            print_json(&serde_json::to_value(stats)?)
        }
        Commands::Seed { file } => {
            let entries = read_seed_file(&file)?;
            let service = SiteService::connect(&settings)?;
            let written = service.content().seed_content(&entries).await?;
            info!("event=cli_seed module=cli status=ok entries={written}");
            println!("seeded {written} content entries");
            Ok(())
        }
        Commands::Inquiries { status, limit } => {
            let service = SiteService::connect(&settings)?;
            let inquiries = service
                .inquiries()
                .list_inquiries(status.map(Into::into), limit)
                .await?;
            print_json(&serde_json::to_value(inquiries)?)
        }
        Commands::WebhookTest { endpoint } => {
            let mut webhook = settings.clone();
            if let Some(endpoint) = endpoint {
                webhook.webhook.endpoint = Some(endpoint);
            }
            let (url, secret) = webhook.webhook_target()?;
            let delivery = send_webhook(
                &HttpClient::new(),
                &url,
                &secret,
                &WebhookEnvelope::test_inquiry(),
            )
            .await?;
            println!("webhook accepted: HTTP {} {}", delivery.status, delivery.body);
            Ok(())
        }
    }
}

fn read_seed_file(path: &Path) -> CliResult<Vec<(ContentKey, ContentPayload)>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read seed file `{}`: {err}", path.display()))?;
    let document: Value = serde_json::from_str(&raw)?;
    let Value::Object(entries) = document else {
        return Err("seed file must be a JSON object keyed by content key".into());
    };

    entries
        .into_iter()
        .map(|(key, payload)| match payload {
            Value::Object(payload) => Ok((ContentKey::new(key), payload)),
            _ => Err(format!("seed entry `{key}` must be a JSON object").into()),
        })
        .collect()
}

fn print_json(value: &Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
