use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use quill_commit::{BuildStatus, SubmissionReceipt};
use quill_sanitize::{parse_submission, Sanitizer};
use quill_server::{build_service, QuillConfig, QuillServer, SubmitResponse};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Submit(args) => cmd_submit(config_path, &args, cli.format).await,
        Command::Validate(args) => cmd_validate(config_path, &args, cli.format),
        Command::Serve(args) => cmd_serve(config_path, args).await,
    }
}

async fn cmd_submit(
    config_path: Option<&Path>,
    args: &SubmitArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = QuillConfig::load(config_path).context("loading configuration")?;
    let body = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let service = build_service(&config)?;
    tracing::debug!(file = %args.file.display(), backend = ?config.storage.backend, "submitting");

    let receipt = service.submit_bytes(&body).await?;
    match format {
        OutputFormat::Json => {
            let response = SubmitResponse::new(receipt, config.site_url().as_deref());
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => print_receipt(&receipt),
    }
    Ok(())
}

fn print_receipt(receipt: &SubmissionReceipt) {
    println!(
        "{} Resume {} stored",
        "✓".green().bold(),
        receipt.document_id.as_str().yellow()
    );
    println!("  Path: {}", receipt.path);
    let attempts = match receipt.attempts {
        1 => "1 attempt".to_string(),
        n => format!("{n} attempts"),
    };
    println!("  Commit: {} ({attempts})", receipt.commit.short_hex().cyan());
    match &receipt.build {
        BuildStatus::Triggered => println!("  Build: {}", "triggered".green()),
        BuildStatus::Degraded { reason } => {
            println!("  Build: {} {reason}", "not triggered:".yellow().bold())
        }
    }
    println!("  Edit token: {}", receipt.edit_token.dimmed());
}

/// Reads the config file without requiring remote credentials.
fn lenient_config(path: Option<&Path>) -> anyhow::Result<QuillConfig> {
    Ok(match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            QuillConfig::from_toml(&text)?
        }
        None => QuillConfig::default(),
    })
}

fn cmd_validate(
    config_path: Option<&Path>,
    args: &ValidateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = lenient_config(config_path)?;
    let body = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let raw = parse_submission(&body)?;
    let document = Sanitizer::new(config.storage.data_root).sanitize(raw)?;
    let canonical = String::from_utf8(document.to_canonical_json()?)?;

    match format {
        OutputFormat::Json => println!("{canonical}"),
        OutputFormat::Text => {
            println!(
                "{} Valid resume {} → {}",
                "✓".green().bold(),
                document.id.as_str().yellow(),
                document.path.bold()
            );
            println!("{canonical}");
        }
    }
    Ok(())
}

async fn cmd_serve(config_path: Option<&Path>, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = QuillConfig::load(config_path).context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    let server = QuillServer::new(config)?;
    println!(
        "Quill server on {} (backend: {:?}, branch: {})",
        server.config().server.bind_addr.to_string().bold(),
        server.config().storage.backend,
        server.config().storage.branch.yellow()
    );
    server.serve().await?;
    Ok(())
}
