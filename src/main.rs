use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use autotokens::config::TokenSettings;
use autotokens::locate;
use autotokens::lsp::stylesheet::is_supported_document;
use autotokens::lsp::{LanguageService, StylesheetTokenService};
use autotokens::session::{Readiness, TokenSession};
use autotokens::tokens::preview;
use clap::{Parser, Subcommand};
use lsp_types::Position;
use tracing::info;

#[derive(Parser)]
#[command(name = "autotokens", about = "Design-token hover and completion for stylesheets.")]
struct Cli {
    /// Settings file (replaces .autotokens/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Token prefix marker, e.g. --ds-
    #[arg(long, global = true, allow_hyphen_values = true)]
    prefix: Option<String>,

    /// Package whose manifest mention marks the project root
    #[arg(long, global = true)]
    package: Option<String>,

    /// Reference stylesheet to use instead of searching for one
    #[arg(long, global = true)]
    reference: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the reference stylesheet found above a directory
    Locate { dir: PathBuf },
    /// Print every token in the reference stylesheet
    Tokens {
        /// Directory to search from (defaults to current)
        #[arg(long)]
        from: Option<PathBuf>,
        /// Emit JSON instead of lines
        #[arg(long)]
        json: bool,
    },
    /// Hover markdown (JSON) for a 0-based line/character in a document
    Hover {
        document: PathBuf,
        line: u32,
        character: u32,
    },
    /// Completion items for a 0-based line/character in a document
    Complete {
        document: PathBuf,
        line: u32,
        character: u32,
    },
    /// Report references to undeclared tokens
    Check { document: PathBuf },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("autotokens=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    match cli.command {
        Command::Locate { dir } => match locate::locate_reference(&dir, &settings) {
            Some(path) => {
                println!("{}", path.display());
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("no reference stylesheet found above {}", dir.display());
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Tokens { from, json } => {
            let dir = match from {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            let mut settings = settings;
            if settings.reference.is_none() {
                let reference = locate::locate_reference(&dir, &settings).with_context(|| {
                    format!("no reference stylesheet found above {}", dir.display())
                })?;
                settings.reference = Some(reference);
            }
            let service = load_service(settings, None).await?;
            print_tokens(&service, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Hover {
            document,
            line,
            character,
        } => {
            let (service, text) = open_document(settings, &document).await?;
            let info = service.hover(&text, Position::new(line, character));
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Complete {
            document,
            line,
            character,
        } => {
            let (service, text) = open_document(settings, &document).await?;
            let items = service.completions(&text, Position::new(line, character));
            println!("{}", serde_json::to_string_pretty(&items)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { document } => {
            let (service, text) = open_document(settings, &document).await?;
            let diags = service.diagnostics(&text);
            println!("{}", serde_json::to_string_pretty(&diags)?);
            Ok(if diags.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Settings files and env, then CLI flags on top.
fn resolve_settings(cli: &Cli) -> Result<TokenSettings> {
    let mut settings = TokenSettings::load(cli.config.as_deref())?;
    if let Some(prefix) = &cli.prefix {
        settings.token_prefix = prefix.clone();
    }
    if let Some(package) = &cli.package {
        settings.package_name = package.clone();
    }
    if let Some(reference) = &cli.reference {
        settings.reference = Some(reference.clone());
    }
    settings.validate()?;
    Ok(settings)
}

async fn load_service(
    settings: TokenSettings,
    document: Option<&Path>,
) -> Result<StylesheetTokenService> {
    let session = TokenSession::new(settings);
    match session.ensure_loaded(document).await {
        Readiness::Ready(table) => {
            info!("{} tokens available", table.len());
        }
        Readiness::Pending => bail!("token table is still loading"),
        Readiness::Unavailable(e) => return Err(e.into()),
    }
    session
        .service()
        .await
        .context("token table was not ready after loading")
}

async fn open_document(
    settings: TokenSettings,
    document: &Path,
) -> Result<(StylesheetTokenService, String)> {
    if !is_supported_document(document, &settings.document_patterns) {
        bail!(
            "{} is not a stylesheet (expected one of {})",
            document.display(),
            settings.document_patterns.join(", ")
        );
    }
    let text = tokio::fs::read_to_string(document)
        .await
        .with_context(|| format!("failed to read {}", document.display()))?;
    let document = std::path::absolute(document)?;
    let service = load_service(settings, Some(&document)).await?;
    Ok((service, text))
}

fn print_tokens(service: &StylesheetTokenService, json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = service
            .table()
            .iter()
            .map(|(name, value)| {
                serde_json::json!({
                    "name": name,
                    "value": value,
                    "preview": preview(value),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (name, value) in service.table().iter() {
            println!("{name}\t{value}\t{}", preview(value).detail());
        }
    }
    Ok(())
}
