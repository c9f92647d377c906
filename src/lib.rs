pub mod client;
pub mod config;
pub mod maintenance;
pub mod models;
pub mod preview;
pub mod principal;
pub mod schema;
pub mod studio;
mod utils;

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use client::http::SanityClient;
use client::read::{EventSummary, ReadClient};
use client::{ClientConfig, QueryParams};
use config::{parse_timezone, AppConfig, ConfigStore};
use maintenance::BackfillOutcome;
use models::{EventDocument, Slug};
use preview::{DateFormatter, Locale, PreviewSelection};
use principal::Principal;
use schema::event::event_type;
use schema::slug;
use schema::validation::{field_states, validate_document, FieldState, ValidationIssue};
use studio::StudioConfig;

#[derive(Debug, Parser)]
#[command(name = "dayone-content", version, about = "Day One content operations")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write placeholder details on one event that has a headline and venue but no details
    BackfillDetails {
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the document schemas as JSON
    Schema,
    /// Validate an event document and show which fields are hidden or read-only
    Validate {
        file: PathBuf,
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    /// Render the list preview for a resolved event document, or for a stored event by id
    Preview {
        #[arg(required_unless_present = "id", conflicts_with = "id")]
        file: Option<PathBuf>,
        #[arg(long)]
        id: Option<String>,
    },
    /// List the studio tools visible to a user with the given roles
    Tools {
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    /// List published events through the front-end read client
    ListEvents,
    #[command(subcommand)]
    Config(ConfigAction),
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    SetToken { token: String },
    SetTimezone { timezone: String },
    SetLocale { locale: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationOutput {
    blocks_publish: bool,
    issues: Vec<ValidationIssue>,
    field_states: BTreeMap<&'static str, FieldState>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    suggested_slugs: BTreeMap<&'static str, Slug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doors_open_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigView {
    path: String,
    cli: config::CliConfig,
    has_token: bool,
    display_timezone: Option<String>,
    locale: Option<String>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn principal_from(roles: Vec<String>) -> Principal {
    Principal::with_roles(roles)
}

async fn backfill_details(config: &AppConfig, dry_run: bool) -> Result<ExitCode> {
    let client_config = ClientConfig::new(
        config.cli.api.project_id.as_str(),
        config.cli.api.dataset.as_str(),
        maintenance::CLI_API_VERSION,
    )
    .with_token(config.token());
    let client = SanityClient::new(client_config)?;

    Ok(match maintenance::run(&client, dry_run).await {
        Some(BackfillOutcome::NoWork) => {
            info!("nothing to backfill");
            ExitCode::SUCCESS
        }
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    })
}

fn validation_output(document: &Value, principal: &Principal) -> ValidationOutput {
    let schema = event_type();
    let report = validate_document(&schema, document, Some(principal));
    // Documents with malformed typed fields still get a report, just no doors time.
    let doors_open_at = serde_json::from_value::<EventDocument>(document.clone())
        .ok()
        .and_then(|event| event.doors_open_at());

    ValidationOutput {
        blocks_publish: report.blocks_publish(),
        issues: report.issues,
        field_states: field_states(&schema, document, Some(principal)),
        suggested_slugs: slug::suggest(&schema, document).into_iter().collect(),
        doors_open_at,
    }
}

fn validate(file: &Path, roles: Vec<String>) -> Result<ExitCode> {
    let document = read_json(file)?;
    let output = validation_output(&document, &principal_from(roles));
    let blocks_publish = output.blocks_publish;
    print_json(&output)?;

    Ok(if blocks_publish {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn fetch_event(id: &str) -> Result<Value> {
    let client = ReadClient::new()?;
    let mut params = QueryParams::new();
    params.insert("id".to_string(), Value::String(id.to_string()));
    client
        .fetch(&preview::event_by_id_query(), &params)
        .await
        .with_context(|| format!("fetching event {id} failed"))?
        .with_context(|| format!("no event with id {id}"))
}

fn render_preview(document: &Value, formatter: &DateFormatter) -> Result<()> {
    let selection = PreviewSelection::select(&event_type(), document)
        .context("document does not match the event preview selection")?;
    print_json(&preview::prepare(&selection, formatter))
}

fn summary_selection(event: EventSummary) -> PreviewSelection {
    PreviewSelection {
        name: event.name,
        venue: event.venue,
        artist: event.headline,
        date: event.date.map(|date| date.to_rfc3339()),
        image: None,
    }
}

async fn list_events(formatter: &DateFormatter) -> Result<()> {
    let client = ReadClient::new()?;
    let events = client.events().await.context("event listing failed")?;
    info!(count = events.len(), "fetched published events");

    for event in events {
        let slug = event
            .slug
            .as_ref()
            .and_then(|slug| slug.current.clone())
            .unwrap_or_default();
        let preview = preview::prepare(&summary_selection(event), formatter);
        println!("{slug}\t{}\t{}", preview.title, preview.subtitle);
    }
    Ok(())
}

fn configure(store: &ConfigStore, action: ConfigAction) -> Result<()> {
    let updated = match action {
        ConfigAction::Show => store.read(),
        ConfigAction::SetToken { token } => store.update(|config| {
            config.api_token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
        })?,
        ConfigAction::SetTimezone { timezone } => {
            let tz = parse_timezone(&timezone)?;
            store.update(|config| config.display_timezone = Some(tz.name().to_string()))?
        }
        ConfigAction::SetLocale { locale } => {
            if Locale::parse(&locale).is_none() {
                anyhow::bail!("unsupported locale: {locale}");
            }
            store.update(|config| config.locale = Some(locale.trim().to_string()))?
        }
    };

    print_json(&config_view(store.path(), updated))
}

/// What `config` prints: the stored settings with the same env overrides every command sees.
fn config_view(path: &Path, config: AppConfig) -> ConfigView {
    ConfigView {
        path: path.display().to_string(),
        cli: config.cli.clone().with_env_overrides(),
        has_token: config.token().is_some(),
        display_timezone: config.display_timezone,
        locale: config.locale,
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let store = ConfigStore::load();
    let config = store.read();

    match cli.command {
        Command::BackfillDetails { dry_run } => backfill_details(&config, dry_run).await,
        Command::Schema => {
            print_json(&schema::schema_types())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate { file, roles } => validate(&file, roles),
        Command::Preview { file, id } => {
            let formatter = config.date_formatter()?;
            let document = match (file, id) {
                (Some(file), _) => read_json(&file)?,
                (None, Some(id)) => fetch_event(&id).await?,
                (None, None) => anyhow::bail!("either a file or --id is required"),
            };
            render_preview(&document, &formatter)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Tools { roles } => {
            let studio = StudioConfig::new(&config.cli);
            let principal = principal_from(roles);
            print_json(&studio.tools_for(Some(&principal)))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ListEvents => {
            list_events(&config.date_formatter()?).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config(action) => {
            configure(&store, action)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

pub async fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
