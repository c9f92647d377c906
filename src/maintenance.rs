//! One-shot job that writes placeholder `details` on events that lack them.

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::client::{fetch, ClientError, ContentStore, Patch, QueryParams};
use crate::models::Block;

pub const CLI_API_VERSION: &str = "2024-05-15";

pub const EVENT_QUERY: &str = r#"*[
    _type == "event"
    && defined(headline->name)
    && defined(venue->name)
    && !defined(details)][0]{
      _id,
      _rev,
      headline->{ name },
      venue->{ name }
}"#;

const BLOCK_KEY: &str = "details-block";
const SPAN_KEY: &str = "details-span";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventNeedingDetails {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default)]
    pub revision: Option<String>,
    pub headline: NamedRef,
    pub venue: NamedRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackfillOutcome {
    NoWork,
    Planned { id: String, description: String },
    Patched { id: String, description: String },
}

pub fn describe(headline: &str, venue: &str) -> String {
    format!(
        "Join us for an amazing performance by {headline} at {venue}. This promises to be an unforgettable evening of music and entertainment."
    )
}

pub fn details_for(description: &str) -> Vec<Block> {
    vec![Block::paragraph(BLOCK_KEY, SPAN_KEY, description)]
}

/// Query, then patch at most one event. Already-patched events never match the query.
pub async fn backfill_details<S: ContentStore>(
    store: &S,
    dry_run: bool,
) -> Result<BackfillOutcome, ClientError> {
    let event: Option<EventNeedingDetails> =
        fetch(store, EVENT_QUERY, &QueryParams::new()).await?;

    let Some(event) = event else {
        info!("No events found that need details");
        return Ok(BackfillOutcome::NoWork);
    };

    info!(
        "Found event: {} at {}",
        event.headline.name, event.venue.name
    );
    let description = describe(&event.headline.name, &event.venue.name);

    if dry_run {
        info!(id = %event.id, "dry run, not writing details: {description}");
        return Ok(BackfillOutcome::Planned {
            id: event.id,
            description,
        });
    }

    let details = serde_json::to_value(details_for(&description))
        .map_err(|err| ClientError::Parse(err.to_string()))?;
    let committed = Patch::new(event.id.as_str())
        .set("details", details)
        .if_revision(event.revision)
        .commit(store)
        .await?;

    let stored = committed
        .document
        .as_ref()
        .and_then(|doc| doc.get("details"))
        .and_then(details_text);
    info!(
        "Successfully updated event with details: {}",
        stored.as_deref().unwrap_or(description.as_str())
    );
    info!("Updated document ID: {}", committed.id);

    Ok(BackfillOutcome::Patched {
        id: committed.id,
        description,
    })
}

/// Top-level entry: failures are logged and end the run, nothing is retried.
pub async fn run<S: ContentStore>(store: &S, dry_run: bool) -> Option<BackfillOutcome> {
    match backfill_details(store, dry_run).await {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            error!("Error updating event: {err}");
            None
        }
    }
}

/// Plain text of a stored `details` value, for reporting.
pub fn details_text(details: &Value) -> Option<String> {
    let blocks: Vec<Block> = serde_json::from_value(details.clone()).ok()?;
    Some(
        blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}
