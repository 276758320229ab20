//! Ingest a JSON file of raw catalog records into one user's feed.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use serde_json::Value;

use curation::domain::{ActivityType, EventCollector, IngestRequest, ProfileSighting};
use curation::outbound::Repositories;
use curation::settings::CurationSettings;
use curation::telemetry;

/// `ingest-catalog` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ingest-catalog",
    about = "Normalize raw catalog records and add them to a user's feed",
    version
)]
struct CliArgs {
    /// JSON file holding an array of records, or `-` for stdin.
    #[arg(value_name = "path")]
    input: PathBuf,
    /// Display name of the feed owner.
    #[arg(long, value_name = "name")]
    owner: String,
    /// Handle to record for the owner.
    #[arg(long, value_name = "handle")]
    handle: Option<String>,
    /// Avatar URL to record for the owner.
    #[arg(long = "avatar-url", value_name = "url")]
    avatar_url: Option<String>,
    /// Activity the records represent.
    #[arg(long, value_name = "type", default_value = "browsed")]
    activity: ActivityType,
    /// Provenance tag stored with each item.
    #[arg(long, value_name = "tag", default_value = "cli")]
    source: String,
    /// Database URL. Falls back to `CURATION_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    telemetry::init(&DefaultEnv::new());
    let args = CliArgs::parse();

    let settings = CurationSettings::load_from_iter([OsString::from("ingest-catalog")])
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let database_url = args
        .database_url
        .clone()
        .or_else(|| settings.database_url.clone())
        .ok_or_else(|| eyre!("a database URL is required (--database-url or CURATION_DATABASE_URL)"))?;

    let items = parse_items(&read_input(&args.input)?)?;
    let repos = Repositories::connect(Some(settings.pool_config_for(&database_url)))
        .await
        .wrap_err("failed to prepare storage")?;
    let collector = EventCollector::new(
        repos.profiles,
        repos.feed_items,
        settings.canonicalizer().wrap_err("invalid placeholder image base")?,
        Arc::new(DefaultClock),
    );

    let result = collector
        .ingest(IngestRequest {
            owner: ProfileSighting {
                display_name: args.owner,
                handle: args.handle,
                avatar_url: args.avatar_url,
            },
            items,
            activity_type: args.activity,
            source: args.source,
        })
        .await
        .wrap_err("ingestion failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .wrap_err("failed to read stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

/// Accept either a bare array of records or an object with an `items` array.
fn parse_items(raw: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(raw).wrap_err("input is not valid JSON")? {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.remove("items") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(eyre!("expected an `items` array")),
        },
        _ => Err(eyre!("expected a JSON array of records")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(r#"[{"id": "p1"}]"#)]
    #[case(r#"{"items": [{"id": "p1"}]}"#)]
    fn accepts_arrays_and_wrapped_arrays(#[case] raw: &str) {
        let items = parse_items(raw).expect("parses");
        assert_eq!(items, vec![json!({"id": "p1"})]);
    }

    #[rstest]
    #[case("42")]
    #[case(r#"{"records": []}"#)]
    #[case("not json")]
    fn rejects_other_shapes(#[case] raw: &str) {
        assert!(parse_items(raw).is_err());
    }

    #[rstest]
    fn parses_cli_flags() {
        let args = CliArgs::try_parse_from([
            "ingest-catalog",
            "items.json",
            "--owner",
            "Ada Lovelace",
            "--activity",
            "saved",
        ])
        .expect("valid flags");

        assert_eq!(args.activity, ActivityType::Saved);
        assert_eq!(args.source, "cli");
        assert!(args.database_url.is_none());
    }
}
