//! `bx24`: command-line access to Bitrix24 CRM entities.
//!
//! Output is JSON on stdout; logs go to stderr.

mod args;

use std::io::Write;

use anyhow::{Context, Result};
use bx24_core::{EntityFetcher, ProgressSink};
use bx24_domain::{Bx24Error, Config, EntityQuery, Record};
use bx24_infra::observability::{init_logging, LogFormat};
use bx24_infra::{config, PlatformSession};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::args::{Cli, Command, LogFormatArg};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment or a config file may suffice.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let format = match cli.log_format {
        LogFormatArg::Text => LogFormat::Text,
        LogFormatArg::Json => LogFormat::Json,
    };
    init_logging(format)?;

    let config = load_config(&cli)?;
    let session = PlatformSession::new(config);

    match cli.command {
        Command::Ping => {
            let client = session.sdk().await?;
            print_json(&json!({"status": "ready", "host": client.endpoint().host()}))?;
        }
        Command::Fetch { entity, query, stream } => {
            let fetcher = session.fetcher().await?;
            fetch(&fetcher, &entity, &query.to_query(), stream).await?;
        }
        Command::Related { entity, parent_field, parent_id, query } => {
            let fetcher = session.fetcher().await?;
            let records = fetcher
                .fetch_related_entities(&entity, &parent_field, &parent_id, &query.to_query(), None)
                .await?;
            print_json(&records)?;
        }
        Command::RelatedMany { entity, parent_field, parent_ids, query } => {
            let fetcher = session.fetcher().await?;
            let related = fetcher
                .fetch_related_entities_for_multiple(
                    &entity,
                    &parent_field,
                    &parent_ids,
                    &query.to_query(),
                )
                .await?;
            print_json(&related)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let loaded = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone())),
        None => config::load(),
    };
    let config = loaded
        .context("no usable configuration; set BX24_WEBHOOK_URL or provide a config file")?;
    debug!(portal = ?config.portal, "configuration loaded");
    Ok(config)
}

async fn fetch(
    fetcher: &EntityFetcher,
    entity: &str,
    query: &EntityQuery,
    stream: bool,
) -> Result<()> {
    if !stream {
        let records = fetcher.fetch_entities(entity, query, None).await?;
        return print_json(&records);
    }

    let sink = |page: Vec<Record>| -> bx24_domain::Result<()> {
        write_page(&mut std::io::stdout().lock(), &page)
    };

    let sink: &dyn ProgressSink = &sink;
    let leftover = fetcher.fetch_entities(entity, query, Some(sink)).await?;

    // The sequential path ignores the sink and returns everything at once.
    if !leftover.is_empty() {
        write_page(&mut std::io::stdout().lock(), &leftover)?;
    }
    Ok(())
}

/// Write `records` as one NDJSON line.
fn write_page<W: Write>(out: &mut W, records: &[Record]) -> bx24_domain::Result<()> {
    let line = serde_json::to_string(records)
        .map_err(|err| Bx24Error::Internal(format!("failed to encode page: {err}")))?;
    writeln!(out, "{line}")
        .and_then(|()| out.flush())
        .map_err(|err| Bx24Error::Internal(format!("failed to write page: {err}")))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string_pretty(value)?)
        .context("failed to write output")?;
    Ok(())
}
