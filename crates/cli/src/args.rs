//! Command-line arguments

use std::path::PathBuf;

use bx24_domain::EntityQuery;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "bx24")]
#[command(about = "Fetch Bitrix24 CRM entities over the REST API", long_about = None)]
pub struct Cli {
    /// Config file (JSON or TOML). Defaults to environment, then probed files.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormatArg::Text, global = true)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the session and report the portal host.
    Ping,

    /// Fetch every entity returned by a list method, e.g. `crm.deal.list`.
    Fetch {
        entity: String,
        #[command(flatten)]
        query: QueryArgs,
        /// Print each page as one JSON line instead of a single array.
        #[arg(long)]
        stream: bool,
    },

    /// Fetch the children of one parent, e.g. deals of a company.
    Related {
        entity: String,
        #[arg(long)]
        parent_field: String,
        #[arg(long)]
        parent_id: String,
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Fetch the first page of children for many parents in batches.
    RelatedMany {
        entity: String,
        #[arg(long)]
        parent_field: String,
        #[arg(long, value_delimiter = ',', required = true)]
        parent_ids: Vec<String>,
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// Field to return; repeat or separate with commas.
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Filter as FIELD=VALUE. Values starting with `[` or `{` are read as JSON.
    #[arg(short, long, value_parser = parse_pair)]
    pub filter: Vec<(String, String)>,

    /// Sort as FIELD=ASC|DESC.
    #[arg(short, long, value_parser = parse_pair)]
    pub order: Vec<(String, String)>,

    /// Page sequentially instead of batching page requests.
    #[arg(long)]
    pub no_batch: bool,
}

impl QueryArgs {
    pub fn to_query(&self) -> EntityQuery {
        let mut query = EntityQuery::new().select(self.select.iter().cloned()).use_batch(!self.no_batch);
        for (field, raw) in &self.filter {
            query = query.filter(field.clone(), filter_value(raw));
        }
        for (field, direction) in &self.order {
            query = query.order(field.clone(), direction.to_ascii_uppercase());
        }
        query
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got `{raw}`")),
    }
}

fn filter_value(raw: &str) -> Value {
    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    Value::String(raw.to_string())
}
