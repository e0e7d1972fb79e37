mod cli;

use std::io;

use clap::Parser;
use cli::{CacheCmd, Opts, OptsCmd, SnapshotOpts};
use herald_client::error::CacheError;
use herald_client::{FileNotificationCache, NotificationCache as _};
use herald_util_error::WhateverResult;
use snafu::{FromString as _, OptionExt as _, ResultExt as _, Snafu, Whatever};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const LOG_TARGET: &str = "herald::cli";

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("No data dir: pass --data-dir or set HERALD_DATA_DIR"))]
    NoDataDir,
    #[snafu(display("Cache error: {source}"))]
    Cache { source: CacheError },
    #[snafu(display("Serialization error: {source}"))]
    Json { source: serde_json::Error },
    #[snafu(display("Miscellaneous error: {source}"))]
    Whatever { source: Whatever },
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[snafu::report]
#[tokio::main]
async fn main() -> CliResult<()> {
    init_logging().context(WhateverSnafu)?;

    let opts = Opts::parse();
    let out = handle_cmd(opts).await?;
    println!("{}", serde_json::to_string_pretty(&out).context(JsonSnafu)?);
    Ok(())
}

async fn handle_cmd(opts: Opts) -> CliResult<serde_json::Value> {
    let data_dir = opts.global.data_dir().context(NoDataDirSnafu)?;
    let cache = FileNotificationCache::new(data_dir);

    Ok(match opts.cmd {
        OptsCmd::Cache(cmd) => match cmd {
            CacheCmd::Show(SnapshotOpts { identity, scope }) => {
                let notifications = cache
                    .try_read(scope, &identity)
                    .await
                    .context(CacheSnafu)?;
                info!(
                    target: LOG_TARGET,
                    %scope,
                    %identity,
                    count = notifications.len(),
                    "Read snapshot"
                );

                serde_json::to_value(notifications).context(JsonSnafu)?
            }
            CacheCmd::Clear(SnapshotOpts { identity, scope }) => {
                let removed = cache.clear(scope, &identity).await.context(CacheSnafu)?;
                info!(target: LOG_TARGET, %scope, %identity, removed, "Cleared snapshot");

                serde_json::Value::Bool(removed)
            }
            CacheCmd::Path(SnapshotOpts { identity, scope }) => serde_json::Value::String(
                cache.path_for(scope, &identity).display().to_string(),
            ),
        },
    })
}

pub fn init_logging() -> WhateverResult<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| Whatever::without_source("Failed to initialize logging".to_string()))?;

    Ok(())
}
