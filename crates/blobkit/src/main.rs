//! blobkit - save, fetch, delete and health-check blobs from the command line

use anyhow::{Context as _, Result, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use blobkit_storage::{Context, SaveOptions, new_storage};
use config::{Config, LoggingConfig};

/// blobkit - pluggable blob storage tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "BLOBKIT_CONFIG", default_value = "config/blobkit.toml")]
    config: String,

    /// Service namespace (overrides the config file)
    #[arg(short, long, env = "BLOBKIT_NAMESPACE")]
    namespace: Option<String>,

    /// Abort the operation after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write, read back and delete a probe object
    Ping,
    /// Store a local file under PATH
    Put {
        /// Logical path inside the namespace
        path: String,
        /// File to upload
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long)]
        content_disposition: Option<String>,
    },
    /// Fetch the payload stored under PATH
    Get {
        path: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete the payload stored under PATH
    Rm { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    init_logging(&config.logging);

    let namespace = args.namespace.unwrap_or(config.namespace);
    let storage = new_storage(&namespace, &config.storage)
        .with_context(|| format!("Failed to initialize {} storage", config.storage.backend))?;

    let root = Context::background();
    let ctx = match args.timeout {
        Some(secs) => root.with_timeout(Duration::from_secs(secs)),
        None => root.child(),
    };

    let canceller = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            canceller.cancel();
        }
    });

    match args.command {
        Command::Ping => {
            storage.ping(&ctx).await.context("Health check failed")?;
            info!("{} is healthy", storage.describe());
            println!("ok");
        }
        Command::Put {
            path,
            file,
            content_type,
            content_disposition,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {:?}", file))?;

            let mut options = SaveOptions::new();
            if let Some(content_type) = content_type {
                options = options.with_content_type(content_type);
            }
            if let Some(content_disposition) = content_disposition {
                options = options.with_content_disposition(content_disposition);
            }

            let location = storage
                .save(&ctx, &path, Bytes::from(data), &options)
                .await
                .with_context(|| format!("Failed to save {}", path))?;
            println!("{}", location);
        }
        Command::Get { path, output } => {
            let Some(data) = storage
                .get(&ctx, &path)
                .await
                .with_context(|| format!("Failed to get {}", path))?
            else {
                error!("{} not found", path);
                bail!("{} not found", path);
            };

            match output {
                Some(output) => tokio::fs::write(&output, &data)
                    .await
                    .with_context(|| format!("Failed to write {:?}", output))?,
                None => std::io::stdout()
                    .write_all(&data)
                    .context("Failed to write to stdout")?,
            }
        }
        Command::Rm { path } => {
            storage
                .delete(&ctx, &path)
                .await
                .with_context(|| format!("Failed to delete {}", path))?;
        }
    }

    Ok(())
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so `get` output on stdout stays clean.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_put() {
        let args = Args::try_parse_from([
            "blobkit",
            "--namespace",
            "billing",
            "--timeout",
            "5",
            "put",
            "invoices/001.pdf",
            "./001.pdf",
            "--content-type",
            "application/pdf",
        ])
        .unwrap();

        assert_eq!(args.namespace.as_deref(), Some("billing"));
        assert_eq!(args.timeout, Some(5));
        match args.command {
            Command::Put {
                path,
                file,
                content_type,
                content_disposition,
            } => {
                assert_eq!(path, "invoices/001.pdf");
                assert_eq!(file, PathBuf::from("./001.pdf"));
                assert_eq!(content_type.as_deref(), Some("application/pdf"));
                assert_eq!(content_disposition, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_args_require_subcommand() {
        assert!(Args::try_parse_from(["blobkit"]).is_err());
    }
}
