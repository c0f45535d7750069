//! DocVault CLI — bucket administration for the vault.
//!
//! Reads the same environment as the services (DATABASE_URL is not needed
//! for key generation; bucket commands use S3_* / AWS_* variables).

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docvault_cli::{human_size, init_tracing};
use docvault_core::{Config, CustomerKey};
use docvault_storage::{ObjectStore, S3ObjectStore};

#[derive(Parser)]
#[command(name = "docvault", about = "DocVault bucket administration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a fresh SSE-C customer key, ready for the environment
    GenerateKey,
    /// Probe the configured bucket and report whether it is reachable
    CheckBucket,
    /// Mint a presigned URL for an object key
    Presign {
        /// Object key inside the bucket
        key: String,
        /// Force a download (attachment) disposition on the URL
        #[arg(long)]
        download: bool,
        /// URL lifetime in seconds
        #[arg(long, default_value = "300")]
        expires_secs: u64,
    },
    /// Download an object to a local file or stdout
    Fetch {
        /// Object key inside the bucket
        key: String,
        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Duplicate an object to a new key
    Copy {
        source_key: String,
        destination_key: String,
    },
    /// Move an object to a new key, removing the source
    Move {
        source_key: String,
        destination_key: String,
    },
}

async fn connect_storage() -> anyhow::Result<S3ObjectStore> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let storage = S3ObjectStore::connect(&config)
        .await
        .context("Failed to connect to object storage")?;
    Ok(storage)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::GenerateKey => {
            let key = CustomerKey::generate()?;
            println!("S3_SSE_CUSTOMER_KEY={}", key.key_base64());
            println!("# key MD5 digest: {}", key.key_md5_base64());
        }
        Commands::CheckBucket => {
            let config = Config::from_env().context("Failed to load configuration")?;
            // connect() itself probes the bucket, turning the two non-exists
            // outcomes into distinct errors.
            match S3ObjectStore::connect(&config).await {
                Ok(_) => println!(
                    "bucket {}: reachable (sse-c {})",
                    config.s3_bucket,
                    if config.sse_customer_key.is_some() {
                        "enabled"
                    } else {
                        "disabled"
                    }
                ),
                Err(e) => anyhow::bail!("bucket {}: {}", config.s3_bucket, e),
            }
        }
        Commands::Presign {
            key,
            download,
            expires_secs,
        } => {
            let storage = connect_storage().await?;
            let expires_in = Duration::from_secs(expires_secs);
            let url = if download {
                storage.downloadable_presigned_url(&key, expires_in).await?
            } else {
                storage.presigned_url(&key, expires_in).await?
            };
            println!("{}", url);
        }
        Commands::Fetch { key, output } => {
            let storage = connect_storage().await?;
            let data = storage.download(&key).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &data)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("wrote {} to {}", human_size(data.len() as u64), path.display());
                }
                None => {
                    std::io::stdout().lock().write_all(&data)?;
                }
            }
        }
        Commands::Copy {
            source_key,
            destination_key,
        } => {
            let storage = connect_storage().await?;
            storage.copy(&source_key, &destination_key).await?;
            println!("copied {} -> {}", source_key, destination_key);
        }
        Commands::Move {
            source_key,
            destination_key,
        } => {
            let storage = connect_storage().await?;
            storage.cut(&source_key, &destination_key).await?;
            println!("moved {} -> {}", source_key, destination_key);
        }
    }

    Ok(())
}
