use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colpo_report::ai::mime::detect_image_mime;
use colpo_report::models::Config;
use colpo_report::proxy;
use colpo_report::records::{BlobStore, S3BlobStore};
use colpo_report::report::{ReportClient, ReportService};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "colpo-report")]
#[command(about = "Colposcopy report proxy and client")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the report proxy endpoint.
    Serve {
        /// Address to listen on (overrides BIND_ADDR).
        #[arg(long)]
        bind: Option<String>,
    },
    /// Request a report for an image through a running proxy.
    Report {
        /// Path to the colposcopy image.
        #[arg(
            long,
            value_name = "PATH",
            required_unless_present = "image_url",
            conflicts_with = "image_url"
        )]
        image: Option<PathBuf>,
        /// URL of an image already stored in the S3 bucket (needs S3_* settings).
        #[arg(long, value_name = "URL")]
        image_url: Option<String>,
        /// Medical history embedded in the instruction.
        #[arg(long, default_value = "")]
        history: String,
        /// MIME type of the image; sniffed from its bytes when omitted.
        #[arg(long)]
        mime: Option<String>,
        /// Proxy endpoint URL (overrides REPORT_ENDPOINT).
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colpo_report=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            info!("Starting colpo-report proxy");
            if let Err(e) = proxy::serve(&config).await {
                error!("Proxy stopped: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Report {
            image,
            image_url,
            history,
            mime,
            endpoint,
        } => {
            let (bytes, source) = match (image, image_url) {
                (Some(path), _) => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("Failed to read image {}", path.display()))?;
                    (bytes, path.display().to_string())
                }
                (None, Some(url)) => {
                    let storage = config
                        .storage
                        .as_ref()
                        .context("--image-url needs S3_BUCKET and the S3_* credentials")?;
                    let blobs = S3BlobStore::from_config(storage).await?;
                    let bytes = blobs
                        .fetch(&url)
                        .await
                        .with_context(|| format!("Failed to fetch image {}", url))?;
                    (bytes, url)
                }
                (None, None) => bail!("either --image or --image-url is required"),
            };
            let mime = mime.unwrap_or_else(|| detect_image_mime(&bytes).to_string());
            let client = ReportClient::new(endpoint.unwrap_or(config.report_endpoint));

            info!("Analyzing {} ({}) via {}", source, mime, client.endpoint());
            match client.request_report(&bytes, &mime, &history).await {
                Ok(text) => {
                    println!("{}", text);
                    Ok(())
                }
                Err(e) => {
                    error!("Report generation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
