//! Chunkup CLI: command-line client for the Chunkup API.
//!
//! Set CHUNKUP_API_URL (or API_URL); defaults to http://localhost:4000.

use anyhow::Context;
use chunkup_api_client::{ApiClient, ByteSource, ChunkedUploader, FileSource, UploadEvent};
use chunkup_cli::{describe_event, format_bytes, init_tracing};
use chunkup_core::DocumentType;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "chunkup", about = "Chunked upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file in chunks. Ctrl+C aborts and cleans up server-side.
    Upload {
        /// Path to the file to upload
        file: std::path::PathBuf,
        /// THESIS, DISSERTATION, CONFLUENCE, SYNERGY or HELLO
        #[arg(long, default_value = "HELLO")]
        document_type: DocumentType,
        /// Human-readable category label sent with each chunk
        #[arg(long)]
        category: Option<String>,
        /// Chunk size in KiB
        #[arg(long, default_value = "1024")]
        chunk_size_kb: u64,
    },
    /// Discard an unfinished upload by its file id
    Cleanup {
        /// Upload id returned with the first chunk
        file_id: String,
    },
    /// Server health and in-flight upload count
    Health,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn upload(
    client: ApiClient,
    file: std::path::PathBuf,
    document_type: DocumentType,
    category: Option<String>,
    chunk_size_kb: u64,
) -> anyhow::Result<()> {
    let source = FileSource::open(&file)
        .await
        .with_context(|| format!("Failed to open file: {}", file.display()))?;
    let file_name = source
        .file_name()
        .with_context(|| format!("No file name in path: {}", file.display()))?;

    eprintln!(
        "Uploading {} ({}) as {}",
        file_name,
        format_bytes(source.len()),
        document_type
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut uploader = ChunkedUploader::new(client, source, file_name)
        .document_type(document_type)
        .chunk_size(chunk_size_kb.max(1) * 1024)
        .events(tx);
    if let Some(category) = category {
        uploader = uploader.category(category);
    }

    let abort = uploader.abort_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Aborting after the current chunk...");
            abort.abort();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let UploadEvent::Progress { percent, .. } = &event {
                tracing::debug!(percent = *percent, "Upload progress");
            }
            if let Some(line) = describe_event(&event) {
                eprintln!("{}", line);
            }
        }
    });

    let result = uploader.start().await;
    ctrl_c.abort();
    // Sender dropped with the uploader; the printer drains and exits
    let _ = printer.await;

    let complete = result.context("Upload failed")?;
    print_json(&complete)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let client = ApiClient::from_env()
        .context("Failed to create API client. Check CHUNKUP_API_URL (or API_URL)")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            document_type,
            category,
            chunk_size_kb,
        } => {
            upload(client, file, document_type, category, chunk_size_kb).await?;
        }
        Commands::Cleanup { file_id } => {
            let response = client.cleanup_upload(&file_id).await?;
            print_json(&response)?;
        }
        Commands::Health => {
            let response = client.health().await?;
            print_json(&response)?;
        }
    }

    Ok(())
}
