use anyhow::Result;
use clap::{Parser, Subcommand};
use club_image_variants::models::{
    Config, DeleteVariantsRequest, DeleteVariantsResponse, ResizeOperation, SaveVariantsRequest,
    TransformOperation, TransformRequest,
};
use club_image_variants::ImageVariantService;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "club-image-variants")]
#[command(about = "Transform, store and delete club image variants")]
struct CliArgs {
    /// Directory served as static files (overrides IMAGES_PUBLIC_DIR).
    #[arg(long, global = true)]
    public_dir: Option<PathBuf>,

    /// Root folder name for stored images (overrides IMAGES_ROOT).
    #[arg(long, global = true)]
    images_root: Option<String>,

    /// Maximum decoded payload size in bytes (overrides IMAGES_MAX_PAYLOAD_BYTES).
    #[arg(long, global = true)]
    max_payload_bytes: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resize and/or re-encode an image without storing it.
    Transform {
        /// File holding the data URL, or `-` for stdin.
        #[arg(default_value = "-")]
        input: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Target format: jpeg, png, webp or avif.
        #[arg(long)]
        format: Option<String>,
    },
    /// Store the small, medium and large variants of an image.
    Save {
        #[arg(long)]
        folder: String,
        /// File holding the data URL, or `-` for stdin.
        #[arg(default_value = "-")]
        input: String,
    },
    /// Delete every variant of a stored image.
    Delete {
        #[arg(long)]
        folder: String,
        /// Any one of the paths returned by `save`.
        #[arg(long)]
        path: String,
    },
}

fn read_input(input: &str) -> std::io::Result<String> {
    let mut raw = String::new();
    if input == "-" {
        std::io::stdin().read_to_string(&mut raw)?;
    } else {
        raw = std::fs::read_to_string(input)?;
    }
    Ok(raw.trim().to_string())
}

fn resize_from_args(width: Option<u32>, height: Option<u32>) -> Option<ResizeOperation> {
    (width.is_some() || height.is_some()).then_some(ResizeOperation { width, height })
}

fn print_json(value: &impl Serialize) -> club_image_variants::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(service: &ImageVariantService, command: Command) -> club_image_variants::Result<()> {
    match command {
        Command::Transform {
            input,
            width,
            height,
            format,
        } => {
            let request = TransformRequest {
                image: read_input(&input)?,
                operations: Some(TransformOperation {
                    resize: resize_from_args(width, height),
                    format,
                }),
            };
            print_json(&service.transform(request).await?)?;
        }
        Command::Save { folder, input } => {
            let request = SaveVariantsRequest {
                folder,
                image: read_input(&input)?,
            };
            print_json(&service.save_variants(request).await?)?;
        }
        Command::Delete { folder, path } => {
            let request = DeleteVariantsRequest {
                folder,
                image_path: path,
            };
            print_json(&service.delete_variants(request).await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "club_image_variants=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env()?;
    if let Some(public_dir) = args.public_dir {
        config.public_dir = public_dir;
    }
    if let Some(images_root) = args.images_root {
        config.images_root = images_root;
    }
    if let Some(max_payload_bytes) = args.max_payload_bytes {
        config.max_payload_bytes = max_payload_bytes;
    }

    let service = match ImageVariantService::new(&config) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize image service: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&service, args.command).await {
        error!("Operation failed: {}", e);
        print_json(&serde_json::json!({ "error": e.to_string() }))?;
        std::process::exit(if e.is_client_error() { 2 } else { 1 });
    }

    Ok(())
}
