use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use thumbcache::models::Dimensions;
use thumbcache::pipeline::ImagePipeline;
use thumbcache::resolver::ThumbnailResolver;
use thumbcache::settings::{Overrides, Settings, SettingsResolver};
use thumbcache::source::{MediaLocation, MediaSource};
use thumbcache::storage::FsStorage;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "thumbcache")]
#[command(about = "Resolve and generate cached thumbnails")]
struct CliArgs {
    /// Source image path, relative to the media root.
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Target size as WxH.
    #[arg(short, long, default_value = "100x100")]
    size: Dimensions,

    /// Transformation option, in naming order (repeatable).
    #[arg(short, long = "opt", value_name = "OPTION")]
    opts: Vec<String>,

    /// Override the configured quality (0-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Override the configured base directory.
    #[arg(long)]
    basedir: Option<String>,

    /// Override the configured subdirectory.
    #[arg(long)]
    subdir: Option<String>,

    /// Override the configured filename prefix.
    #[arg(long)]
    prefix: Option<String>,

    /// Override the configured extension; an empty value keeps the source format.
    #[arg(long)]
    extension: Option<String>,

    /// Media root directory the source lives under.
    #[arg(long, default_value = ".")]
    media_root: PathBuf,

    /// Public base URL thumbnails are addressed under.
    #[arg(long, default_value = "/media/")]
    media_url: String,

    /// JSON settings file; THUMBNAIL_* environment variables are used when omitted.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Regenerate even when the thumbnail is already stored.
    #[arg(long)]
    force: bool,
}

impl CliArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            quality: self.quality,
            basedir: self.basedir.clone(),
            subdir: self.subdir.clone(),
            prefix: self.prefix.clone(),
            extension: self.extension.clone(),
            processors: None,
        }
    }
}

async fn run(args: CliArgs) -> thumbcache::Result<()> {
    let settings = match &args.settings {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env()?,
    };

    let storage = FsStorage::new(args.media_root.clone(), args.media_url.clone());
    let resolver = ThumbnailResolver::new(
        SettingsResolver::new(settings),
        Box::new(storage),
        Box::new(ImagePipeline::new()),
    );

    let media = MediaLocation::new(args.media_root.clone(), args.media_url.clone());
    let source = MediaSource::new(&args.source, media)?;
    let overrides = args.overrides();

    let thumbnail = if args.force {
        resolver.refresh(&source, args.size, &args.opts, &overrides).await?
    } else {
        resolver.resolve(&source, args.size, &args.opts, &overrides).await?
    };

    if thumbnail.generated {
        info!("Generated thumbnail");
    } else {
        info!("Thumbnail already stored");
    }
    println!("key:  {}", thumbnail.key);
    println!("path: {}", thumbnail.dest.display());
    println!("url:  {}", thumbnail.url);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumbcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Thumbnail resolution failed: {}", e);
            std::process::exit(1);
        }
    }
}
