//! slidecast CLI - slide deck server and converter
//!
//! Runs the upload server, converts decks to PNG slides and inspects the
//! slide store from the command line.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use slidecast::render::{encode_png, slide_file_name, OoxmlRasterizer, RasterOptions};
use slidecast::{ServerConfig, SlideStore};
use std::fs;
use std::path::PathBuf;

/// Slide deck upload server and PowerPoint-to-PNG converter
#[derive(Parser)]
#[command(
    name = "slidecast",
    author = "iyulab",
    version,
    about = "Serve and convert slide decks",
    long_about = "slidecast - slide deck upload server.\n\n\
                  Accepts slide images or PPTX decks over HTTP, rasterizes decks into\n\
                  one PNG per slide and serves the active slide set."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, env = "SLIDECAST_BIND", default_value = slidecast::config::DEFAULT_BIND)]
        bind: String,

        /// Slide store directory
        #[arg(long, env = "SLIDECAST_SLIDES_DIR", default_value = "slides")]
        slides_dir: PathBuf,

        /// URL prefix for serving slide images
        #[arg(long, env = "SLIDECAST_PUBLIC_PATH", default_value = "/slides")]
        public_path: String,

        /// SQLite user database
        #[arg(long, env = "SLIDECAST_DATABASE", default_value = "slidecast.db")]
        database: PathBuf,

        /// Token signing secret (random per process if unset)
        #[arg(long, env = "SLIDECAST_TOKEN_SECRET", hide_env_values = true)]
        token_secret: Option<String>,

        /// Token lifetime in seconds
        #[arg(long, env = "SLIDECAST_TOKEN_TTL", default_value_t = slidecast::config::DEFAULT_TOKEN_TTL_SECS)]
        token_ttl: i64,

        /// Require a bearer token for upload and state
        #[arg(long, env = "SLIDECAST_REQUIRE_AUTH")]
        require_auth: bool,

        /// Total upload size limit in MiB
        #[arg(long, env = "SLIDECAST_UPLOAD_LIMIT_MB", default_value_t = 100)]
        upload_limit_mb: usize,

        /// Raster scale for converted decks
        #[arg(long, env = "SLIDECAST_SCALE", default_value_t = 1.0)]
        scale: f32,
    },

    /// Rasterize a PPTX deck into numbered PNG files
    Convert {
        /// Input deck
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Number of the first slide
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Raster scale (1.0 = one pixel per point)
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },

    /// Show deck information
    Info {
        /// Input deck
        input: PathBuf,
    },

    /// Print the current slide state of a store as JSON
    State {
        /// Slide store directory
        #[arg(long, env = "SLIDECAST_SLIDES_DIR", default_value = "slides")]
        slides_dir: PathBuf,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve {
            bind,
            slides_dir,
            public_path,
            database,
            token_secret,
            token_ttl,
            require_auth,
            upload_limit_mb,
            scale,
        } => {
            let mut config = ServerConfig::new()
                .with_bind(bind)
                .with_slides_dir(slides_dir)
                .with_public_path(public_path)
                .with_database(database)
                .with_token_ttl(token_ttl)
                .with_require_auth(require_auth)
                .with_upload_limit(upload_limit_mb.saturating_mul(1024 * 1024))
                .with_scale(scale);
            if let Some(secret) = token_secret {
                config = config.with_token_secret(secret);
            }
            config.validate()?;

            println!(
                "{} slidecast listening on {}",
                "▶".green().bold(),
                config.bind.bold()
            );
            slidecast::server::serve_blocking(config)?;
        }

        Commands::Convert {
            input,
            output,
            offset,
            scale,
        } => {
            let pb = create_spinner("Parsing deck...");
            let deck = slidecast::parse_deck(&input)?;
            pb.finish_and_clear();

            fs::create_dir_all(&output)?;
            let rasterizer = OoxmlRasterizer::new(RasterOptions::new().with_scale(scale));
            let pb = create_progress(deck.slide_count() as u64);

            for (i, slide) in deck.slides.iter().enumerate() {
                let name = slide_file_name(offset + i);
                pb.set_message(name.clone());
                let image = rasterizer.paint_slide(deck.size, slide)?;
                fs::write(output.join(&name), encode_png(&image)?)?;
                pb.inc(1);
            }
            pb.finish_and_clear();

            println!(
                "{} Converted {} slides to {}",
                "✓".green().bold(),
                deck.slide_count(),
                output.display()
            );
        }

        Commands::Info { input } => {
            let pb = create_spinner("Analyzing deck...");

            let data = fs::read(&input)?;
            let format = slidecast::detect_presentation_format(&data)?;
            let deck = slidecast::parse_deck_bytes(data)?;

            pb.finish_and_clear();

            let (width, height) = deck.size.to_points();
            println!("{}", "Deck Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), format);
            println!("{}: {}", "Slides".bold(), deck.slide_count());
            println!("{}: {} × {} pt", "Page size".bold(), width, height);

            let pictures: usize = deck
                .slides
                .iter()
                .flat_map(|slide| &slide.shapes)
                .filter(|shape| matches!(shape.fill, Some(slidecast::deck::Fill::Picture(_))))
                .count();
            println!("{}: {}", "Pictures".bold(), pictures);
        }

        Commands::State {
            slides_dir,
            compact,
        } => {
            let store = SlideStore::open(&slides_dir)?;
            let state = slidecast::current_state(&store)?;
            let json = if compact {
                serde_json::to_string(&state)?
            } else {
                serde_json::to_string_pretty(&state)?
            };
            println!("{}", json);
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "slidecast".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Slide deck upload server and PowerPoint-to-PNG converter");
    println!();
    println!("Upload formats: PPTX, PNG, JPEG");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn create_progress(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:30.blue} {pos}/{len} {msg}")
            .unwrap(),
    );
    pb
}
