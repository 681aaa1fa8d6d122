//! CLI entry point for folio

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::commands::check::Format;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Check and migrate the Markdown content of a portfolio/blog site", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post, page or draft
    New {
        /// Layout to use (post, page, draft)
        #[arg(short, long, default_value = "post")]
        layout: String,

        /// Title of the new document
        title: String,

        /// File name to use instead of the slugified title
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Check front-matter, code fences, permalinks and duplicated sections
    #[command(alias = "c")]
    Check {
        /// Report format (text, json)
        #[arg(short, long, default_value = "text")]
        format: Format,

        /// Check again whenever a file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// List site content
    List {
        /// Type of content to list (post, page, draft, all)
        #[arg(default_value = "all")]
        r#type: String,
    },

    /// Copy every document verbatim into another directory
    Migrate {
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Write concatenated front-matter sections as separate documents
        #[arg(long)]
        split: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "folio=debug,info"
    } else {
        "folio=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            folio::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New {
            layout,
            title,
            path,
        } => {
            let site = folio::Folio::new(&base_dir)?;
            tracing::info!("Creating new {} with title: {}", layout, title);
            let created =
                folio::commands::new::create_document(&site, &title, &layout, path.as_deref())?;
            println!("Created: {:?}", created);
        }

        Commands::Check { format, watch } => {
            let site = folio::Folio::new(&base_dir)?;
            let report = folio::commands::check::run(&site, format)?;

            if watch {
                folio::commands::check::watch(&site, format)?;
            } else if report.has_errors() {
                std::process::exit(1);
            }
        }

        Commands::List { r#type } => {
            let site = folio::Folio::new(&base_dir)?;
            folio::commands::list::run(&site, &r#type)?;
        }

        Commands::Migrate { out, split } => {
            let site = folio::Folio::new(&base_dir)?;
            let out = if out.is_absolute() {
                out
            } else {
                base_dir.join(out)
            };
            let summary = site.migrate(&out, split)?;
            println!(
                "Migrated {} documents to {:?} ({} from split sections)",
                summary.written, out, summary.split
            );
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
