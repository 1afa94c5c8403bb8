//! CLI entry point for spacetraveling

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spacetraveling::generator::Generator;
use spacetraveling::source::SourceSpec;
use spacetraveling::{commands, server, Site};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A blog pre-rendered from a headless CMS", long_about = None)]
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

    /// Pre-render the home page and every post
    #[command(alias = "g")]
    Generate {
        /// Read posts from a JSON fixture instead of the CMS
        #[arg(short, long)]
        fixture: Option<PathBuf>,
    },

    /// Start the blog server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Read posts from a JSON fixture instead of the CMS
        #[arg(short, long)]
        fixture: Option<PathBuf>,
    },

    /// List posts, loading up to N pages
    List {
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,

        /// Read posts from a JSON fixture instead of the CMS
        #[arg(short, long)]
        fixture: Option<PathBuf>,
    },

    /// Clean the public folder and cache
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,info"
    } else {
        "spacetraveling=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
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
            commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Generate { fixture } => {
            let site = Site::new(&base_dir)?;
            let spec = SourceSpec::from_config(&site.config, resolve(&base_dir, fixture));
            let stats = commands::generate::run(&site, spec).await?;
            println!("Generated {} posts successfully!", stats.posts);
        }

        Commands::Server { port, ip, fixture } => {
            let site = Site::new(&base_dir)?;
            let spec = SourceSpec::from_config(&site.config, resolve(&base_dir, fixture));
            let generator = Generator::new(&site, spec)?;

            // Generate first
            tracing::info!("Generating static files...");
            generator.generate().await?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(generator, &ip, port).await?;
        }

        Commands::List { pages, fixture } => {
            let site = Site::new(&base_dir)?;
            let spec = SourceSpec::from_config(&site.config, resolve(&base_dir, fixture));
            commands::list::run(&site, &spec, pages).await?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            commands::clean::run(&site)?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Fixture paths are relative to the site directory
fn resolve(base_dir: &std::path::Path, fixture: Option<PathBuf>) -> Option<PathBuf> {
    fixture.map(|path| {
        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    })
}
