//! CLI entry point for quire

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version)]
#[command(about = "Build a markdown blog into a static site", long_about = None)]
struct Cli {
    /// Set the site root (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Defaults to `build`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the site
    #[command(alias = "b")]
    Build,

    /// Remove generated output and the build store
    Clean,

    /// Clean, then build from scratch
    Rebuild,

    /// Report broken internal links in the generated site
    Check,

    /// Build, then rebuild whenever a source file changes
    Watch {
        /// IP address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not start the preview server
        #[arg(long)]
        no_server: bool,
    },

    /// Serve the generated site
    #[command(alias = "s")]
    Server {
        /// IP address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the configured deploy command
    Deploy,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "quire=debug,info"
    } else {
        "quire=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let site = quire::Site::new(&base_dir)?;

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            site.build()?;
            println!("Built successfully!");
        }

        Commands::Clean => {
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Rebuild => {
            site.rebuild()?;
            println!("Rebuilt successfully!");
        }

        Commands::Check => {
            let report = site.check()?;
            for link in &report.broken {
                println!("Broken link: {}", link);
            }
            if !report.is_ok() {
                anyhow::bail!("{} broken link(s)", report.broken.len());
            }
            println!("Checked {} links, all good.", report.links);
        }

        Commands::Watch {
            host,
            port,
            no_server,
        } => {
            let serve = (!no_server).then(|| {
                (
                    host.unwrap_or_else(|| site.config.preview_host.clone()),
                    port.unwrap_or(site.config.preview_port),
                )
            });
            quire::commands::watch::run(&site, serve).await?;
        }

        Commands::Server { host, port } => {
            let host = host.unwrap_or_else(|| site.config.preview_host.clone());
            let port = port.unwrap_or(site.config.preview_port);
            tracing::info!("Serving {:?}", site.destination_dir);
            quire::server::start(&site, &host, port).await?;
        }

        Commands::Deploy => {
            site.deploy()?;
            println!("Deployed successfully!");
        }
    }

    Ok(())
}
