//! pagecast-post - Publish local post files to Facebook Pages

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use libpagecast::config::parse_duration;
use libpagecast::graph::client::GraphClient;
use libpagecast::logging::LoggingConfig;
use libpagecast::{Environment, PagecastError, Result, RunSummary, Runner, Settings};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pagecast-post")]
#[command(version)]
#[command(about = "Publish local post files to Facebook Pages")]
#[command(long_about = "\
pagecast-post - Publish local post files to Facebook Pages

DESCRIPTION:
    Reads every .txt (and .docx) file in the posts directory and publishes
    it to each Facebook Page listed in the page registry. Lines starting
    with IMAGE: name a file in the images directory to attach.

    Pages are checked for connectivity first; unreachable pages are left
    out. Posts are published one at a time with a delay between publishes.

USAGE:
    # Publish everything in ./posts to the pages in ./config.txt
    pagecast-post

    # Use other locations
    pagecast-post --posts-dir ~/queue --pages ~/pages.txt

    # Machine-readable summary
    pagecast-post --format json

PAGE REGISTRY:
    One page per line: page_id|access_token|page_name
    A token of the form $NAME is read from the environment variable NAME.
    Blank lines and lines starting with # are ignored.

SIGNALS:
    SIGTERM, SIGINT - Stop before the next publish

CONFIGURATION:
    Settings file: ~/.config/pagecast/pagecast.toml (or PAGECAST_CONFIG)

    posts_dir = \"posts\"
    images_dir = \"images\"
    pages_file = \"config.txt\"
    publish_delay = \"2s\"

    [graph]
    api_version = \"v18.0\"

EXIT CODES:
    0 - All publishes succeeded, or cancelled
    1 - Setup failure or at least one failed publish
    2 - Invalid settings or arguments
")]
struct Cli {
    /// Directory containing post files
    #[arg(long, value_name = "DIR")]
    posts_dir: Option<PathBuf>,

    /// Directory containing images referenced by posts
    #[arg(long, value_name = "DIR")]
    images_dir: Option<PathBuf>,

    /// Page registry file (page_id|access_token|page_name)
    #[arg(long, value_name = "FILE")]
    pages: Option<PathBuf>,

    /// Settings file (overrides PAGECAST_CONFIG)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Delay between publishes, e.g. 2s or 500ms
    #[arg(long, value_name = "DURATION")]
    delay: Option<String>,

    /// Graph API version, e.g. v18.0
    #[arg(long, value_name = "VERSION")]
    api_version: Option<String>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env = Environment::from_process();

    LoggingConfig::from_env(&env, cli.verbose).init();

    match run(cli, &env).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli, env: &Environment) -> Result<i32> {
    let settings = build_settings(&cli, env)?;
    let client = GraphClient::new(&settings.graph)?;
    info!("Using Graph API at {}", client.api_base());

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let summary = Runner::new(&settings, env, Arc::new(client))
        .with_shutdown(shutdown)
        .run()
        .await?;

    if cli.format == "json" {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| PagecastError::InvalidInput(format!("Failed to encode summary: {}", e)))?;
        println!("{}", json);
    } else {
        print_summary(&summary);
    }

    Ok(summary.exit_code())
}

/// Settings file first, then command-line overrides
fn build_settings(cli: &Cli, env: &Environment) -> Result<Settings> {
    let mut settings = Settings::load(cli.settings.as_deref(), env)?;

    if let Some(dir) = &cli.posts_dir {
        settings.posts_dir = env.expand_path(dir)?;
    }
    if let Some(dir) = &cli.images_dir {
        settings.images_dir = env.expand_path(dir)?;
    }
    if let Some(file) = &cli.pages {
        settings.pages_file = env.expand_path(file)?;
    }
    if let Some(delay) = &cli.delay {
        settings.publish_delay = parse_duration(delay)?;
    }
    if let Some(version) = &cli.api_version {
        settings.graph.api_version = version.clone();
    }

    Ok(settings)
}

fn print_summary(summary: &RunSummary) {
    let rule = "=".repeat(80);

    if summary.cancelled {
        println!("Cancelled by user");
    }

    println!("{}", rule);
    println!("SUMMARY");
    println!("{}", rule);
    println!("Posts processed:  {}", summary.posts_processed);
    println!("Pages targeted:   {}", summary.pages_targeted);
    println!("Total success:    {}", summary.total_success);
    println!("Total failed:     {}", summary.total_failed);
    println!("{}", rule);
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::sync::atomic::Ordering;

    let mut signals = Signals::new([SIGINT, SIGTERM])
        .map_err(|e| PagecastError::InvalidInput(format!("Signal setup failed: {}", e)))?;

    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Received shutdown signal, stopping after the current publish...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(_shutdown: Arc<AtomicBool>) -> Result<()> {
    Ok(())
}
