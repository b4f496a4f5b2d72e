use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use importmap::config::{load_config, save_config, ImportMapConfig};
use importmap::crawl::{load_repos, write_crawl_scripts};
use importmap::dataset::assemble_datasets;
use importmap::discovery::{discover, output_path, Credentials, GitHubClient};
use importmap::dispatch::{render_json, Dispatch};
use importmap::filter::filter_datasets;

/// Builds datasets of import statements from open-source repositories.
#[derive(Parser)]
#[command(name = "importmap", version, about = "Builds datasets of source-code import statements")]
struct Cli {
    /// Configuration file (defaults apply when absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the imports of one source tree and print them as JSON
    Extract {
        /// Root of the source tree
        dir: PathBuf,
        /// Language tag: python, javascript, java, csharp, php or ruby
        #[arg(default_value = "python")]
        language: String,
    },
    /// Discover repositories through the GitHub search API
    Discover {
        /// Dataset base directory
        basedir: PathBuf,
        /// Language to search for, or "all"
        #[arg(default_value = "python")]
        language: String,
        /// Also fetch per-repository language breakdowns
        #[arg(long)]
        full: bool,
        /// Stop after this many repositories
        #[arg(long)]
        max_projects: Option<usize>,
        /// Minimum number of stars
        #[arg(long)]
        min_stars: Option<u64>,
        /// Skip repositories larger than this many kilobytes
        #[arg(long)]
        max_size: Option<u64>,
    },
    /// Generate download scripts for discovered repositories
    CrawlScripts {
        /// Dataset base directory
        basedir: PathBuf,
    },
    /// Assemble extracted import maps into raw archives
    Assemble {
        /// Dataset base directory
        basedir: PathBuf,
    },
    /// Drop sparse and duplicate projects from the raw archives
    Filter {
        /// Dataset base directory
        basedir: PathBuf,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "importmap=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> importmap::errors::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Extract { dir, language } => {
            let imports = Dispatch::from_tag(&language).extract(&dir, &config);
            if let Some(json) = render_json(&imports)? {
                println!("{}", json);
            }
        }
        Commands::Discover {
            basedir,
            language,
            full,
            max_projects,
            min_stars,
            max_size,
        } => {
            let discovery = &mut config.discovery;
            discovery.full |= full;
            if let Some(max_projects) = max_projects {
                discovery.max_projects = max_projects;
            }
            if let Some(min_stars) = min_stars {
                discovery.min_stars = min_stars;
            }
            if let Some(max_size) = max_size {
                discovery.max_size_kb = max_size;
            }
            let credentials = Credentials::load(&config.discovery)?;
            let mut client = GitHubClient::new(credentials, config.discovery.clone());
            let today = chrono::Utc::now().date_naive();
            let repos = discover(&mut client, &basedir, &language, &config.discovery, today)?;
            println!(
                "Discovered {} repositories into {}",
                repos.len(),
                output_path(&basedir, config.discovery.full).display()
            );
        }
        Commands::CrawlScripts { basedir } => {
            let credentials = Credentials::load(&config.discovery)?;
            let repos = load_repos(&output_path(&basedir, false))?;
            let scripts = write_crawl_scripts(&basedir, &repos, credentials.token(), &config)?;
            println!(
                "Wrote {} crawl scripts for {} repositories",
                scripts.len(),
                repos.len()
            );
        }
        Commands::Assemble { basedir } => {
            let summary = assemble_datasets(&basedir)?;
            println!(
                "Assembled {} datasets: {} projects ({} project files skipped)",
                summary.dataset_count, summary.project_count, summary.skipped_files
            );
        }
        Commands::Filter { basedir } => {
            let summary = filter_datasets(&basedir, &config)?;
            println!(
                "Import deduplication: {} -> {} projects",
                summary.raw_projects, summary.dedup_projects
            );
        }
        Commands::InitConfig { path } => {
            save_config(&path, &ImportMapConfig::default())?;
            println!("Wrote default configuration to {}", path.display());
        }
    }
    Ok(())
}
