use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use updater::repository::RepositoryClient;
use updater::updater::{
    UpdateOptions, Updater, UpdaterError, UpgradeOptions, UpgradeOutcome,
};

#[derive(Parser)]
#[command(name = "updater")]
#[command(version, about = "Applies package releases to an installation one version at a time")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initializes the installation
    Init {
        /// The working directory
        working_directory: Option<PathBuf>,
        /// The current version of the installation
        #[arg(long)]
        version: Option<String>,
    },
    /// Updates the installation
    Update {
        /// The working directory
        working_directory: Option<PathBuf>,
        /// Downloads and processes all available updates
        #[arg(long)]
        all: bool,
        /// Updates from the development branch
        #[arg(long)]
        dev: bool,
        /// Never ask for input
        #[arg(long = "no-interaction", short = 'n')]
        no_interaction: bool,
    },
    /// Upgrades to the next major release
    Upgrade {
        /// The working directory
        working_directory: Option<PathBuf>,
        /// Upgrades to a specific version
        #[arg(long, short = 'v')]
        version: Option<String>,
        /// Upgrades to the development branch
        #[arg(long)]
        dev: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = updater::logging::init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(run(cli.command)) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!(category = e.category(), "{}", e);
            eprintln!("{}: {}", e.category(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn open(working_directory: Option<PathBuf>) -> Result<Updater<RepositoryClient>, UpdaterError> {
    let dir = working_directory.unwrap_or_else(|| PathBuf::from("."));
    Updater::<RepositoryClient>::open(dir)
}

async fn run(command: Command) -> Result<(), UpdaterError> {
    match command {
        Command::Init {
            working_directory,
            version,
        } => {
            let mut updater = open(working_directory)?;
            updater.init(version.as_deref()).await?;
            println!("Updater initialized");
        }
        Command::Update {
            working_directory,
            all,
            dev,
            no_interaction,
        } => {
            let mut updater = open(working_directory)?.interactive(!no_interaction);
            let report = updater.update(&UpdateOptions { all, dev }).await?;
            if report.processed == 0 {
                println!("No updates found");
            } else {
                println!("Processed {} updates", report.processed);
            }
        }
        Command::Upgrade {
            working_directory,
            version,
            dev,
        } => {
            let mut updater = open(working_directory)?;
            match updater.upgrade(&UpgradeOptions { version, dev }).await? {
                UpgradeOutcome::UpdatesPending => {
                    println!("There are updates available");
                    println!("Please update your system first before upgrading");
                }
                UpgradeOutcome::NoUpgrades => println!("No upgrades found"),
                UpgradeOutcome::Upgraded(version) => {
                    println!("Application upgraded to {}", version)
                }
            }
        }
    }

    Ok(())
}
