//! pit CLI - content-addressable file vault

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pit::ops::{add, checkout, verify};
use pit::{Error, Repo};

#[derive(Parser)]
#[command(name = "pit")]
#[command(about = "content-addressable file vault")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// initialize a new repository
    Init {
        /// directory to anchor the repository at
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// clone an existing repository, sharing its object store
    Clone {
        /// location of the repository to clone, local path or host:path
        url: String,

        /// directory to anchor the new repository at
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// archive a file or directory
    Add {
        /// file or directory to add
        path: PathBuf,
    },

    /// restore an archived file to its original location
    Checkout {
        /// path of the file to restore
        filename: PathBuf,
    },

    /// check that every index entry has an intact object
    Verify,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> pit::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            let repo = Repo::init(&path)?;
            println!("initialized pit repository at {}", repo.root().display());
        }

        Commands::Clone { url, path } => {
            let repo = Repo::clone_from(&url, &path)?;
            println!("cloned {} into {}", url, repo.root().display());
        }

        Commands::Add { path } => {
            let mut repo = Repo::discover(&cwd()?)?;
            let outcome = add(&mut repo, &path)?;
            println!("added {}, skipped {}", outcome.added, outcome.skipped);
        }

        Commands::Checkout { filename } => {
            let cwd = cwd()?;
            let repo = Repo::discover(&cwd)?;

            let target = if filename.is_absolute() {
                filename
            } else {
                cwd.join(filename)
            };
            let restored = checkout(&repo, &target)?;
            println!("restored {}", restored.display());
        }

        Commands::Verify => {
            let repo = Repo::discover(&cwd()?)?;
            let report = verify(&repo)?;

            println!("entries checked: {}", report.entries_checked);

            if !report.missing_objects.is_empty() {
                println!("\nmissing objects:");
                for entry in &report.missing_objects {
                    println!("  {} {}", entry.hash, entry.path);
                }
            }

            if !report.writable_objects.is_empty() {
                println!("\nwritable objects:");
                for entry in &report.writable_objects {
                    println!("  {} {}", entry.hash, entry.path);
                }
            }

            if report.is_ok() {
                println!("\nvault is healthy");
            } else {
                return Err(Error::Unhealthy(
                    report.missing_objects.len() + report.writable_objects.len(),
                ));
            }
        }
    }

    Ok(())
}

fn cwd() -> pit::Result<PathBuf> {
    let dir = std::env::current_dir().map_err(|source| Error::Io {
        path: PathBuf::from("."),
        source,
    })?;
    dir.canonicalize().map_err(|source| Error::Io {
        path: dir,
        source,
    })
}
