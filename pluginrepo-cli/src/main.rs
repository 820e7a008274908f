//! pluginrepo CLI - Command-line interface
//!
//! Browse the plugin catalog, install plugins and keep them up to date.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::ConsoleOutput;
use error::CliError;
use runner::{CliRunner, Overrides};

#[derive(Parser)]
#[command(name = "pluginrepo")]
#[command(version = pluginrepo::VERSION)]
#[command(about = "Install and update plugins from a plugin repository", long_about = None)]
struct Cli {
    /// Config file (default: ~/.pluginrepo/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Plugin root directory (default: from config)
    #[arg(long, global = true)]
    plugin_root: Option<PathBuf>,

    /// Repository base URL (default: from config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print the plugin catalog
    Catalog,

    /// List installed plugins and their update status
    List,

    /// Install a plugin from the catalog
    Install {
        /// Internal name of the plugin
        internal_name: String,

        /// Install without enabling the plugin
        #[arg(long)]
        disabled: bool,
    },

    /// Update every installed plugin with a newer catalog version
    Update {
        /// Only report which plugins would be updated
        #[arg(long)]
        dry_run: bool,
    },

    /// Enable an installed plugin
    Enable {
        /// Internal name of the plugin
        internal_name: String,
    },

    /// Disable an installed plugin
    Disable {
        /// Internal name of the plugin
        internal_name: String,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Catalog => "catalog",
            Commands::List => "list",
            Commands::Install { .. } => "install",
            Commands::Update { .. } => "update",
            Commands::Enable { .. } => "enable",
            Commands::Disable { .. } => "disable",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let overrides = Overrides {
        plugin_root: cli.plugin_root,
        base_url: cli.base_url,
    };
    let runner = CliRunner::new(cli.config.as_deref(), &overrides)?;
    runner.log_startup(cli.command.name());

    let repo = runner.open_repository()?;
    let out = ConsoleOutput;

    match cli.command {
        Commands::Catalog => commands::catalog(&runner, &repo, &out),
        Commands::List => commands::list(&runner, &repo, &out),
        Commands::Install {
            internal_name,
            disabled,
        } => commands::install(&runner, &repo, &internal_name, disabled, &out),
        Commands::Update { dry_run } => commands::update(&runner, &repo, dry_run, &out),
        Commands::Enable { internal_name } => {
            commands::set_enabled(&repo, &internal_name, true, &out)
        }
        Commands::Disable { internal_name } => {
            commands::set_enabled(&repo, &internal_name, false, &out)
        }
    }
}
