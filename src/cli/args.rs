use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blob-sql-backup", version)]
#[command(about = "Export MySQL databases as SQL dumps to blob storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Configuration file (defaults to ~/.blob_sql_backup/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Serve the HTTP trigger and run the daily and monthly timers until Ctrl+C
    Serve {
        /// Port override for the HTTP trigger
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one backup immediately and exit
    Backup {
        #[arg(value_enum, default_value_t = Target::Active)]
        target: Target,
    },

    /// List the databases the all-databases backup would export
    List,

    /// Print the resolved configuration
    Config {
        /// Also write it to the configuration file
        #[arg(long, default_value_t = false)]
        write: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// The configured active databases
    Active,
    /// Every database on the server
    All,
}
