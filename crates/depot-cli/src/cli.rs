//! CLI argument definitions for depot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depot",
    version,
    about = "Resolve artifact versions and Maven-style dependency graphs",
    long_about = "depot resolves versioned artifacts from directory repositories and Maven \
                  remotes, and computes transitive dependency sets for a descriptor."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this depot.toml instead of searching upwards from the current directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the transitive dependencies of a descriptor (pom.xml)
    Resolve {
        /// Descriptor file
        descriptor: PathBuf,
        /// Dependency scope to follow
        #[arg(short, long, default_value = "compile")]
        scope: String,
        /// Print the resolved set as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate (or reuse) the library listing for a coordinate
    Library {
        /// Coordinate as group:artifact:version
        coordinate: String,
        /// Dependency scope to follow
        #[arg(short, long, default_value = "compile")]
        scope: String,
    },

    /// Query or update a configured repository
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum RepoAction {
    /// List artifact names
    List {
        /// Glob pattern to filter names
        pattern: Option<String>,
        /// Repository name from depot.toml, or "maven"
        #[arg(long)]
        repo: Option<String>,
    },
    /// List available versions of an artifact
    Versions {
        name: String,
        #[arg(long)]
        repo: Option<String>,
    },
    /// Print the location of the artifact that best matches a constraint
    Get {
        name: String,
        /// Version, range such as [1.0,2.0), or "latest"
        #[arg(long)]
        version: Option<String>,
        /// highest, lowest or exact
        #[arg(long, default_value = "highest")]
        strategy: String,
        #[arg(long)]
        repo: Option<String>,
    },
    /// Store a file as an artifact version
    Put {
        name: String,
        version: String,
        file: PathBuf,
        #[arg(long)]
        repo: Option<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
