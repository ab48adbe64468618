//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the configuration file and
//! logging verbosity; the [`Command`] picks the operation.

use std::str::FromStr;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Command-line arguments for the Trellis diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The level named by `--log-level`, case-insensitively.
    pub fn log_filter(&self) -> Option<LevelFilter> {
        LevelFilter::from_str(&self.log_level).ok()
    }
}

/// Operations on diagram files
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a diagram, verify its integrity and print a summary
    Check {
        /// Diagram file in either format
        file: String,
    },

    /// Rewrite a diagram in the current file format
    Convert {
        /// Diagram file in either format
        input: String,

        /// Destination file
        #[arg(short, long)]
        output: String,
    },

    /// Create an empty diagram
    New {
        /// Destination file
        output: String,
    },

    /// Copy the entities whose name contains a substring into a new file
    Extract {
        /// Diagram file in either format
        input: String,

        /// Destination file
        #[arg(short, long)]
        output: String,

        /// Substring to match against entity names
        #[arg(short, long)]
        name: String,
    },
}
