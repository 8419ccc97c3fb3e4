//! Command-line configuration.
//!
//! Configuration can be provided via:
//! - CLI arguments (`--root`, `--color`, `--nibble`, per-command flags)
//! - Environment variables (`CHAINJPEG_ROOT`, `CHAINJPEG_COLOR`, ...)
//! - Default values
//!
//! # Example
//!
//! ```no_run
//! use chainjpeg::ChainConfig;
//!
//! let config = ChainConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Working under {}", config.layout().color_dir().display());
//! ```

use crate::builder::RetryPolicy;
use crate::error::ConfigError;
use crate::layout::Layout;
use crate::part::FINAL_PART;
use clap::{Args, Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

/// Chain builder configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chainjpeg",
    about = "Build families of JPEG images that share an MD5 digest",
    version
)]
pub struct ChainConfig {
    /// Project root holding the `collisions/` tree
    #[arg(long, global = true, env = "CHAINJPEG_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Colour scheme directory under `collisions/`
    #[arg(
        long,
        global = true,
        env = "CHAINJPEG_COLOR",
        default_value = "white on blue"
    )]
    pub color: String,

    /// Nibble the chain is built for
    #[arg(long, global = true, env = "CHAINJPEG_NIBBLE", default_value_t = 1)]
    pub nibble: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline commands
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Split a JPEG into one file per segment
    Split {
        /// Image to split
        #[arg(long)]
        input: PathBuf,
        /// Directory receiving the segment files
        #[arg(long)]
        output: PathBuf,
    },
    /// Build chain parts
    Parts(PartsArgs),
    /// Assemble the sixteen output images
    Jpegs,
    /// Check output structure and digests
    Verify,
}

/// Arguments of the `parts` command
#[derive(Debug, Clone, Args)]
pub struct PartsArgs {
    /// First part to build
    #[arg(long, default_value_t = 1)]
    pub part_from: usize,

    /// Last part to build
    #[arg(long, default_value_t = FINAL_PART)]
    pub part_to: usize,

    /// Collision program, run as `<oracle> [oracle-arg..] prefix`
    #[arg(long, env = "CHAINJPEG_ORACLE", default_value = "poc_no.sh")]
    pub oracle: PathBuf,

    /// Extra argument passed to the oracle before the prefix file
    #[arg(long = "oracle-arg")]
    pub oracle_args: Vec<String>,

    /// Wall-clock budget of one oracle run in seconds
    #[arg(long, env = "CHAINJPEG_ORACLE_TIMEOUT", default_value_t = 900)]
    pub oracle_timeout_secs: u64,

    /// Give up on a part after this many oracle calls (default: never)
    #[arg(long)]
    pub max_attempts: Option<NonZeroU32>,
}

impl PartsArgs {
    /// Oracle budget
    pub const fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Retry policy from `--max-attempts`
    pub fn retry_policy(&self) -> RetryPolicy {
        self.max_attempts
            .map_or_else(RetryPolicy::unbounded, RetryPolicy::limited)
    }

    /// Validate part range and budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (from, to) = (self.part_from, self.part_to);
        if from == 0 || from > to || to > FINAL_PART {
            return Err(ConfigError::InvalidPartRange { from, to });
        }
        if self.oracle_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

impl ChainConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Directory layout for the configured colour and nibble
    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(&self.root, &self.color, self.nibble)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The root directory doesn't exist
    /// - The part range is empty or outside 1..=16
    /// - The oracle timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.is_dir() {
            return Err(ConfigError::MissingRequired(format!(
                "root directory not found: {}",
                self.root.display()
            )));
        }
        match &self.command {
            Command::Split { input, .. } if !input.is_file() => Err(
                ConfigError::MissingRequired(format!("input image not found: {}", input.display())),
            ),
            Command::Parts(args) => args.validate(),
            _ => Ok(()),
        }
    }
}
