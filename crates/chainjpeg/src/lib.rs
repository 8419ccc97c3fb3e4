//! JPEG multicollision chain builder.
//!
//! Builds sixteen JPEG images that look different but can all be made to
//! share one MD5 digest. The images are chained: each of sixteen parts pads
//! its prefix to a fixed block offset, asks a collision oracle for two
//! colliding continuations, and hides one source image behind a comment that
//! only one of the two continuations skips.
//!
//! # Architecture
//!
//! - `padding`: block alignment arithmetic and the fixed chain constants
//! - `part`: per-part data and stages
//! - `oracle`: collision oracle capability and the process-backed oracle
//! - `builder`: sequential part construction with a retry state machine
//! - `segments` / `split`: per-segment storage of source images
//! - `variants`: stitching the sixteen outputs
//! - `digest`: output verification
//! - `layout` / `config` / `pipeline`: on-disk layout, CLI and dispatch
//!
//! JFIF parsing lives in the `chainjpeg-formats` crate.
//!
//! # Example
//!
//! ```no_run
//! use chainjpeg::{ChainConfig, Pipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = ChainConfig::from_args();
//!     config.validate()?;
//!
//!     Pipeline::new(config).run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod builder;
pub mod config;
pub mod digest;
pub mod error;
pub mod fsutil;
pub mod layout;
pub mod oracle;
pub mod padding;
pub mod part;
pub mod pipeline;
pub mod segments;
pub mod split;
pub mod variants;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for public API
pub use builder::{ChainBuilder, RetryPolicy};
pub use config::{ChainConfig, Command, PartsArgs};
pub use digest::{DigestReport, check_structure};
pub use error::{ChainError, ConfigError, OracleError, Result};
pub use layout::{Artifact, Layout};
pub use oracle::{CollisionOracle, CollisionPair, ProcessOracle};
pub use part::{ChainPart, FINAL_PART, PART_COUNT, PartOutcome, PreparedPart, Stage};
pub use pipeline::Pipeline;
pub use segments::{BodySource, SegmentAssembler};
pub use split::{split_file, split_jpeg};
pub use variants::{OUTPUT_COUNT, VariantAssembler, assemble_outputs};
