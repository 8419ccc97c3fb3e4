//! Command dispatch.

use crate::builder::ChainBuilder;
use crate::config::{ChainConfig, Command, PartsArgs};
use crate::digest::{DigestReport, check_structure};
use crate::error::{ChainError, Result};
use crate::fsutil;
use crate::layout::Layout;
use crate::oracle::ProcessOracle;
use crate::segments::SegmentAssembler;
use crate::split::split_file;
use crate::variants::{OUTPUT_COUNT, VariantAssembler};
use tracing::{info, warn};

/// Runs one configured command
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ChainConfig,
    layout: Layout,
}

impl Pipeline {
    /// Pipeline for a validated configuration
    pub fn new(config: ChainConfig) -> Self {
        let layout = config.layout();
        Self { config, layout }
    }

    /// Layout the pipeline works in
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Run the configured command
    pub async fn run(&self) -> Result<()> {
        match &self.config.command {
            Command::Split { input, output } => {
                split_file(input, output)?;
                Ok(())
            }
            Command::Parts(args) => self.parts(args).await,
            Command::Jpegs => {
                VariantAssembler::new(self.layout.clone()).write_all()?;
                Ok(())
            }
            Command::Verify => self.verify(),
        }
    }

    async fn parts(&self, args: &PartsArgs) -> Result<()> {
        args.validate()?;
        let oracle = ProcessOracle::new(&args.oracle)
            .with_args(args.oracle_args.clone())
            .with_timeout(args.oracle_timeout());
        let source = SegmentAssembler::new(self.layout.originals_dir());

        info!(
            nibble = self.layout.nibble(),
            from = args.part_from,
            to = args.part_to,
            oracle = %args.oracle.display(),
            "Building parts"
        );
        let mut builder = ChainBuilder::new(self.layout.clone(), oracle, source)
            .with_retry_policy(args.retry_policy());
        builder.run(args.part_from, args.part_to).await?;
        Ok(())
    }

    fn verify(&self) -> Result<()> {
        let shared_prefix = fsutil::read(&self.layout.shared_prefix())?;
        let outputs = (0..OUTPUT_COUNT)
            .map(|digit| fsutil::read(&self.layout.output_jpeg(digit)))
            .collect::<Result<Vec<_>>>()?;

        check_structure(&outputs)?;
        let report = DigestReport::compute(&shared_prefix, &outputs);
        for (digit, digest) in report.digests().iter().enumerate() {
            info!(digit = %format!("{digit:x}"), md5 = %digest, "Output digest");
        }

        if report.all_equal() {
            info!("All outputs share one digest");
            Ok(())
        } else {
            let digits = report.mismatched();
            warn!(?digits, "Output digests differ");
            Err(ChainError::DigestMismatch { digits })
        }
    }
}
