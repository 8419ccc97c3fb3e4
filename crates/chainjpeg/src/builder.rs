//! Sequential construction of chain parts.
//!
//! Each branch part runs an explicit state machine:
//!
//! ```text
//! Pending ──prepare + oracle──> OracleCalled ──ok──────────> Succeeded
//!    ^                              │
//!    │                              └─recoverable error──> Retrying
//!    └──────────────policy allows another attempt──────────────┘
//! ```
//!
//! Every attempt starts from a wiped part directory and rebuilds the oracle
//! input from scratch. Unrecoverable oracle errors and exhausted retry
//! policies leave the loop as errors tagged with the part and stage.

use crate::error::{ChainError, ConfigError, OracleError, Result};
use crate::fsutil;
use crate::layout::{Artifact, Layout};
use crate::oracle::{CollisionOracle, CollisionPair};
use crate::part::{
    ChainPart, FINAL_PART, PartOutcome, PreparedPart, Stage, check_branch_index, final_blob,
};
use crate::segments::BodySource;
use std::num::NonZeroU32;
use tracing::{debug, info, warn};

/// How often a part may call the oracle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: Option<NonZeroU32>,
}

impl RetryPolicy {
    /// Retry until the oracle succeeds
    pub const fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    /// Give up after `max_attempts` oracle calls
    pub const fn limited(max_attempts: NonZeroU32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }

    /// Attempt limit, if any
    pub const fn max_attempts(&self) -> Option<NonZeroU32> {
        self.max_attempts
    }

    /// Whether another attempt may follow `attempts` failed ones
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max.get())
    }
}

/// Progress of one branch part
#[derive(Debug)]
enum PartState {
    Pending {
        attempt: u32,
    },
    OracleCalled {
        attempt: u32,
        prepared: PreparedPart,
        result: std::result::Result<CollisionPair, OracleError>,
    },
    Retrying {
        attempt: u32,
        reason: OracleError,
    },
    Succeeded(Box<ChainPart>),
}

/// Builds parts in order, persisting every artifact under a [`Layout`]
pub struct ChainBuilder<O, S> {
    layout: Layout,
    oracle: O,
    source: S,
    policy: RetryPolicy,
    fill_growth: Option<usize>,
}

impl<O, S> ChainBuilder<O, S>
where
    O: CollisionOracle,
    S: BodySource,
{
    /// Builder with an unbounded retry policy
    pub fn new(layout: Layout, oracle: O, source: S) -> Self {
        Self {
            layout,
            oracle,
            source,
            policy: RetryPolicy::default(),
            fill_growth: None,
        }
    }

    /// Replace the retry policy
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Layout artifacts are written under
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Check inputs of parts `from..=to` before any work starts
    pub fn preflight(&self, from: usize, to: usize) -> Result<()> {
        if from == 0 || from > to || to > FINAL_PART {
            return Err(ConfigError::InvalidPartRange { from, to }.into());
        }

        if from == 1 {
            fsutil::require(&self.layout.shared_prefix())?;
            fsutil::require(&self.layout.original_dir(0))?;
        } else {
            fsutil::require(&self.layout.artifact(from - 1, Artifact::ShortVariant))?;
        }
        for part in from..=to {
            fsutil::require(&self.layout.original_dir(part - 1))?;
        }
        Ok(())
    }

    /// Build parts `from..=to`, each fed by the previous part's short branch
    pub async fn run(&mut self, from: usize, to: usize) -> Result<Vec<PartOutcome>> {
        self.preflight(from, to)?;
        if from > 1 && self.fill_growth.is_none() {
            self.fill_growth = self.recorded_fill_growth(from - 1)?;
        }

        let mut outcomes = Vec::with_capacity(to - from + 1);
        for part in from..=to {
            let starting_prefix = self.starting_prefix(part)?;
            let outcome = if part == FINAL_PART {
                PartOutcome::Final(self.build_final_part(part, starting_prefix)?)
            } else {
                PartOutcome::from(&self.build_part(part, starting_prefix).await?)
            };
            outcomes.push(outcome);
        }
        info!(from, to, "Parts complete");
        Ok(outcomes)
    }

    /// Prefix part `part` extends
    ///
    /// Part 1 starts from the shared prefix followed by the leading segments
    /// of source image 0; later parts start from the persisted short branch
    /// of their predecessor.
    pub fn starting_prefix(&self, part: usize) -> Result<Vec<u8>> {
        let load = || -> Result<Vec<u8>> {
            match part {
                0 => Err(ChainError::InvalidPart(part)),
                1 => {
                    let mut prefix = fsutil::read(&self.layout.shared_prefix())?;
                    prefix.extend(self.source.leading_segments(0)?);
                    Ok(prefix)
                }
                n if n <= FINAL_PART => {
                    fsutil::read(&self.layout.artifact(n - 1, Artifact::ShortVariant))
                }
                n => Err(ChainError::InvalidPart(n)),
            }
        };
        load().map_err(|e| e.at(part, Stage::StartingPrefix))
    }

    /// Build branch part `part` (1..=15) on top of `starting_prefix`
    pub async fn build_part(&mut self, part: usize, starting_prefix: Vec<u8>) -> Result<ChainPart> {
        check_branch_index(part).map_err(|e| e.at(part, Stage::StartingPrefix))?;
        info!(part, prefix_len = starting_prefix.len(), "Building part");

        let chain_part = self.drive(part, &starting_prefix).await?;
        self.check_fill(&chain_part)?;
        self.persist(&chain_part)?;

        info!(
            part,
            short_len = chain_part.short_variant.len(),
            long_len = chain_part.long_variant.len(),
            "Part complete"
        );
        Ok(chain_part)
    }

    /// Build the terminal part: `starting_prefix ++ image_body`
    pub fn build_final_part(&self, part: usize, starting_prefix: Vec<u8>) -> Result<Vec<u8>> {
        if part != FINAL_PART {
            return Err(ChainError::InvalidPart(part).at(part, Stage::Final));
        }
        info!(part, prefix_len = starting_prefix.len(), "Building final part");

        self.reset_part_dir(part)?;
        self.write_artifact(part, Artifact::StartingPrefix, &starting_prefix)?;
        let image_body = self.load_image_body(part)?;

        let blob = final_blob(&starting_prefix, &image_body);
        self.write_artifact(part, Artifact::Final, &blob)?;
        info!(part, final_len = blob.len(), "Final part complete");
        Ok(blob)
    }

    async fn drive(&self, part: usize, starting_prefix: &[u8]) -> Result<ChainPart> {
        let workdir = self.layout.part_dir(part);
        let mut state = PartState::Pending { attempt: 1 };
        loop {
            state = match state {
                PartState::Pending { attempt } => {
                    let prepared = self.prepare(part, starting_prefix)?;
                    debug!(
                        part,
                        attempt,
                        prefix_len = prepared.collision_prefix.len(),
                        "Calling oracle"
                    );
                    let result = self
                        .oracle
                        .collide(&workdir, &prepared.collision_prefix)
                        .await;
                    PartState::OracleCalled {
                        attempt,
                        prepared,
                        result,
                    }
                }
                PartState::OracleCalled {
                    attempt,
                    prepared,
                    result,
                } => match result {
                    Ok(pair) => {
                        self.write_artifact(part, Artifact::RawHalfA, pair.a())?;
                        self.write_artifact(part, Artifact::RawHalfB, pair.b())?;
                        let body = self.load_image_body(part)?;
                        PartState::Succeeded(Box::new(prepared.complete(pair, body)?))
                    }
                    Err(reason) if reason.is_recoverable() => {
                        PartState::Retrying { attempt, reason }
                    }
                    Err(e) => return Err(ChainError::from(e).at(part, Stage::Oracle)),
                },
                PartState::Retrying { attempt, reason } => {
                    if !self.policy.allows_retry(attempt) {
                        return Err(ChainError::RetriesExhausted {
                            attempts: attempt,
                            last: reason,
                        }
                        .at(part, Stage::Oracle));
                    }
                    warn!(part, attempt, error = %reason, "Oracle attempt failed, retrying");
                    PartState::Pending {
                        attempt: attempt + 1,
                    }
                }
                PartState::Succeeded(chain_part) => {
                    debug!(part, "Oracle succeeded");
                    return Ok(*chain_part);
                }
            };
        }
    }

    /// Wipe the part directory and derive a fresh oracle input
    fn prepare(&self, part: usize, starting_prefix: &[u8]) -> Result<PreparedPart> {
        self.reset_part_dir(part)?;
        let prepared = PreparedPart::new(part, starting_prefix.to_vec())?;
        self.write_artifact(part, Artifact::StartingPrefix, &prepared.starting_prefix)?;
        self.write_artifact(part, Artifact::PaddingComment, &prepared.padding_comment)?;
        self.write_artifact(part, Artifact::CollisionPrefix, &prepared.collision_prefix)?;
        Ok(prepared)
    }

    /// Body of the source image hidden by `part`, persisted with its artifacts
    fn load_image_body(&self, part: usize) -> Result<Vec<u8>> {
        let artifact = self.layout.artifact(part, Artifact::ImageBody);
        debug!(part, artifact = Artifact::ImageBody.file_name(), "Assembling image body");
        self.source
            .persist_image_body(part - 1, &artifact)
            .map_err(|e| e.at(part, Stage::ImageBody))
    }

    fn check_fill(&mut self, chain_part: &ChainPart) -> Result<()> {
        let actual = chain_part.fill_growth();
        match self.fill_growth {
            Some(expected) if expected != actual => Err(ChainError::FillDrift { expected, actual }
                .at(chain_part.index, Stage::HalfFill)),
            Some(_) => Ok(()),
            None => {
                debug!(fill_growth = actual, "Recorded half fill growth");
                self.fill_growth = Some(actual);
                Ok(())
            }
        }
    }

    /// Fill growth of an already persisted part, if its artifacts exist
    fn recorded_fill_growth(&self, part: usize) -> Result<Option<usize>> {
        let filled = self.layout.artifact(part, Artifact::FilledHalfA);
        let prefix = self.layout.artifact(part, Artifact::CollisionPrefix);
        if !filled.exists() || !prefix.exists() {
            return Ok(None);
        }
        let filled_len = fsutil::file_len(&filled)?;
        let prefix_len = fsutil::file_len(&prefix)?;
        Ok(filled_len.checked_sub(prefix_len))
    }

    fn persist(&self, chain_part: &ChainPart) -> Result<()> {
        let part = chain_part.index;
        for (artifact, data) in [
            (Artifact::FilledHalfA, &chain_part.filled_a),
            (Artifact::FilledHalfB, &chain_part.filled_b),
            (Artifact::BodyComment, &chain_part.body_comment),
            (Artifact::ShortVariant, &chain_part.short_variant),
            (Artifact::LongVariant, &chain_part.long_variant),
        ] {
            self.write_artifact(part, artifact, data)?;
        }
        Ok(())
    }

    fn reset_part_dir(&self, part: usize) -> Result<()> {
        let dir = self.layout.part_dir(part);
        fsutil::remove_dir_all(&dir)
            .and_then(|()| fsutil::create_dir_all(&dir))
            .map_err(|e| e.at(part, Stage::StartingPrefix))
    }

    fn write_artifact(&self, part: usize, artifact: Artifact, data: &[u8]) -> Result<()> {
        let path = self.layout.artifact(part, artifact);
        debug!(part, artifact = artifact.file_name(), size = data.len(), "Writing artifact");
        fsutil::write(&path, data).map_err(|e| e.at(part, artifact.stage()))
    }
}
