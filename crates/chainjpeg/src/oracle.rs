//! Collision oracle capability.
//!
//! The oracle receives a prefix whose length is 12 mod 64 and answers with
//! two equal-length continuations of it. [`ProcessOracle`] drives an external
//! program through files in a working directory; tests use in-process stubs.

use crate::error::OracleError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// File the prefix is written to, passed as the last program argument
pub const PREFIX_FILE: &str = "prefix";

/// Files the program writes its two halves to
pub const OUTPUT_FILES: [&str; 2] = ["collision1.bin", "collision2.bin"];

/// Scratch entries the program leaves behind
const SCRATCH_ENTRIES: [&str; 4] = [PREFIX_FILE, "data", "logs", "upper_1_640000"];

/// Default wall-clock budget of one oracle run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Two equal-length oracle outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionPair {
    a: Vec<u8>,
    b: Vec<u8>,
}

impl CollisionPair {
    /// Pair two halves, rejecting unequal lengths
    pub fn new(a: Vec<u8>, b: Vec<u8>) -> Result<Self, OracleError> {
        if a.len() != b.len() {
            return Err(OracleError::UnequalHalves {
                a: a.len(),
                b: b.len(),
            });
        }
        Ok(Self { a, b })
    }

    /// Length of each half
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Whether the halves are empty
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// First half
    pub fn a(&self) -> &[u8] {
        &self.a
    }

    /// Second half
    pub fn b(&self) -> &[u8] {
        &self.b
    }

    /// Consume the pair
    pub fn into_halves(self) -> (Vec<u8>, Vec<u8>) {
        (self.a, self.b)
    }
}

/// Produces colliding continuations of an aligned prefix
#[async_trait]
pub trait CollisionOracle: Send + Sync {
    /// Extend `prefix` into two colliding halves
    ///
    /// `workdir` belongs to the calling part and may be used for scratch
    /// files. It is wiped before every retry.
    async fn collide(&self, workdir: &Path, prefix: &[u8]) -> Result<CollisionPair, OracleError>;
}

/// Oracle backed by an external program
///
/// Runs `<program> [args..] prefix` in the working directory and reads
/// [`OUTPUT_FILES`] back. The program gets its own process group so the
/// whole group can be killed when the budget runs out.
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessOracle {
    /// Oracle running `program` with the default budget
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Arguments placed before the prefix file name
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Wall-clock budget of one run
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured budget
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, workdir: &Path) -> Result<(), OracleError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(PREFIX_FILE)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| OracleError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        debug!(program = %self.program.display(), pid = ?child.id(), "Oracle started");

        if let Ok(status) = tokio::time::timeout(self.timeout, child.wait()).await {
            let status = status?;
            if status.success() {
                Ok(())
            } else {
                Err(OracleError::Failed(status.to_string()))
            }
        } else {
            warn!(budget = ?self.timeout, "Oracle timed out, killing its process group");
            terminate(&mut child).await;
            Err(OracleError::Timeout {
                budget: self.timeout,
            })
        }
    }
}

#[async_trait]
impl CollisionOracle for ProcessOracle {
    async fn collide(&self, workdir: &Path, prefix: &[u8]) -> Result<CollisionPair, OracleError> {
        tokio::fs::create_dir_all(workdir).await?;
        tokio::fs::write(workdir.join(PREFIX_FILE), prefix).await?;

        let result = match self.run(workdir).await {
            Ok(()) => read_outputs(workdir).await,
            Err(e) => Err(e),
        };
        remove_scratch(workdir).await;
        result
    }
}

async fn read_outputs(workdir: &Path) -> Result<CollisionPair, OracleError> {
    let [first, second] = OUTPUT_FILES;
    let a = read_output(&workdir.join(first)).await?;
    let b = read_output(&workdir.join(second)).await?;
    CollisionPair::new(a, b)
}

async fn read_output(path: &Path) -> Result<Vec<u8>, OracleError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(OracleError::MissingOutput {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

async fn remove_scratch(workdir: &Path) {
    for name in SCRATCH_ENTRIES.iter().chain(OUTPUT_FILES.iter()) {
        let path = workdir.join(name);
        let removed = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&path).await,
            Ok(_) => tokio::fs::remove_file(&path).await,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => Err(e),
        };
        if let Err(e) = removed {
            warn!(path = %path.display(), error = %e, "Failed to remove oracle scratch entry");
        }
    }
}

/// Kill the child's process group, then the child itself, and reap it
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    kill_process_group(child);

    if let Err(e) = child.kill().await {
        debug!(error = %e, "Oracle already gone");
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_process_group(child: &Child) {
    let Some(pgid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal. The child was spawned with
    // process_group(0), so its pid is the id of a group holding only the
    // oracle and its descendants.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let err = std::io::Error::last_os_error();
        debug!(pgid, error = %err, "killpg failed");
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_pair_rejects_unequal_halves() {
        let err = CollisionPair::new(vec![0; 3], vec![0; 4]).unwrap_err();
        assert!(matches!(err, OracleError::UnequalHalves { a: 3, b: 4 }));
    }

    #[test]
    fn test_pair_accessors() {
        let pair = CollisionPair::new(vec![1, 2], vec![3, 4]).unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair.a(), &[1, 2]);
        assert_eq!(pair.b(), &[3, 4]);
        assert_eq!(pair.into_halves(), (vec![1, 2], vec![3, 4]));
    }

    #[cfg(unix)]
    fn script_oracle(dir: &TempDir, body: &str) -> ProcessOracle {
        let script = dir.path().join("oracle.sh");
        std::fs::write(&script, body).unwrap();
        ProcessOracle::new("sh").with_args(vec![script.display().to_string()])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_oracle_success() {
        let dir = TempDir::new().unwrap();
        let workdir = dir.path().join("part-01");
        let oracle = script_oracle(
            &dir,
            "cat \"$1\" > collision1.bin; printf x >> collision1.bin\n\
             cat \"$1\" > collision2.bin; printf y >> collision2.bin\n\
             mkdir -p logs data; touch upper_1_640000\n",
        );

        let pair = oracle.collide(&workdir, b"prefix-bytes").await.unwrap();
        assert_eq!(pair.a(), b"prefix-bytesx");
        assert_eq!(pair.b(), b"prefix-bytesy");

        for name in SCRATCH_ENTRIES.iter().chain(OUTPUT_FILES.iter()) {
            assert!(!workdir.join(name).exists(), "{name} left behind");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_oracle_nonzero_exit_is_recoverable() {
        let dir = TempDir::new().unwrap();
        let oracle = script_oracle(&dir, "exit 3\n");
        let err = oracle
            .collide(&dir.path().join("work"), b"p")
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Failed(_)));
        assert!(err.is_recoverable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_oracle_missing_output() {
        let dir = TempDir::new().unwrap();
        let oracle = script_oracle(&dir, "cat \"$1\" > collision1.bin\n");
        let err = oracle
            .collide(&dir.path().join("work"), b"p")
            .await
            .unwrap_err();
        match err {
            OracleError::MissingOutput { path } => assert!(path.ends_with("collision2.bin")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_oracle_timeout() {
        let dir = TempDir::new().unwrap();
        let oracle = script_oracle(&dir, "sleep 5 & sleep 5\n")
            .with_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let err = oracle
            .collide(&dir.path().join("work"), b"p")
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Timeout { .. }));
        assert!(err.is_recoverable());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_process_oracle_spawn_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let oracle = ProcessOracle::new(dir.path().join("no-such-oracle"));
        let err = oracle
            .collide(&dir.path().join("work"), b"p")
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Spawn { .. }));
        assert!(!err.is_recoverable());
    }
}
