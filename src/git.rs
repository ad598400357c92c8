//! Working-copy synchronization through the git executable
//!
//! Every project gets a clone under the configured clone root, named after
//! the basename of its clone URL. A missing clone is created with
//! `git clone`; an existing one is brought forward with `git checkout` and
//! `git pull`. LFS smudging is disabled for every invocation so the working
//! copy keeps pointer stubs instead of hydrated blobs.
//!
//! Clone and commit resolution failures abort the pass, as does an existing
//! clone whose `origin` is a different repository. Checkout and pull
//! failures are logged and the pass continues against whatever is already
//! checked out.

use crate::error::{GitError, SyncError};
use crate::store::Project;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info, instrument, warn};

/// Git invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Git executable to invoke
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Directory holding one working copy per project
    #[serde(default = "default_clone_root")]
    pub clone_root: PathBuf,

    /// Branch to check out before pulling; the remote HEAD when unset
    #[serde(default)]
    pub default_branch: Option<String>,

    /// Set GIT_LFS_SKIP_SMUDGE=1 on every invocation
    #[serde(default = "default_true")]
    pub skip_smudge: bool,

    /// Upper bound for a single git invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_executable() -> PathBuf {
    PathBuf::from("git")
}

fn default_clone_root() -> PathBuf {
    PathBuf::from("tmp/git_repos")
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            clone_root: default_clone_root(),
            default_branch: None,
            skip_smudge: default_true(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// A working copy brought up to date for one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub path: PathBuf,
    pub commit: String,
    /// Non-fatal checkout/pull failures
    pub warnings: Vec<String>,
}

/// Source of up-to-date working copies
#[async_trait]
pub trait WorkingCopy: Send + Sync {
    /// Directory the project's working copy lives in, without touching it
    fn working_copy_path(&self, project: &Project) -> Result<PathBuf, SyncError>;

    async fn ensure_up_to_date(&self, project: &Project) -> Result<Checkout, SyncError>;
}

/// Directory name for a project's working copy, taken from the clone URL.
///
/// Handles URLs (`https://host/org/repo.git`), scp-style remotes
/// (`git@host:repo.git`) and plain paths.
pub fn clone_dir_name(clone_url: &str) -> Result<String, GitError> {
    let without_suffix = clone_url.trim().split(['?', '#']).next().unwrap_or("");
    let name = without_suffix
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or("");

    if name.is_empty() || name == "." || name == ".." {
        return Err(GitError::InvalidCloneUrl(clone_url.to_string()));
    }
    Ok(name.to_string())
}

fn same_remote(a: &str, b: &str) -> bool {
    a.trim().trim_end_matches('/') == b.trim().trim_end_matches('/')
}

/// [`WorkingCopy`] backed by the git executable
pub struct RepoSync {
    config: GitConfig,
}

impl RepoSync {
    pub fn new(config: GitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GitConfig {
        &self.config
    }

    /// Deterministic working-copy location for a project
    pub fn clone_path(&self, project: &Project) -> Result<PathBuf, GitError> {
        Ok(self.config.clone_root.join(clone_dir_name(&project.clone_url)?))
    }

    /// Run git with the configured environment and timeout, returning stdout.
    async fn run_git<I, S>(&self, cwd: Option<&Path>, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let command = std::iter::once("git".to_string())
            .chain(args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(&self.config.executable);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        if self.config.skip_smudge {
            cmd.env("GIT_LFS_SKIP_SMUDGE", "1");
        }
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(%command, "Running git");
        let child = cmd.spawn().map_err(|source| GitError::Spawn {
            command: command.clone(),
            source,
        })?;

        let secs = self.config.timeout_secs;
        // Dropping the timed-out future drops the child, which kills it
        let output = match tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output())
            .await
        {
            Ok(result) => result.map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => return Err(GitError::Timeout { command, secs }),
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(GitError::Failed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    async fn clone_into(&self, clone_url: &str, dest: &Path) -> Result<(), GitError> {
        std::fs::create_dir_all(&self.config.clone_root).map_err(|source| GitError::Spawn {
            command: format!("mkdir {}", self.config.clone_root.display()),
            source,
        })?;
        self.run_git(None, [OsStr::new("clone"), OsStr::new(clone_url), dest.as_os_str()])
            .await?;
        Ok(())
    }

    async fn resolve_branch(&self, dir: &Path) -> Option<String> {
        if let Some(branch) = &self.config.default_branch {
            return Some(branch.clone());
        }
        match self
            .run_git(
                Some(dir),
                ["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
            )
            .await
        {
            Ok(out) => {
                let remote_head = out.trim();
                let branch = remote_head.strip_prefix("origin/").unwrap_or(remote_head);
                (!branch.is_empty()).then(|| branch.to_string())
            }
            Err(e) => {
                debug!(error = %e, "Remote HEAD not resolvable");
                None
            }
        }
    }

    /// Fail unless the clone in `dir` fetches from `clone_url`.
    async fn verify_origin(&self, dir: &Path, clone_url: &str) -> Result<(), GitError> {
        let found = match self
            .run_git(Some(dir), ["config", "--get", "remote.origin.url"])
            .await
        {
            Ok(out) => Some(out.trim().to_string()),
            // `git config --get` exits 1 when the key is unset
            Err(GitError::Failed { code: 1, .. }) => None,
            Err(e) => return Err(e),
        };

        match found {
            Some(url) if same_remote(&url, clone_url) => Ok(()),
            found => Err(GitError::RemoteMismatch {
                path: dir.to_path_buf(),
                expected: clone_url.trim().to_string(),
                found,
            }),
        }
    }

    /// Checkout the default branch and pull; failures become warnings.
    async fn update(&self, dir: &Path) -> Vec<String> {
        let mut warnings = Vec::new();

        match self.resolve_branch(dir).await {
            Some(branch) => {
                if let Err(e) = self.run_git(Some(dir), ["checkout", branch.as_str()]).await {
                    warn!(error = %e, "Checkout failed, continuing with current working copy");
                    warnings.push(e.to_string());
                }
            }
            None => {
                let message = "No default branch configured and remote HEAD unknown, skipping checkout";
                warn!("{}", message);
                warnings.push(message.to_string());
            }
        }

        if let Err(e) = self.run_git(Some(dir), ["pull"]).await {
            warn!(error = %e, "Pull failed, continuing with current working copy");
            warnings.push(e.to_string());
        }

        warnings
    }

    /// Commit currently checked out in `dir`
    pub async fn current_commit(&self, dir: &Path) -> Result<String, GitError> {
        let out = self.run_git(Some(dir), ["rev-parse", "HEAD"]).await?;
        let commit = out.trim();
        if commit.is_empty() {
            return Err(GitError::EmptyOutput("git rev-parse HEAD".to_string()));
        }
        Ok(commit.to_string())
    }
}

#[async_trait]
impl WorkingCopy for RepoSync {
    fn working_copy_path(&self, project: &Project) -> Result<PathBuf, SyncError> {
        self.clone_path(project).map_err(SyncError::CloneFailed)
    }

    #[instrument(skip(self, project), fields(project_id = project.id, project = %project.name))]
    async fn ensure_up_to_date(&self, project: &Project) -> Result<Checkout, SyncError> {
        let dir = self.working_copy_path(project)?;

        let warnings = if dir.join(".git").exists() {
            match self.verify_origin(&dir, &project.clone_url).await {
                Ok(()) => {}
                Err(e @ GitError::RemoteMismatch { .. }) => {
                    error!(error = %e, "Working copy belongs to another repository");
                    return Err(SyncError::WorkingCopyConflict(e));
                }
                Err(e) => return Err(SyncError::CloneFailed(e)),
            }
            self.update(&dir).await
        } else {
            info!(path = %dir.display(), "No local clone, cloning");
            if let Err(e) = self.clone_into(&project.clone_url, &dir).await {
                error!(error = %e, "Git clone failed");
                return Err(SyncError::CloneFailed(e));
            }
            Vec::new()
        };

        let commit = self
            .current_commit(&dir)
            .await
            .map_err(SyncError::CommitResolutionFailed)?;
        debug!(%commit, "Resolved working copy commit");

        Ok(Checkout {
            path: dir,
            commit,
            warnings,
        })
    }
}
