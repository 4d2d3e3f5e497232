//! Version-control operations for Docflow.
//!
//! Thin wrapper around the `git` binary. Every call is a synchronous
//! subprocess invocation with a bounded deadline; a non-zero exit or a
//! timed-out child is surfaced as [`DocflowError::Git`].

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use docflow_shared::{DocflowError, Result};

/// Deadline for any single git invocation. A push stuck on a credential
/// prompt must become a step failure, not a hung run.
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read the message of the most recent commit in `repo_dir`.
pub fn last_commit_message(repo_dir: &Path) -> Result<String> {
    let msg = run_git(repo_dir, &["log", "-1", "--pretty=%B"])?;
    Ok(msg.trim().to_string())
}

/// Stage `files`, commit with `message`, and push to the current remote.
///
/// The caller decides which files to stage; this function performs the
/// three git operations in order and stops at the first failure, so a
/// failed push never reports success.
pub fn stage_commit_push(repo_dir: &Path, files: &[String], message: &str) -> Result<()> {
    for file in files {
        run_git(repo_dir, &["add", file])?;
    }

    run_git(repo_dir, &["commit", "-m", message])?;
    run_git(repo_dir, &["push"])?;

    info!(file_count = files.len(), message, "committed and pushed");
    Ok(())
}

/// Run one git subcommand, capturing stdout. Non-zero exit, a spawn
/// failure, or exceeding the deadline maps to [`DocflowError::Git`].
fn run_git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    run_git_with_timeout(repo_dir, args, GIT_TIMEOUT)
}

/// Stdin is nulled and terminal prompts are disabled so git can never
/// block waiting for input; a child still alive at the deadline is
/// killed.
fn run_git_with_timeout(repo_dir: &Path, args: &[&str], timeout: Duration) -> Result<String> {
    debug!(?args, dir = %repo_dir.display(), "running git");

    let mut child = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DocflowError::Git(format!("failed to run git {}: {e}", args.join(" "))))?;

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if started.elapsed() >= timeout {
                    warn!(?args, ?timeout, "git exceeded deadline, killing");
                    child.kill().ok();
                    child.wait().ok();
                    return Err(DocflowError::Git(format!(
                        "git {} timed out after {}s",
                        args.join(" "),
                        timeout.as_secs()
                    )));
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                return Err(DocflowError::Git(format!(
                    "failed to wait for git {}: {e}",
                    args.join(" ")
                )));
            }
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| DocflowError::Git(format!("failed to read git {} output: {e}", args.join(" "))))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DocflowError::Git(format!(
            "git {} exited with {}: {}",
            args.join(" "),
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docflow-vcs-test-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn last_commit_outside_a_repo_fails() {
        let dir = scratch_dir();
        let err = last_commit_message(&dir).unwrap_err();
        assert!(err.to_string().starts_with("git error:"), "got: {err}");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn commit_outside_a_repo_fails_before_push() {
        let dir = scratch_dir();
        std::fs::write(dir.join("file.md"), "content").expect("write file");

        let err =
            stage_commit_push(&dir, &["file.md".to_string()], "docs: test").unwrap_err();
        assert!(matches!(err, DocflowError::Git(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn expired_deadline_kills_and_reports_timeout() {
        let dir = scratch_dir();
        // A zero deadline expires before any child can finish.
        let err = run_git_with_timeout(&dir, &["log", "-1"], Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unknown_subcommand_reports_exit_status() {
        let dir = scratch_dir();
        let err = run_git(&dir, &["definitely-not-a-subcommand"]).unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-subcommand"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
