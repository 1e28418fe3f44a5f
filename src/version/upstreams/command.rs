//! Running external query programs

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::version::error::UpstreamError;

/// Runs `program` with `args` and returns its stdout
///
/// A non-zero exit is an error carrying the program's stderr.
pub async fn run(program: &str, args: &[String], cwd: Option<&Path>) -> Result<String, UpstreamError> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    debug!("Running {} {}", program, args.join(" "));
    let output = command
        .output()
        .await
        .map_err(|source| UpstreamError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(UpstreamError::Command {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn run_returns_stdout() {
        let out = run("sh", &args(&["-c", "echo hello"]), None).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn run_reports_failing_exit_with_stderr() {
        let result = run("sh", &args(&["-c", "echo boom >&2; exit 3"]), None).await;

        match result {
            Err(UpstreamError::Command { program, stderr, .. }) => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn run_reports_missing_program() {
        let result = run("bump-no-such-program", &[], None).await;
        assert!(matches!(result, Err(UpstreamError::Spawn { .. })));
    }
}
