//! Preview clip generation
//!
//! Runs transcoder invocations one at a time, in order. A failing transcode
//! does not stop the run; its exit status and raw output bytes are returned
//! as data. A clip left behind by a failed run is removed, so the next
//! classification sees it as missing.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::services::classifier::TranscodeCommand;

/// Exit code reported for transcodes that never produced a status
pub const NO_EXIT_CODE: i32 = -1;

/// Result of one transcoder run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOutcome {
    pub exit_code: i32,
    /// Transcoder output exactly as written; not necessarily UTF-8
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Recording the clip was made from
    pub filename: String,
}

impl SampleOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// stderr for failed runs, stdout for successful ones
    pub fn diagnostic(&self) -> &[u8] {
        if self.succeeded() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Run every command, returning one outcome per command in input order
pub async fn run(commands: &[TranscodeCommand]) -> Vec<SampleOutcome> {
    let mut outcomes = Vec::with_capacity(commands.len());
    for (index, command) in commands.iter().enumerate() {
        tracing::info!(
            file = %command.filename,
            progress = %format!("{}/{}", index + 1, commands.len()),
            "Generating preview clip"
        );
        outcomes.push(run_one(command).await);
    }
    outcomes
}

/// Run a single transcode
pub async fn run_one(command: &TranscodeCommand) -> SampleOutcome {
    if let Some(parent) = command.output.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!(dir = %parent.display(), error = %e, "Cannot create samples directory");
        }
    }

    // With -n semantics a clip that is already there belongs to an earlier run
    let replaceable = command.overwrite || !command.output.exists();

    let result = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let outcome = match result {
        Ok(output) => SampleOutcome {
            // None when killed by a signal
            exit_code: output.status.code().unwrap_or(NO_EXIT_CODE),
            stdout: output.stdout,
            stderr: output.stderr,
            filename: command.filename.clone(),
        },
        Err(e) => SampleOutcome {
            exit_code: NO_EXIT_CODE,
            stdout: Vec::new(),
            stderr: format!("failed to run {}: {}", command.program.display(), e).into_bytes(),
            filename: command.filename.clone(),
        },
    };

    if outcome.succeeded() {
        tracing::debug!(file = %outcome.filename, "Transcode finished");
    } else {
        let stderr = String::from_utf8_lossy(&outcome.stderr);
        tracing::warn!(
            file = %outcome.filename,
            exit_code = outcome.exit_code,
            stderr = %stderr.trim(),
            "Transcode failed"
        );
        if replaceable {
            remove_partial_output(&command.output).await;
        }
    }

    outcome
}

async fn remove_partial_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => tracing::info!(file = %output.display(), "Removed incomplete preview clip"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            file = %output.display(),
            error = %e,
            "Cannot remove incomplete preview clip"
        ),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn shell(script: &str, filename: &str, output: PathBuf) -> TranscodeCommand {
        TranscodeCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            input: PathBuf::from("/dev/null"),
            output,
            filename: filename.to_string(),
            overwrite: false,
        }
    }

    #[tokio::test]
    async fn test_failure_captures_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let cmd = shell(
            "printf 'no such file' >&2; exit 1",
            "1008_20230615140000.mpg",
            temp_dir.path().join("a.ogv"),
        );

        let outcome = run_one(&cmd).await;
        assert_eq!(outcome.exit_code, 1);
        assert_eq!(outcome.diagnostic(), b"no such file");
        assert_eq!(outcome.filename, "1008_20230615140000.mpg");
    }

    #[tokio::test]
    async fn test_success_reports_stdout() {
        let temp_dir = TempDir::new().unwrap();
        let cmd = shell("exit 0", "1009_20230615140000.mpg", temp_dir.path().join("b.ogv"));

        let outcome = run_one(&cmd).await;
        assert_eq!(
            (outcome.exit_code, outcome.diagnostic(), outcome.filename.as_str()),
            (0, &b""[..], "1009_20230615140000.mpg")
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_data() {
        let temp_dir = TempDir::new().unwrap();
        let cmd = TranscodeCommand {
            program: PathBuf::from("/nonexistent/transcoder"),
            args: vec![],
            input: PathBuf::from("/dev/null"),
            output: temp_dir.path().join("c.ogv"),
            filename: "1010_20230615140000.mpg".to_string(),
            overwrite: false,
        };

        let outcome = run_one(&cmd).await;
        assert_eq!(outcome.exit_code, NO_EXIT_CODE);
        assert!(!outcome.succeeded());
        assert!(String::from_utf8_lossy(outcome.diagnostic()).contains("/nonexistent/transcoder"));
    }

    #[tokio::test]
    async fn test_runs_in_order_and_creates_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let samples = temp_dir.path().join("nested").join("samples");
        let log = temp_dir.path().join("order.log");
        let log_str = log.display().to_string();

        let commands: Vec<TranscodeCommand> = ["first", "second", "third"]
            .iter()
            .map(|name| {
                shell(
                    &format!("echo {} >> '{}'", name, log_str),
                    name,
                    samples.join(format!("{}.ogv", name)),
                )
            })
            .collect();

        let outcomes = run(&commands).await;
        let names: Vec<&str> = outcomes.iter().map(|o| o.filename.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(outcomes.iter().all(|o| o.succeeded()));
        assert!(samples.is_dir());
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn test_diagnostic_keeps_raw_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let cmd = shell(
            r"printf '\377\376bad' >&2; exit 1",
            "1011_20230615140000.mpg",
            temp_dir.path().join("d.ogv"),
        );

        let outcome = run_one(&cmd).await;
        assert_eq!(outcome.diagnostic(), &[0xff, 0xfe, b'b', b'a', b'd'][..]);
    }

    #[tokio::test]
    async fn test_failed_run_removes_its_partial_clip() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("e.ogv");
        let script = format!("echo truncated > '{}'; exit 1", output.display());
        let cmd = shell(&script, "1012_20230615140000.mpg", output.clone());

        let outcome = run_one(&cmd).await;
        assert_eq!(outcome.exit_code, 1);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_failed_run_keeps_clip_it_did_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("f.ogv");
        std::fs::write(&output, b"earlier clip").unwrap();

        // ffmpeg -n refuses an existing output and exits non-zero
        let cmd = shell("printf 'already exists' >&2; exit 1", "1013_20230615140000.mpg", output.clone());
        run_one(&cmd).await;
        assert_eq!(std::fs::read(&output).unwrap(), b"earlier clip");

        // A failed overwrite leaves nothing trustworthy behind
        let mut replace = shell(
            &format!("echo partial > '{}'; exit 1", output.display()),
            "1013_20230615140000.mpg",
            output.clone(),
        );
        replace.overwrite = true;
        run_one(&replace).await;
        assert!(!output.exists());
    }
}
