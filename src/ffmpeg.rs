//! FFmpeg and FFprobe invocation.
//!
//! Video composition shells out to `ffmpeg`; durations are read with
//! `ffprobe`. Both must be on `PATH`.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

/// Errors that can occur while running FFmpeg tools
#[derive(Debug)]
pub enum FfmpegError {
    /// The named executable was not found on PATH
    NotFound(&'static str),
    /// Failed to spawn the process
    SpawnFailed(std::io::Error),
    /// The process exited with non-zero status
    ProcessFailed {
        tool: &'static str,
        exit_code: Option<i32>,
        stderr: String,
    },
    /// ffprobe output could not be read as a duration
    InvalidDuration(String),
}

impl std::fmt::Display for FfmpegError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FfmpegError::NotFound(tool) => {
                write!(
                    f,
                    "{} not found. Please install FFmpeg (e.g. `brew install ffmpeg` or `apt install ffmpeg`)",
                    tool
                )
            }
            FfmpegError::SpawnFailed(e) => write!(f, "Failed to spawn FFmpeg: {}", e),
            FfmpegError::ProcessFailed {
                tool,
                exit_code,
                stderr,
            } => {
                write!(f, "{} exited with code {:?}\n{}", tool, exit_code, stderr)
            }
            FfmpegError::InvalidDuration(raw) => {
                write!(f, "Could not read media duration from {:?}", raw)
            }
        }
    }
}

impl std::error::Error for FfmpegError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FfmpegError::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Run `tool` with `args` to completion, returning its stdout.
async fn run_tool<I, S>(tool: &'static str, args: I) -> Result<String, FfmpegError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FfmpegError::NotFound(tool)
            } else {
                FfmpegError::SpawnFailed(e)
            }
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        log::debug!("[{}] {}", tool, line);
    }

    if !output.status.success() {
        return Err(FfmpegError::ProcessFailed {
            tool,
            exit_code: output.status.code(),
            stderr: last_lines(&stderr, 10),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run `ffmpeg` with the given arguments (excluding the `ffmpeg` command itself).
pub async fn run_ffmpeg<I, S>(args: I) -> Result<(), FfmpegError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tool("ffmpeg", args).await.map(|_| ())
}

/// Duration of the media file at `path`, in seconds.
pub async fn probe_duration(path: &Path) -> Result<f64, FfmpegError> {
    let stdout = run_tool(
        "ffprobe",
        [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_entries"),
            OsStr::new("format=duration"),
            OsStr::new("-of"),
            OsStr::new("default=noprint_wrappers=1:nokey=1"),
            path.as_os_str(),
        ],
    )
    .await?;

    parse_duration(&stdout)
}

/// Parse ffprobe's bare duration output.
pub fn parse_duration(raw: &str) -> Result<f64, FfmpegError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
        _ => Err(FfmpegError::InvalidDuration(trimmed.to_string())),
    }
}

/// Whether both `ffmpeg` and `ffprobe` can be executed.
pub async fn is_available() -> bool {
    run_tool("ffmpeg", ["-version"]).await.is_ok()
        && run_tool("ffprobe", ["-version"]).await.is_ok()
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3.504000\n").unwrap(), 3.504);
        assert_eq!(parse_duration("  12 ").unwrap(), 12.0);
    }

    #[test]
    fn test_parse_duration_rejects_bad_values() {
        assert!(matches!(
            parse_duration("N/A"),
            Err(FfmpegError::InvalidDuration(_))
        ));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("-1.5").is_err());
        assert!(parse_duration("inf").is_err());
    }

    #[test]
    fn test_not_found_error_display() {
        let msg = FfmpegError::NotFound("ffprobe").to_string();
        assert!(msg.contains("ffprobe not found"));
        assert!(msg.contains("install FFmpeg"));
    }

    #[test]
    fn test_process_failed_error_display() {
        let err = FfmpegError::ProcessFailed {
            tool: "ffmpeg",
            exit_code: Some(1),
            stderr: "Error message".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg exited with code Some(1)"));
        assert!(msg.contains("Error message"));
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(last_lines("a", 5), "a");
        assert_eq!(last_lines("", 5), "");
    }

    #[tokio::test]
    async fn test_missing_tool_reports_not_found() {
        let result = run_tool("media-studio-no-such-tool", ["-version"]).await;
        // NotFound carries the tool name it was asked to run
        assert!(matches!(result, Err(FfmpegError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_probe_missing_file_fails() {
        if !is_available().await {
            eprintln!("ffmpeg/ffprobe not installed; skipping");
            return;
        }
        let result = probe_duration(Path::new("/nonexistent/audio.mp3")).await;
        assert!(matches!(result, Err(FfmpegError::ProcessFailed { .. })));
    }
}
