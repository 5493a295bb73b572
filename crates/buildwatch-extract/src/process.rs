//! Subprocess implementations of the external tool seams.
//!
//! Each tool is invoked with its fixed argument convention; success is exit
//! code zero plus the expected output existing. Child stdout/stderr is
//! streamed line by line into the pipeline's log.

use async_trait::async_trait;
use buildwatch_core::tools::{AssetExtractor, LauncherUnpacker, MetadataDumper};
use buildwatch_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Spawn a command, stream its combined output to the log and wait for exit.
async fn run_streamed(tool: &str, mut command: Command) -> Result<()> {
    debug!(%tool, ?command, "spawning");

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::tool(tool, format!("spawn failed: {}", e)))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // drain both pipes while waiting; a full pipe buffer would otherwise
    // block the child and wedge the whole poll loop
    let out_task = tokio::spawn(stream_lines(tool.to_string(), stdout));
    let err_task = tokio::spawn(stream_lines(tool.to_string(), stderr));

    let status = child
        .wait()
        .await
        .map_err(|e| Error::tool(tool, format!("wait failed: {}", e)))?;
    let _ = tokio::join!(out_task, err_task);

    if !status.success() {
        return Err(Error::tool(
            tool,
            format!("exited with {}", status.code().unwrap_or(-1)),
        ));
    }
    Ok(())
}

async fn stream_lines<R>(tool: String, reader: Option<R>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let Some(reader) = reader else { return };
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        info!(tool = %tool, "{}", line);
    }
}

/// Installer unpacker: `<exe> <installer> <out-dir>`.
pub struct SubprocessUnpacker {
    executable: PathBuf,
}

impl SubprocessUnpacker {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl LauncherUnpacker for SubprocessUnpacker {
    async fn unpack(&self, installer: &Path, out_dir: &Path) -> Result<PathBuf> {
        let mut command = Command::new(&self.executable);
        command.arg(installer).arg(out_dir);
        run_streamed("unpacker", command).await?;

        if !out_dir.is_dir() || std::fs::read_dir(out_dir)?.next().is_none() {
            return Err(Error::tool("unpacker", "produced no output"));
        }
        Ok(out_dir.to_path_buf())
    }
}

/// Asset-bundle parser: `<exe> <bundle-root> <out-dir>`.
pub struct SubprocessAssetExtractor {
    executable: PathBuf,
}

impl SubprocessAssetExtractor {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl AssetExtractor for SubprocessAssetExtractor {
    async fn extract(&self, bundle_root: &Path, out_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(out_dir)?;
        let mut command = Command::new(&self.executable);
        command.arg(bundle_root).arg(out_dir);
        run_streamed("asset-extractor", command).await
    }
}

/// Native metadata dumper with the fixed argument convention:
/// `<exe> --bin <binary> --metadata <metadata> --layout class
///  --json-out <out>/metadata.json --cs-out <out>/types`.
pub struct SubprocessDumper {
    executable: PathBuf,
}

impl SubprocessDumper {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl MetadataDumper for SubprocessDumper {
    async fn dump(&self, binary: &Path, metadata: &Path, out_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(out_dir)?;
        let mut command = Command::new(&self.executable);
        command
            .arg("--bin")
            .arg(binary)
            .arg("--metadata")
            .arg(metadata)
            .arg("--layout")
            .arg("class")
            .arg("--json-out")
            .arg(out_dir.join("metadata.json"))
            .arg("--cs-out")
            .arg(out_dir.join("types"));
        run_streamed("dumper", command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn nonzero_exit_is_a_tool_error() {
        let mut command = Command::new("false");
        command.arg("anything");
        let result = run_streamed("false", command).await;
        match result {
            Err(Error::Tool { tool, .. }) => assert_eq!(tool, "false"),
            other => panic!("expected tool error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_exit_succeeds() {
        let command = Command::new("true");
        run_streamed("true", command).await.unwrap();
    }

    #[tokio::test]
    async fn missing_executable_is_a_tool_error() {
        let command = Command::new("/nonexistent/tool-binary");
        assert!(run_streamed("ghost", command).await.is_err());
    }

    #[tokio::test]
    async fn chatty_tool_output_is_drained_while_waiting() {
        // a tool writing well past the OS pipe buffer must still exit
        // cleanly; the readers run concurrently with wait()
        let mut command = Command::new("sh");
        command.arg("-c").arg(
            "i=0; while [ $i -lt 20000 ]; do \
               echo \"asset bundle entry $i ................................\"; \
               i=$((i+1)); done",
        );

        tokio::time::timeout(
            std::time::Duration::from_secs(30),
            run_streamed("chatty", command),
        )
        .await
        .expect("tool with large output must not wedge on a full pipe")
        .unwrap();
    }

    #[tokio::test]
    async fn unpacker_requires_output() {
        // `true` exits zero but writes nothing, so the unpacker must report
        // the missing output as a failure
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let unpacker = SubprocessUnpacker::new("true");
        let result = unpacker.unpack(Path::new("/dev/null"), &out).await;
        assert!(result.is_err());
    }
}
