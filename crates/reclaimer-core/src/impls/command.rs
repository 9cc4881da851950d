//! CommandExecutor - 外部コマンド（`rm -rf`）による削除
//!
//! 起動失敗・非ゼロ終了はどちらも `false`。呼び出し元には投げない。

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::volume_usage;
use crate::ports::{DiskUsage, FilesystemExecutor};

#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    /// `rm -rf -- <path>`
    pub fn rm_rf() -> Self {
        Self::new("rm", ["-rf"])
    }

    /// `program args... -- <path>`; the path is always passed as the last
    /// argument, never through a shell.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::rm_rf()
    }
}

impl CommandExecutor {
    // `--` で option の解釈を打ち切る（`-` 始まりの相対パス対策）
    fn command(&self, path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg("--").arg(path);
        command
    }
}

impl FilesystemExecutor for CommandExecutor {
    fn remove(&self, path: &Path) -> bool {
        let status = self
            .command(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => {
                debug!(path = %path.display(), program = %self.program, "removed");
                true
            }
            Ok(status) => {
                warn!(path = %path.display(), program = %self.program, %status, "delete command failed");
                false
            }
            Err(e) => {
                warn!(path = %path.display(), program = %self.program, error = %e, "failed to launch delete command");
                false
            }
        }
    }

    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage> {
        volume_usage(path)
    }
}
