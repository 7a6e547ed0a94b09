//! Lifecycle script execution

use std::path::Path;

use tokio::process::Command;

/// Captured result of one hook command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs hook commands for the orchestrator
#[async_trait::async_trait]
pub trait HookRunner: Send + Sync {
    /// Run `command` with `working_dir` as the current directory
    async fn run(&self, command: &str, working_dir: &Path) -> std::io::Result<HookOutput>;
}

/// Runs commands through the platform shell
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellHookRunner;

impl ShellHookRunner {
    fn command(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

#[async_trait::async_trait]
impl HookRunner for ShellHookRunner {
    async fn run(&self, command: &str, working_dir: &Path) -> std::io::Result<HookOutput> {
        let output = Self::command(command)
            .current_dir(working_dir)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(HookOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
