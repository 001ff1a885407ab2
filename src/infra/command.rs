//! 命令执行器
//!
//! 带超时的外部命令执行，stdout/stderr 分离捕获。超时会杀掉子进程。

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

/// 命令执行器
pub struct CommandRunner;

/// 命令执行错误
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// 命令启动失败（或等待失败）
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// 命令超时
    #[error("`{program}` timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

impl CommandRunner {
    /// 执行命令并等待结束
    ///
    /// `work_dir` 为 `None` 时继承当前目录。超时后子进程被杀掉并返回
    /// `CommandError::Timeout`；非零退出码不算错误，由调用方根据 `Output` 判断。
    pub async fn run(
        program: &str,
        args: &[&str],
        work_dir: Option<&Path>,
        timeout: Duration,
    ) -> Result<Output, CommandError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = work_dir {
            command.current_dir(dir);
        }

        debug!(program, ?args, work_dir = ?work_dir, "Spawning command");

        let child = command.spawn().map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        // 超时时 future 被丢弃，kill_on_drop 负责终止子进程
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            }),
            Err(_) => {
                error!(program, ?timeout, "Command timed out, killing process");
                Err(CommandError::Timeout {
                    program: program.to_string(),
                    timeout,
                })
            }
        }
    }
}

/// `Output` 摘要
pub trait OutputExt {
    /// stdout，去掉尾部空白
    fn stdout_lossy(&self) -> String;
    /// stderr，去掉尾部空白
    fn stderr_lossy(&self) -> String;
}

impl OutputExt for Output {
    fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim_end().to_string()
    }

    fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}
