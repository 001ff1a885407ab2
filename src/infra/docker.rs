//! Docker CLI 封装
//!
//! 只有两种调用：`compose up` 和 `image prune`

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use super::command::{CommandError, CommandRunner};

/// 拉取新镜像并重建有变化的容器
pub const COMPOSE_UP_ARGS: [&str; 5] = ["compose", "up", "-d", "--pull", "always"];

/// 删除所有未被容器使用的镜像
pub const IMAGE_PRUNE_ARGS: [&str; 4] = ["image", "prune", "-a", "-f"];

/// docker 可执行文件，以及每次调用的超时
#[derive(Clone, Debug)]
pub struct Docker {
    program: String,
    timeout: Duration,
}

impl Docker {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// 在 `work_dir` 中执行 `docker compose up -d --pull always`
    pub async fn compose_up(&self, work_dir: &Path) -> Result<Output, CommandError> {
        CommandRunner::run(&self.program, &COMPOSE_UP_ARGS, Some(work_dir), self.timeout).await
    }

    /// 执行 `docker image prune -a -f`
    pub async fn image_prune(&self) -> Result<Output, CommandError> {
        CommandRunner::run(&self.program, &IMAGE_PRUNE_ARGS, None, self.timeout).await
    }
}
