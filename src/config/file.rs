//! 配置文件加载
//!
//! TOML 格式。顶层固定键之外的每个表都是一个受管的 composition：
//!
//! ```toml
//! token = "secret"
//! prune_interval = 86400
//!
//! [web]
//! work = "/srv/web"
//! ```

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use self::constants::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_DOCKER, DEFAULT_PORT, RESERVED_NAMES};

/// 服务配置
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// 服务监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 监听地址
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    /// Bearer token
    pub token: String,
    /// 定时重启全部 composition 的间隔（秒）
    pub force_update_interval: Option<u64>,
    /// 定时清理镜像的间隔（秒）
    pub prune_interval: Option<u64>,
    /// 单次 docker 调用的超时（秒）
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
    /// docker 可执行文件
    #[serde(default = "default_docker")]
    pub docker: String,
    /// composition 名称 -> 配置
    #[serde(flatten)]
    pub compositions: HashMap<String, ManagedComposition>,
}

/// 受管的 docker compose 项目
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ManagedComposition {
    /// compose 文件所在目录
    pub work: PathBuf,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_docker() -> String {
    DEFAULT_DOCKER.to_string()
}

impl Config {
    /// 从文件加载并校验
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// 解析 TOML 字符串并校验
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    ///
    /// 工作目录不存在只告警，卷可能稍后才挂载
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.token.trim().is_empty() {
            bail!("`token` must not be empty");
        }
        if self.force_update_interval == Some(0) {
            bail!("`force_update_interval` must be greater than 0");
        }
        if self.prune_interval == Some(0) {
            bail!("`prune_interval` must be greater than 0");
        }
        if self.command_timeout == 0 {
            bail!("`command_timeout` must be greater than 0");
        }

        for (name, composition) in &self.compositions {
            if name.is_empty() || name.contains('/') {
                bail!("invalid composition name `{}`", name);
            }
            if RESERVED_NAMES.contains(&name.as_str()) {
                bail!("composition name `{}` collides with a built-in route", name);
            }
            if !composition.work.is_dir() {
                warn!(
                    composition = %name,
                    work = %composition.work.display(),
                    "Composition work directory does not exist (yet)"
                );
            }
        }

        Ok(())
    }

    /// 查找 composition
    pub fn composition(&self, name: &str) -> Option<&ManagedComposition> {
        self.compositions.get(name)
    }

    /// 所有 composition 名称（排序）
    pub fn composition_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.compositions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout)
    }

    pub fn force_update_interval(&self) -> Option<Duration> {
        self.force_update_interval.map(Duration::from_secs)
    }

    pub fn prune_interval(&self) -> Option<Duration> {
        self.prune_interval.map(Duration::from_secs)
    }
}

/// 常量
pub mod constants {
    /// 服务名
    pub const SERVICE_NAME: &str = "conductor";

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// 默认配置文件路径
    pub const DEFAULT_CONFIG_PATH: &str = "/etc/conductor/config.toml";

    /// 默认端口
    pub const DEFAULT_PORT: u16 = 8080;

    /// docker 调用默认超时（秒）
    pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 600; // 10 分钟

    pub const DEFAULT_DOCKER: &str = "docker";

    /// 运行记录最大保存数量
    pub const MAX_RUN_HISTORY: usize = 100;

    /// 历史查询默认条数
    pub const DEFAULT_HISTORY_LIMIT: usize = 20;

    /// 与内置路由冲突的名称
    pub const RESERVED_NAMES: &[&str] = &["health", "history"];
}
