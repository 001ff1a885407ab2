//! 基础设施层
//!
//! 外部进程执行与 docker CLI 封装

pub mod command;
pub mod docker;

pub use command::{CommandError, CommandRunner, OutputExt};
pub use docker::Docker;
