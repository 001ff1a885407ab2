//! 配置模块
//!
//! 配置文件解析与常量

pub mod file;

pub use file::{constants, Config, ManagedComposition};
