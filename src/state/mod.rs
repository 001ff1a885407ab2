//! 运行时状态模块
//!
//! 管理应用状态和运行记录

pub mod app_state;
pub mod history;

pub use app_state::AppState;
pub use history::RunHistory;
