//! 统一错误处理
//!
//! `Error` 覆盖重启、清理和认证失败，实现 `IntoResponse` 直接返回 JSON 错误体

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::infra::command::CommandError;

/// API 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// docker 进程启动失败或超时
    #[error(transparent)]
    Command(#[from] CommandError),

    /// `docker compose up` 非零退出
    #[error("docker compose up failed for `{composition}` (exit code {})", fmt_code(.exit_code))]
    ComposeFailed {
        composition: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// `docker image prune` 非零退出
    #[error("docker image prune failed (exit code {})", fmt_code(.exit_code))]
    PruneFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("No composition found for path `{0}`")]
    NoComposition(String),

    #[error("No run found with id `{0}`")]
    RunNotFound(String),

    #[error("Unauthorized user attempted to access server")]
    Unauthorized,

    /// 请求参数错误
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// 后台任务 panic 或被取消
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn fmt_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl Error {
    /// HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NoComposition(_) | Error::RunNotFound(_) => StatusCode::NOT_FOUND,
            Error::Command(CommandError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Error::Command(_)
            | Error::Task(_)
            | Error::ComposeFailed { .. }
            | Error::PruneFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 机器可读的错误码
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized => "unauthorized",
            Error::BadRequest(_) => "bad_request",
            Error::NoComposition(_) | Error::RunNotFound(_) => "not_found",
            Error::Command(CommandError::Timeout { .. }) => "timeout",
            Error::Command(_) | Error::Task(_) => "internal_error",
            Error::ComposeFailed { .. } => "compose_failed",
            Error::PruneFailed { .. } => "prune_failed",
        }
    }

    /// docker 进程的退出码（仅命令失败时）
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ComposeFailed { exit_code, .. } | Error::PruneFailed { exit_code, .. } => {
                *exit_code
            }
            _ => None,
        }
    }

    /// 附加信息：命令失败时返回 stderr
    fn details(&self) -> Option<&str> {
        match self {
            Error::ComposeFailed { stderr, .. } | Error::PruneFailed { stderr, .. }
                if !stderr.is_empty() =>
            {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "Request rejected");
        }

        let mut body = ErrorResponse::new(self.code(), self.to_string());
        if let Some(details) = self.details() {
            body = body.with_details(details);
        }
        (status, Json(body)).into_response()
    }
}

/// 便捷类型别名
pub type Result<T, E = Error> = std::result::Result<T, E>;
