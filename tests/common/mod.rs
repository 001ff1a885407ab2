//! 测试公共工具
//!
//! 测试不连接真实的 docker daemon。每个测试在临时目录里写一个伪造的 `docker`
//! 脚本，并在配置中指向它。

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::AUTHORIZATION, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use conductor::{api, AppState, Config};

pub const TOKEN: &str = "test-token";

/// 临时目录，包含伪造的 docker 脚本、调用日志和 composition 目录
pub struct Fixture {
    pub dir: TempDir,
    pub docker: PathBuf,
    pub log: PathBuf,
}

impl Fixture {
    /// 伪造的 docker：记录 `<cwd> <args>`，然后执行 `body`
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("calls.log");
        let docker = dir.path().join("docker");

        let script = format!(
            "#!/bin/sh\necho \"$(pwd) $*\" >> '{}'\n{}\n",
            log.display(),
            body
        );
        std::fs::write(&docker, script).expect("write fake docker");
        std::fs::set_permissions(&docker, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake docker");

        Self { dir, docker, log }
    }

    /// 创建 composition 工作目录，返回规范化路径
    pub fn work_dir(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path).expect("create work dir");
        path.canonicalize().expect("canonicalize work dir")
    }

    /// 每个 composition 一个 `[name]` 表
    pub fn config(&self, compositions: &[&str], extra: &str) -> Config {
        let mut toml = format!(
            "token = \"{}\"\ndocker = \"{}\"\n{}\n",
            TOKEN,
            self.docker.display(),
            extra
        );
        for name in compositions {
            let work = self.work_dir(name);
            toml.push_str(&format!("\n[{}]\nwork = \"{}\"\n", name, work.display()));
        }
        Config::from_toml_str(&toml).expect("valid test config")
    }

    /// 伪造的 docker 目前写入的调用记录
    pub fn calls(&self) -> Vec<String> {
        read_lines(&self.log)
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// 返回 Router 和对应的状态，测试可直接检查运行记录
pub fn build_test_app(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    (api::router(state.clone()), state)
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    app.oneshot(builder.body(Body::empty()).expect("request"))
        .await
        .expect("infallible router")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn get_auth(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(TOKEN)).await
}

pub async fn post_auth(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(TOKEN)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
