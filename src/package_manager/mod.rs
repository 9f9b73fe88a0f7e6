//! 包数据源 — 对 pacman / paru / yay 查询接口的封装

pub mod parser;
pub mod types;

pub use types::{Package, SourceError};

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

/// 默认查询超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 外部包数据源
///
/// 查询必须是幂等且无副作用的，可以被重复、并发调用。
#[async_trait]
pub trait PackageSource: Send + Sync {
    fn name(&self) -> &str;

    /// 获取当前已安装包列表，顺序与数据源一致
    async fn fetch_installed_packages(&self) -> Result<Vec<Package>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct PacmanSource {
    pub command: String,
    pub explicit_only: bool,
    pub dedup_by_name: bool,
    pub timeout: Duration,
}

impl PacmanSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            explicit_only: false,
            dedup_by_name: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// 按 paru > yay > pacman 的顺序探测可用的包管理器
    pub async fn detect() -> Result<Self, SourceError> {
        for pm in ["paru", "yay", "pacman"] {
            let found = Command::new("which")
                .arg(pm)
                .output()
                .await
                .map(|o| o.status.success())
                .unwrap_or(false);
            if found {
                log::info!("检测到包管理器: {}", pm);
                return Ok(Self::new(pm));
            }
        }
        Err(SourceError::Unavailable(
            "未找到包管理器 (paru/yay/pacman)".to_string(),
        ))
    }

    /// 只列出显式安装的包 (-Qe)
    pub fn explicit_only(mut self, explicit_only: bool) -> Self {
        self.explicit_only = explicit_only;
        self
    }

    /// 同名包只保留第一条，默认保持数据源原样
    pub fn dedup_by_name(mut self, dedup: bool) -> Self {
        self.dedup_by_name = dedup;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn query_flag(&self) -> &'static str {
        if self.explicit_only {
            "-Qe"
        } else {
            "-Q"
        }
    }
}

#[async_trait]
impl PackageSource for PacmanSource {
    fn name(&self) -> &str {
        &self.command
    }

    async fn fetch_installed_packages(&self) -> Result<Vec<Package>, SourceError> {
        let flag = self.query_flag();
        log::debug!("执行 {} {}", self.command, flag);

        // 派发被取消时 future 会被丢弃，kill_on_drop 保证子进程随之结束
        let query = Command::new(&self.command)
            .arg(flag)
            .env("LC_ALL", "C")
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(SourceError::Unavailable(format!(
                    "无法执行 {} {}: {}",
                    self.command, flag, e
                )));
            }
            Err(_) => {
                return Err(SourceError::Unavailable(format!(
                    "{} {} 超时（{:?}）",
                    self.command, flag, self.timeout
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SourceError::Unavailable(format!(
                "{} {} 执行失败 ({}): {}",
                self.command, flag, output.status, stderr
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| SourceError::Malformed {
            line: 0,
            reason: format!("输出不是合法的 UTF-8: {}", e),
        })?;

        let packages = parser::parse_query_output(&stdout)?;
        if self.dedup_by_name {
            return Ok(parser::dedup_by_name(packages));
        }
        Ok(packages)
    }
}
