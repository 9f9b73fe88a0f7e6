//! 包列表相关数据类型定义

use std::fmt;
use thiserror::Error;

/// 已安装包（名称 + 版本）
///
/// 构造后不可变，以 `name` 作为身份标识。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    name: String,
    version: String,
}

impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self, SourceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SourceError::Malformed {
                line: 0,
                reason: "包名为空".to_string(),
            });
        }
        Ok(Self {
            name,
            version: version.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// 包数据源错误
///
/// 两类错误对调用方都只是一条可读的文本消息。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// 无法执行查询（命令不存在、退出码非零、超时）
    #[error("包管理器不可用: {0}")]
    Unavailable(String),
    /// 输出无法解析为包列表
    #[error("无法解析包列表（第 {line} 行）: {reason}")]
    Malformed { line: usize, reason: String },
}
