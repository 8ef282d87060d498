//! # 统一错误处理模块
//!
//! 定义 globrun 的所有错误类型，使用 `thiserror` 派生。
//!
//! - [`GlobrunError`]: 致命错误，在启动任何子进程之前中止整个运行
//! - [`OperationError`]: 单个目录的执行错误，只记录在该目录的结果中
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 存在失败或出错的命令
pub const FAILED_CMD_EXIT_CODE: i32 = 2;
/// 参数或模式使用错误
pub const MISUSE_EXIT_CODE: i32 = 50;
/// 被 SIGINT / SIGTERM 中断
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// globrun 统一错误类型
#[derive(Error, Debug)]
pub enum GlobrunError {
    // ─────────────────────────────────────────────────────────────
    // 模式错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("No paths match pattern(s): '{patterns}'")]
    NoMatch { patterns: String },

    // ─────────────────────────────────────────────────────────────
    // 文件系统错误
    // ─────────────────────────────────────────────────────────────
    #[error("Error determining paths: '{path}'")]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 运行时错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),

    #[error("Failed to install signal handler: {0}")]
    Signal(String),
}

impl GlobrunError {
    /// 该错误对应的进程退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            GlobrunError::InvalidPattern { .. }
            | GlobrunError::NoMatch { .. }
            | GlobrunError::InvalidArgument(_) => MISUSE_EXIT_CODE,
            GlobrunError::Setup { .. } | GlobrunError::ThreadPool(_) | GlobrunError::Signal(_) => {
                FAILED_CMD_EXIT_CODE
            }
        }
    }
}

/// 单个目录中命令执行的错误
///
/// 只影响所属目录的状态（`ERROR`），不会中止其他目录。
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("failed to launch cmd ({command}): {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run cmd ({command}): interrupted before complete (sigint or sigterm)")]
    Interrupted { command: String },

    #[error("failed to run cmd ({command}): timed out after {limit:?} (signal: killed)")]
    TimedOut { command: String, limit: Duration },

    #[error("failed to run cmd ({command}): terminated by signal {signal}")]
    Signaled { command: String, signal: i32 },

    #[error("failed to run cmd ({command}): {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl OperationError {
    /// 是否由取消（中断或超时）导致
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            OperationError::Interrupted { .. } | OperationError::TimedOut { .. }
        )
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, GlobrunError>;
