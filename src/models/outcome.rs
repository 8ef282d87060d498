//! # 执行结果模型
//!
//! 单个目录中一次命令执行的终态与输出。
//!
//! ## 依赖关系
//! - 被 `exec/` 写入
//! - 被 `report/` 与 `commands/run.rs` 读取

use crate::error::OperationError;

use std::borrow::Cow;
use std::fmt;

/// 命令执行终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusType {
    /// 命令运行完成且退出码为 0
    Success,
    /// 命令运行完成但退出码非 0
    Failure,
    /// 从未被调度（被上游过滤）
    Skipped,
    /// 命令无法运行、被信号终止、被中断或超时
    Error,
}

impl StatusType {
    /// 汇总时的显示顺序
    pub const ALL: [StatusType; 4] = [
        StatusType::Success,
        StatusType::Failure,
        StatusType::Skipped,
        StatusType::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusType::Success => "SUCCESS",
            StatusType::Failure => "FAILURE",
            StatusType::Skipped => "SKIPPED",
            StatusType::Error => "ERROR",
        }
    }

    /// 是否计入整体失败
    pub fn is_failed(&self) -> bool {
        matches!(self, StatusType::Failure | StatusType::Error)
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// 单次命令执行的结果
///
/// 完成后不可变，通过 `Arc` 在多个读者之间共享。
#[derive(Debug)]
pub struct RunResult {
    /// 标准输出
    pub stdout: Vec<u8>,
    /// 标准错误
    pub stderr: Vec<u8>,
    /// 按到达顺序交错的 stdout + stderr
    pub stdall: Vec<u8>,
    /// 终态
    pub status: StatusType,
    /// 命令未能正常运行时的错误
    pub error: Option<OperationError>,
}

impl RunResult {
    /// 命令运行完成（无论退出码）
    pub fn finished(stdout: Vec<u8>, stderr: Vec<u8>, stdall: Vec<u8>, success: bool) -> Self {
        Self {
            stdout,
            stderr,
            stdall,
            status: if success {
                StatusType::Success
            } else {
                StatusType::Failure
            },
            error: None,
        }
    }

    /// 命令未能正常运行，保留已捕获的部分输出
    pub fn errored(
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        stdall: Vec<u8>,
        error: OperationError,
    ) -> Self {
        Self {
            stdout,
            stderr,
            stdall,
            status: StatusType::Error,
            error: Some(error),
        }
    }

    /// 被上游过滤、从未调度
    pub fn skipped() -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdall: Vec::new(),
            status: StatusType::Skipped,
            error: None,
        }
    }

    #[cfg(test)]
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    #[cfg(test)]
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    pub fn stdall_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_pads() {
        assert_eq!(format!("[{:>8}]", StatusType::Failure), "[ FAILURE]");
        assert_eq!(format!("[{:>8}]", StatusType::Error), "[   ERROR]");
        assert_eq!(StatusType::Skipped.to_string(), "SKIPPED");
    }

    #[test]
    fn test_finished_status() {
        let ok = RunResult::finished(b"hi\n".to_vec(), vec![], b"hi\n".to_vec(), true);
        assert_eq!(ok.status, StatusType::Success);
        assert_eq!(ok.stdout_text(), "hi\n");
        assert!(ok.error.is_none());

        let failed = RunResult::finished(vec![], vec![], vec![], false);
        assert_eq!(failed.status, StatusType::Failure);
        assert!(failed.status.is_failed());
        assert!(!RunResult::skipped().status.is_failed());
    }
}
