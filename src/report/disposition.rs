//! # 整体退出结果
//!
//! 任一目录 FAILURE 或 ERROR 即整体失败；被中断的运行单独报告。

use super::Entry;
use crate::error::{FAILED_CMD_EXIT_CODE, INTERRUPTED_EXIT_CODE};

/// 整个运行的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 所有未跳过的目录均 SUCCESS
    Success,
    /// 存在 FAILURE 或 ERROR
    Failed,
    /// 收到 SIGINT / SIGTERM
    Interrupted,
}

impl Disposition {
    /// 由报告项计算；`interrupted` 优先于失败
    pub fn from_entries(entries: &[Entry], interrupted: bool) -> Self {
        if interrupted {
            Disposition::Interrupted
        } else if entries.iter().any(|e| e.status().is_failed()) {
            Disposition::Failed
        } else {
            Disposition::Success
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Disposition::Success => 0,
            Disposition::Failed => FAILED_CMD_EXIT_CODE,
            Disposition::Interrupted => INTERRUPTED_EXIT_CODE,
        }
    }
}
