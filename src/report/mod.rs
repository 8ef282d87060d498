//! # 结果汇总模块
//!
//! 消费已完成的操作：统计各终态数量、打印汇总表与逐目录状态行、
//! 计算整体退出结果。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 使用 `tabled` 打印计数表，`colored` 着色
//! - 子模块: disposition, summary

pub mod disposition;
pub mod summary;

pub use disposition::Disposition;
pub use summary::{print_summary, Summary};

use crate::models::{RunResult, StatusType};

use std::path::PathBuf;
use std::sync::Arc;

/// 一个目录的最终报告项
#[derive(Debug, Clone)]
pub struct Entry {
    pub dir: PathBuf,
    /// `None`：运行被取消时尚未开始
    pub result: Option<Arc<RunResult>>,
}

impl Entry {
    pub fn new(dir: PathBuf, result: Option<Arc<RunResult>>) -> Self {
        Self { dir, result }
    }

    /// 未完成的操作按中断处理，记为 ERROR
    pub fn status(&self) -> StatusType {
        self.result
            .as_ref()
            .map(|r| r.status)
            .unwrap_or(StatusType::Error)
    }
}
