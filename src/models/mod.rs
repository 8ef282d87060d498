//! # 数据模型模块
//!
//! 定义命令执行终态与结果数据模型。
//!
//! ## 依赖关系
//! - 被 `exec/`、`report/` 和 `commands/` 使用
//! - 子模块: outcome

pub mod outcome;

pub use outcome::{RunResult, StatusType};
