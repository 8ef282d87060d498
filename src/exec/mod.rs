//! # 命令执行模块
//!
//! 在多个目录中并行执行同一条外部命令。
//!
//! ## 功能
//! - 固定并发度的工作池
//! - 每个操作独立的超时
//! - 全局取消（SIGINT / SIGTERM）
//! - stdout / stderr / 交错输出捕获
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 子模块: cancel, operation, pool

pub mod cancel;
pub mod operation;
pub mod pool;

pub use cancel::{install_interrupt_handler, CancelToken};
pub use operation::Operation;
pub use pool::{Batch, WorkerPool, WAIT_TICK};
