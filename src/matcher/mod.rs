//! # 路径匹配模块
//!
//! 将一个或多个 glob 模式解析为待执行命令的目标目录。
//!
//! ## 功能
//! - 单层 glob 与递归 globstar（`**`）匹配
//! - 按首次出现顺序去重
//! - 匹配路径归约为所在目录
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 使用 `glob` 与 `walkdir`

pub mod globstar;
pub mod path;
pub mod resolver;

pub use globstar::PathMatcher;
pub use resolver::reduce;
