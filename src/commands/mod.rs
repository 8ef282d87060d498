//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `config.rs`, `matcher/`, `exec/`, `report/`, `utils/`
//! - 子模块: run

pub mod run;

use crate::cli::Commands;
use crate::error::Result;
use crate::exec::CancelToken;
use crate::report::Disposition;

/// 执行命令
pub fn run(cmd: Commands, cancel: &CancelToken) -> Result<Disposition> {
    match cmd {
        Commands::Run(args) => run::execute(args, cancel),
    }
}
