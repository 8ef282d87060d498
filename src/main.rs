//! # globrun - 按 glob 模式在多个目录中并行执行命令
//!
//! 将模式（支持 `**` 递归匹配）展开为一组唯一目录，在每个目录中运行
//! 同一条命令，按目录顺序输出结果并汇总。
//!
//! ## 子命令
//! - `run` - 在匹配的目录中执行命令
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── config.rs   (运行配置)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── matcher/  (模式匹配与目录归约)
//!   │     ├── exec/     (操作、工作池、取消)
//!   │     ├── report/   (汇总与退出结果)
//!   │     └── models/   (数据模型)
//!   ├── utils/      (输出、进度条、日志)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod matcher;
mod models;
mod report;
mod utils;

use clap::Parser;
use cli::Cli;
use exec::CancelToken;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    utils::logging::init(cli.verbose);

    let cancel = CancelToken::new();
    if let Err(e) = exec::install_interrupt_handler(&cancel) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(e.exit_code());
    }

    match commands::run(cli.command, &cancel) {
        Ok(disposition) => std::process::exit(disposition.exit_code()),
        Err(e) => {
            utils::output::print_error(&format!("{}", e));
            std::process::exit(e.exit_code());
        }
    }
}
