//! # 美化输出工具
//!
//! 提供统一的终端输出样式。
//!
//! ## 依赖关系
//! - 被 `main.rs`、`commands/` 与 `report/` 使用
//! - 使用 `colored` crate

use crate::models::StatusType;

use colored::{ColoredString, Colorize};

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印 `#` 框起的标题
pub fn print_banner(title: &str) {
    println!("\n{}\n{} {}\n{}\n", "#".dimmed(), "#".dimmed(), title.bold(), "#".dimmed());
}

/// 按终态着色
pub fn paint_status(status: StatusType, text: &str) -> ColoredString {
    match status {
        StatusType::Success => text.green().bold(),
        StatusType::Failure => text.red().bold(),
        StatusType::Error => text.magenta().bold(),
        StatusType::Skipped => text.dimmed(),
    }
}
