//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `run`: 在匹配模式的每个目录中并行执行命令
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: run

pub mod run;

use clap::{Parser, Subcommand};

/// globrun - 按 glob 模式在多个目录中并行执行命令
#[derive(Parser, Debug)]
#[command(name = "globrun")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Run a command in parallel in every directory matching a glob pattern",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command in every directory that matches the pattern(s)
    Run(run::RunArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::time::Duration;

    fn parse_run(args: &[&str]) -> run::RunArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Run(args) => args,
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_patterns_before_dash() {
        let args = parse_run(&["globrun", "run", "a/**", "b/*.txt", "--", "rm", "-f", "x"]);
        assert_eq!(args.patterns, vec!["a/**", "b/*.txt"]);
        assert_eq!(args.command, vec!["rm", "-f", "x"]);
    }

    #[test]
    fn test_without_dash_everything_is_positional() {
        let args = parse_run(&["globrun", "run", "--max-cmd-duration=1s", "**/*.txt", "sleep", "2"]);
        assert_eq!(args.patterns, vec!["**/*.txt", "sleep", "2"]);
        assert!(args.command.is_empty());
        assert_eq!(args.max_cmd_duration, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_interactive_flag_forms() {
        let args = parse_run(&["globrun", "run", "x", "--interactive", "--", "true"]);
        assert_eq!(args.interactive, Some(true));

        let args = parse_run(&["globrun", "run", "--interactive=false", "x", "--", "true"]);
        assert_eq!(args.interactive, Some(false));
    }

    #[test]
    fn test_bare_interactive_does_not_consume_pattern() {
        let args = parse_run(&["globrun", "run", "--interactive", "**/*.txt", "--", "true"]);
        assert_eq!(args.interactive, Some(true));
        assert_eq!(args.patterns, vec!["**/*.txt"]);
        assert_eq!(args.command, vec!["true"]);

        let args = parse_run(&["globrun", "run", "--interactive", "**/*.txt", "rm", "x"]);
        assert_eq!(args.interactive, Some(true));
        assert_eq!(args.patterns, vec!["**/*.txt", "rm", "x"]);
    }
}
