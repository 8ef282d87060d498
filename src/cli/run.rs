//! # run 子命令 CLI 定义
//!
//! 在匹配模式的每个目录中并行执行命令
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `config.rs` 构造 `RunConfig`

use clap::Args;
use std::time::Duration;

/// run 子命令参数
#[derive(Args, Debug, Clone)]
#[command(after_help = "\
Any folders matching a PATTERN, or containing a file that matches it, have \
COMMAND executed with that folder as the working directory. PATTERN supports \
bash-style globstar (\"**\"). Output from each command and a summary of all \
runs are printed once execution completes.\n\n\
Without \"--\", only the first argument is a pattern and the rest is the command.")]
pub struct RunArgs {
    /// Glob pattern(s) selecting target directories, optionally followed by the command
    #[arg(required = true, value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Command (and its arguments) to run in every matched directory
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,

    /// Only target directories with changes detected via "git diff VAL"
    #[arg(long, value_name = "VAL", env = "GLOBRUN_GIT_DIFF")]
    pub git_diff: Option<String>,

    /// Run interactively (live progress); defaults to whether stdout is a terminal.
    /// Use --interactive=false to turn it off
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool),
        env = "GLOBRUN_INTERACTIVE"
    )]
    pub interactive: Option<bool>,

    /// Maximum number of directories running at once [default: number of CPUs]
    #[arg(long, value_name = "N", env = "GLOBRUN_MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,

    /// Time limit for each command (e.g. 30s, 1m30s, 500ms); 0 means unlimited
    #[arg(
        long,
        value_name = "DURATION",
        value_parser = parse_duration,
        env = "GLOBRUN_MAX_CMD_DURATION"
    )]
    pub max_cmd_duration: Option<Duration>,
}

/// 解析时长（`300ms`、`1.5s`、`1m30s`、`2h`；单独的 `0` 表示不限时）
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = || {
        format!(
            "Invalid duration '{}'. Use a number with a unit, e.g. 500ms, 30s, 1m30s, 2h",
            input
        )
    };

    let mut nanos = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let value: f64 = rest[..num_end].parse().map_err(|_| invalid())?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_end..];
        nanos += value * scale;
    }

    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}
