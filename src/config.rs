//! # 运行配置
//!
//! 由命令行参数一次性构造的不可变配置，按引用传入匹配与执行阶段。
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 的 `RunArgs`
//! - 被 `commands/run.rs` 使用

use crate::cli::run::RunArgs;
use crate::error::{GlobrunError, Result};

use std::time::Duration;

/// 差异过滤所用的命令前缀
pub const DIFF_FILTER_PREFIX: [&str; 3] = ["git", "diff", "--exit-code"];

/// 一次 `run` 的完整配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// glob 模式列表
    pub patterns: Vec<String>,
    /// 在每个目录中执行的命令及参数
    pub command: Vec<String>,
    /// `git diff` 的附加参数；`Some` 时启用差异过滤
    pub git_diff: Option<Vec<String>>,
    /// 是否实时显示进度
    pub interactive: bool,
    /// 并行目录数
    pub concurrency: usize,
    /// 单个命令的时限
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// 使用默认设置创建配置（非交互、CPU 数并发、不限时）
    pub fn new(patterns: Vec<String>, command: Vec<String>) -> Self {
        Self {
            patterns,
            command,
            git_diff: None,
            interactive: false,
            concurrency: num_cpus::get(),
            timeout: None,
        }
    }

    /// 从命令行参数构造并校验
    ///
    /// 没有 `--` 时，第一个位置参数为模式，其余为命令。
    pub fn from_args(args: RunArgs) -> Result<Self> {
        let (patterns, command) = if args.command.is_empty() {
            let mut positional = args.patterns.into_iter();
            let pattern: Vec<String> = positional.next().into_iter().collect();
            (pattern, positional.collect())
        } else {
            (args.patterns, args.command)
        };

        if command.is_empty() {
            return Err(GlobrunError::InvalidArgument(
                "no command given; usage: globrun run \"PATTERN\" -- COMMAND".to_string(),
            ));
        }

        let diff_args = match args.git_diff.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(split_words(raw)?),
            _ => None,
        };

        let interactive = args
            .interactive
            .unwrap_or_else(|| console::Term::stdout().is_term());

        let config = Self::new(patterns, command)
            .interactive(interactive)
            .with_concurrency(args.max_concurrency.unwrap_or(0))
            .with_timeout(args.max_cmd_duration);

        Ok(match diff_args {
            Some(diff_args) => config.with_git_diff(diff_args),
            None => config,
        })
    }

    /// 设置并发度，0 表示 CPU 数
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = if concurrency == 0 {
            num_cpus::get()
        } else {
            concurrency
        };
        self
    }

    /// 设置单命令时限，零时长视为不限时
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// 启用 `git diff` 差异过滤
    pub fn with_git_diff(mut self, args: Vec<String>) -> Self {
        self.git_diff = Some(args);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// 差异过滤命令：`git diff --exit-code <args...>`
    pub fn filter_command(&self) -> Option<Vec<String>> {
        self.git_diff.as_ref().map(|extra| {
            DIFF_FILTER_PREFIX
                .iter()
                .map(|s| s.to_string())
                .chain(extra.iter().cloned())
                .collect()
        })
    }
}

/// 按 shell 规则拆分参数字符串
fn split_words(raw: &str) -> Result<Vec<String>> {
    shlex::split(raw)
        .ok_or_else(|| GlobrunError::InvalidArgument(format!("cannot split arguments: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(patterns: &[&str], command: &[&str]) -> RunArgs {
        RunArgs {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            command: command.iter().map(|s| s.to_string()).collect(),
            git_diff: None,
            interactive: Some(false),
            max_concurrency: None,
            max_cmd_duration: None,
        }
    }

    #[test]
    fn test_first_positional_is_pattern_without_dash() {
        let cfg = RunConfig::from_args(args(&["**/*.txt", "rm", "foo.txt"], &[])).unwrap();
        assert_eq!(cfg.patterns, vec!["**/*.txt"]);
        assert_eq!(cfg.command, vec!["rm", "foo.txt"]);
        assert_eq!(cfg.concurrency, num_cpus::get());
        assert!(cfg.timeout.is_none());
    }

    #[test]
    fn test_dash_separates_patterns() {
        let cfg = RunConfig::from_args(args(&["foo", "bar"], &["rm", "foo.txt"])).unwrap();
        assert_eq!(cfg.patterns, vec!["foo", "bar"]);
        assert_eq!(cfg.command, vec!["rm", "foo.txt"]);
    }

    #[test]
    fn test_missing_command_is_misuse() {
        let err = RunConfig::from_args(args(&["**/*.txt"], &[])).unwrap_err();
        assert!(matches!(err, GlobrunError::InvalidArgument(_)));
    }

    #[test]
    fn test_git_diff_args_are_shell_split() {
        let mut a = args(&["*"], &["true"]);
        a.git_diff = Some("main 'some dir'".to_string());
        let cfg = RunConfig::from_args(a).unwrap();

        assert_eq!(
            cfg.filter_command().unwrap(),
            vec!["git", "diff", "--exit-code", "main", "some dir"]
        );
    }

    #[test]
    fn test_unbalanced_quotes_rejected() {
        let mut a = args(&["*"], &["true"]);
        a.git_diff = Some("main 'oops".to_string());
        assert!(RunConfig::from_args(a).is_err());
    }

    #[test]
    fn test_zero_values_fall_back() {
        let mut a = args(&["*"], &["true"]);
        a.max_concurrency = Some(0);
        a.max_cmd_duration = Some(Duration::ZERO);
        let cfg = RunConfig::from_args(a).unwrap();
        assert_eq!(cfg.concurrency, num_cpus::get());
        assert!(cfg.timeout.is_none());

        let cfg = RunConfig::new(vec!["*".into()], vec!["true".into()])
            .with_concurrency(3)
            .with_timeout(Some(Duration::from_secs(2)));
        assert_eq!(cfg.concurrency, 3);
        assert_eq!(cfg.timeout, Some(Duration::from_secs(2)));
        assert!(cfg.filter_command().is_none());
    }
}
