//! # run 命令实现
//!
//! 在匹配模式的每个目录中并行执行命令，并汇总结果。
//!
//! ## 流程
//! 1. 解析所有模式（`rayon` 并行，保持模式顺序），归约为唯一目录
//! 2. 可选：用 `git diff --exit-code` 过滤掉没有改动的目录
//! 3. 在剩余目录中启动工作池
//! 4. 按目录原始顺序等待并输出每个目录的结果
//! 5. 打印汇总，计算整体结果
//!
//! ## 依赖关系
//! - 使用 `config.rs` 的 `RunConfig`
//! - 使用 `matcher/`、`exec/`、`report/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::run::RunArgs;
use crate::config::RunConfig;
use crate::error::{GlobrunError, Result};
use crate::exec::{Batch, CancelToken, Operation, WorkerPool, WAIT_TICK};
use crate::matcher::{self, PathMatcher};
use crate::models::{RunResult, StatusType};
use crate::report::{self, Disposition, Entry, Summary};
use crate::utils::{output, progress};

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// 一次运行的完整结果
#[derive(Debug)]
pub struct RunOutcome {
    /// 按目录原始顺序
    pub entries: Vec<Entry>,
    pub summary: Summary,
    pub disposition: Disposition,
}

/// 执行 run 命令
pub fn execute(args: RunArgs, cancel: &CancelToken) -> Result<Disposition> {
    let config = RunConfig::from_args(args)?;
    let outcome = run(&config, cancel)?;
    debug!(
        directories = outcome.entries.len(),
        total = outcome.summary.total(),
        "run complete"
    );
    Ok(outcome.disposition)
}

/// 按配置运行
pub fn run(config: &RunConfig, cancel: &CancelToken) -> Result<RunOutcome> {
    let dirs = collect_directories(config)?;
    let pool = WorkerPool::new(config.concurrency, config.timeout);

    let selected = match config.filter_command() {
        Some(filter) => filter_changed(&pool, &dirs, &filter, config.interactive, cancel)?,
        None => vec![true; dirs.len()],
    };
    let targets: Vec<PathBuf> = dirs
        .iter()
        .zip(&selected)
        .filter(|(_, keep)| **keep)
        .map(|(dir, _)| dir.clone())
        .collect();

    output::print_info(&format!(
        "Running command(s) in {} of {} directories...",
        targets.len(),
        dirs.len()
    ));
    let batch = pool.run(&targets, &config.command, cancel)?;
    if batch.is_empty() {
        output::print_info("No directories left to run after filtering");
    }

    // 被过滤的目录以 SKIPPED 插回原始位置
    let command: Arc<[String]> = config.command.as_slice().into();
    let mut launched = batch.operations().iter();
    let mut operations = Vec::with_capacity(dirs.len());
    for (dir, keep) in dirs.iter().zip(&selected) {
        if !*keep {
            let skipped = Operation::skipped(dir.clone(), Arc::clone(&command));
            operations.push(Arc::new(skipped));
        } else if let Some(op) = launched.next() {
            operations.push(Arc::clone(op));
        }
    }

    let entries = stream_results(&operations, &batch, config.interactive, cancel);
    let summary = report::print_summary(&entries);
    let disposition = Disposition::from_entries(&entries, cancel.is_cancelled());
    let stats = batch.stats();
    info!(
        ?summary,
        ?disposition,
        concurrency = pool.concurrency(),
        timeout = ?pool.timeout(),
        started = stats.started(),
        finished = stats.finished(),
        peak = stats.peak_running(),
        "run finished"
    );

    match disposition {
        Disposition::Success => output::print_done("All commands succeeded"),
        Disposition::Failed => output::print_warning(&format!(
            "{} failed, {} errored",
            summary.failure, summary.error
        )),
        Disposition::Interrupted => output::print_warning("Run interrupted before completion"),
    }

    Ok(RunOutcome {
        entries,
        summary,
        disposition,
    })
}

/// 解析所有模式并归约为唯一目录
fn collect_directories(config: &RunConfig) -> Result<Vec<PathBuf>> {
    let spinner = progress::create_spinner(
        "Collecting directories that match pattern...",
        config.interactive,
    );
    let matcher = PathMatcher::new();
    let resolved: Result<Vec<Vec<PathBuf>>> = config
        .patterns
        .par_iter()
        .map(|pattern| matcher.resolve(pattern))
        .collect();
    spinner.finish_and_clear();

    let matches: Vec<PathBuf> = resolved?.into_iter().flatten().collect();
    if matches.is_empty() {
        return Err(GlobrunError::NoMatch {
            patterns: config.patterns.join(" "),
        });
    }

    let dirs = matcher::reduce(&matches)?;
    debug!(matches = matches.len(), dirs = dirs.len(), "patterns resolved");
    output::print_info(&format!(
        "Collected {} matches in {} directories",
        matches.len(),
        dirs.len()
    ));
    Ok(dirs)
}

/// 只保留 `git diff --exit-code` 未返回成功（即存在改动）的目录
fn filter_changed(
    pool: &WorkerPool,
    dirs: &[PathBuf],
    filter: &[String],
    interactive: bool,
    cancel: &CancelToken,
) -> Result<Vec<bool>> {
    output::print_info("Checking for changes with \"git diff\"...");
    let batch = pool.run(dirs, filter, cancel)?;
    let pb = progress::create_progress_bar(
        batch.len() as u64,
        "Checking for changes with git diff",
        interactive,
    );

    let keep = batch
        .operations()
        .iter()
        .map(|op| {
            let result = wait_with_progress(op, &batch, &pb, cancel);
            let changed = result.map_or(true, |r| r.status != StatusType::Success);
            debug!(dir = %op.dir().display(), changed, "diff filter");
            changed
        })
        .collect();

    pb.finish_and_clear();
    Ok(keep)
}

/// 按原始顺序等待每个操作并输出其结果
fn stream_results(
    operations: &[Arc<Operation>],
    batch: &Batch,
    interactive: bool,
    cancel: &CancelToken,
) -> Vec<Entry> {
    let pb = progress::create_progress_bar(batch.len() as u64, "Running command(s)", interactive);

    let entries = operations
        .iter()
        .map(|op| {
            let entry = Entry::new(
                op.dir().to_path_buf(),
                wait_with_progress(op, batch, &pb, cancel),
            );
            pb.suspend(|| print_entry(&entry));
            entry
        })
        .collect();

    pb.finish_and_clear();
    entries
}

/// 等待单个操作，期间刷新进度；取消后从未开始的操作返回 `None`
fn wait_with_progress(
    op: &Operation,
    batch: &Batch,
    pb: &ProgressBar,
    cancel: &CancelToken,
) -> Option<Arc<RunResult>> {
    let result = op.wait_or_abandon(cancel, WAIT_TICK, || {
        pb.set_position(batch.completed() as u64)
    });
    pb.set_position(batch.completed() as u64);
    result
}

fn print_entry(entry: &Entry) {
    output::print_banner(&entry.dir.display().to_string());
    let Some(res) = entry.result.as_deref() else {
        println!("err: interrupted before start\n");
        return;
    };
    if res.status == StatusType::Skipped {
        return;
    }

    println!("{}", res.stdall_text());
    if let Some(err) = &res.error {
        debug!(dir = %entry.dir.display(), killed = err.is_cancellation(), "operation error");
        println!("\nerr: {}", err);
    }
    println!();
}
