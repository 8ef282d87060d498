//! # 工作池
//!
//! 以固定并发度在多个目录中执行同一条命令。
//!
//! ## 功能
//! - 所有操作先放入一个共享队列并关闭发送端，之后启动工作线程
//! - 每个工作线程反复领取下一个操作，直到队列耗尽（先到先得）
//! - 每个操作的超时从它实际开始执行时计算
//! - 取消后停止领取，正在运行的子进程被终止，未领取的操作保持 Pending
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 调用
//! - 使用 `rayon` 线程池承载工作线程，`crossbeam-channel` 作为工作队列

use super::cancel::CancelToken;
use super::operation::Operation;
use crate::error::{GlobrunError, Result};
use crate::models::RunResult;

use crossbeam_channel::Receiver;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// 等待结果时检查取消状态的间隔
pub const WAIT_TICK: Duration = Duration::from_millis(100);

/// 工作池运行统计
#[derive(Debug, Default)]
pub struct PoolStats {
    running: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl PoolStats {
    fn enter(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    /// 当前正在运行的操作数
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// 同时运行操作数的峰值
    pub fn peak_running(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// 已开始的操作数
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// 已结束的操作数
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

/// 一次提交的全部操作，顺序与输入目录一致
#[derive(Debug)]
pub struct Batch {
    operations: Vec<Arc<Operation>>,
    stats: Arc<PoolStats>,
}

impl Batch {
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// 已完成的操作数（非阻塞）
    pub fn completed(&self) -> usize {
        self.operations.iter().filter(|op| op.is_done()).count()
    }

    /// 按输入顺序等待全部操作；被取消而未运行的操作为 `None`
    #[cfg(test)]
    pub fn wait(&self, cancel: &CancelToken) -> Vec<Option<Arc<RunResult>>> {
        self.operations
            .iter()
            .map(|op| op.wait_or_abandon(cancel, WAIT_TICK, || {}))
            .collect()
    }
}

/// 有界并发的命令执行器
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    /// 并行工作线程数
    concurrency: usize,
    /// 单个操作的时限
    timeout: Option<Duration>,
}

impl WorkerPool {
    /// 创建工作池；`concurrency` 为 0 时使用 CPU 数，零时长视为不限时
    pub fn new(concurrency: usize, timeout: Option<Duration>) -> Self {
        let concurrency = if concurrency == 0 {
            num_cpus::get()
        } else {
            concurrency
        };
        Self {
            concurrency,
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// 在每个目录中启动命令，立即返回操作句柄
    pub fn run(
        &self,
        dirs: &[PathBuf],
        command: &[String],
        cancel: &CancelToken,
    ) -> Result<Batch> {
        let command: Arc<[String]> = command.into();
        let operations: Vec<Arc<Operation>> = dirs
            .iter()
            .map(|dir| Arc::new(Operation::new(dir.clone(), Arc::clone(&command))))
            .collect();
        let stats = Arc::new(PoolStats::default());

        if operations.is_empty() {
            return Ok(Batch { operations, stats });
        }

        let (queue_tx, queue_rx) = crossbeam_channel::unbounded();
        for op in &operations {
            queue_tx
                .send(Arc::clone(op))
                .map_err(|e| GlobrunError::ThreadPool(e.to_string()))?;
        }
        drop(queue_tx);

        let workers = self.concurrency.min(operations.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("globrun-worker-{}", i))
            .build()
            .map_err(|e| GlobrunError::ThreadPool(e.to_string()))?;

        info!(
            operations = operations.len(),
            workers,
            timeout = ?self.timeout,
            command = %command.join(" "),
            "starting worker pool"
        );

        for _ in 0..workers {
            let queue = queue_rx.clone();
            let cancel = cancel.clone();
            let stats = Arc::clone(&stats);
            let timeout = self.timeout;
            pool.spawn(move || work(queue, timeout, &cancel, &stats));
        }
        // 线程池在所有已提交任务完成后自行退出

        Ok(Batch { operations, stats })
    }
}

fn work(
    queue: Receiver<Arc<Operation>>,
    timeout: Option<Duration>,
    cancel: &CancelToken,
    stats: &PoolStats,
) {
    for op in queue.iter() {
        if !op.claim(cancel) {
            debug!("run cancelled, worker stopping");
            break;
        }
        stats.enter();
        trace!(dir = %op.dir().display(), running = stats.running(), "claimed operation");
        op.execute(timeout, cancel);
        stats.leave();
        // execute 返回时结果已写入，result() 不会阻塞
        debug!(dir = %op.dir().display(), status = %op.result().status, "operation complete");
    }
}
