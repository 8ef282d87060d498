//! # 单目录操作
//!
//! 一个 [`Operation`] 表示在一个目标目录中执行一次命令。
//!
//! ## 生命周期
//! ```text
//! Pending ──claim──> Running ──> Done(SUCCESS | FAILURE | ERROR)
//! Pending ─────────────────────> Done(SKIPPED)   (仅限上游过滤)
//! ```
//! 结果只写入一次，之后不可变；完成信号由 `Mutex` + `Condvar` 提供，
//! 可被任意多个读者并发等待。
//!
//! ## 依赖关系
//! - 被 `exec/pool.rs` 调度
//! - 结果类型来自 `models/outcome.rs`

use super::cancel::CancelToken;
use crate::error::OperationError;
use crate::models::RunResult;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// 轮询子进程状态的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// 强制终止后等待输出管道关闭的最长时间
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// 操作所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Running,
    Complete,
}

#[derive(Debug)]
enum Slot {
    Pending,
    Running,
    Done(Arc<RunResult>),
}

/// 在一个目录中执行一次命令
#[derive(Debug)]
pub struct Operation {
    dir: PathBuf,
    command: Arc<[String]>,
    slot: Mutex<Slot>,
    done: Condvar,
}

impl Operation {
    /// 创建待执行的操作
    pub fn new(dir: PathBuf, command: Arc<[String]>) -> Self {
        Self {
            dir,
            command,
            slot: Mutex::new(Slot::Pending),
            done: Condvar::new(),
        }
    }

    /// 创建已被上游过滤的操作（状态为 SKIPPED，立即完成）
    pub fn skipped(dir: PathBuf, command: Arc<[String]>) -> Self {
        Self {
            dir,
            command,
            slot: Mutex::new(Slot::Done(Arc::new(RunResult::skipped()))),
            done: Condvar::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    pub fn phase(&self) -> Phase {
        match *self.slot() {
            Slot::Pending => Phase::Pending,
            Slot::Running => Phase::Running,
            Slot::Done(_) => Phase::Complete,
        }
    }

    /// 非阻塞：是否已完成
    pub fn is_done(&self) -> bool {
        self.phase() == Phase::Complete
    }

    /// 取消后仍未被领取的操作永远不会完成
    pub fn is_abandoned(&self, cancel: &CancelToken) -> bool {
        cancel.is_cancelled() && self.phase() == Phase::Pending
    }

    /// 阻塞直到完成并返回结果
    ///
    /// 对被取消而从未运行的操作调用会永久阻塞，此时应使用 [`Operation::wait_or_abandon`]。
    pub fn result(&self) -> Arc<RunResult> {
        let mut slot = self.slot();
        loop {
            if let Slot::Done(result) = &*slot {
                return Arc::clone(result);
            }
            slot = self
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// 最多等待 `timeout`
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Arc<RunResult>> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot();
        loop {
            if let Slot::Done(result) = &*slot {
                return Some(Arc::clone(result));
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            slot = match self.done.wait_timeout(slot, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// 等待完成，每个 `tick` 未完成时回调一次 `on_tick`
    ///
    /// 若运行已被取消且本操作从未开始，返回 `None`。
    pub fn wait_or_abandon(
        &self,
        cancel: &CancelToken,
        tick: Duration,
        mut on_tick: impl FnMut(),
    ) -> Option<Arc<RunResult>> {
        loop {
            if let Some(result) = self.wait_timeout(tick) {
                return Some(result);
            }
            on_tick();
            if self.is_abandoned(cancel) {
                return None;
            }
        }
    }

    /// 领取操作：Pending -> Running
    ///
    /// 取消之后不再领取任何操作。
    pub(crate) fn claim(&self, cancel: &CancelToken) -> bool {
        let mut slot = self.slot();
        if cancel.is_cancelled() || !matches!(*slot, Slot::Pending) {
            return false;
        }
        *slot = Slot::Running;
        true
    }

    /// 运行命令直到结束并写入结果
    pub(crate) fn execute(&self, timeout: Option<Duration>, cancel: &CancelToken) {
        let result = self.run(timeout, cancel);
        self.complete(result);
    }

    fn complete(&self, result: RunResult) {
        let mut slot = self.slot();
        if matches!(*slot, Slot::Done(_)) {
            return;
        }
        *slot = Slot::Done(Arc::new(result));
        drop(slot);
        self.done.notify_all();
    }

    fn run(&self, timeout: Option<Duration>, cancel: &CancelToken) -> RunResult {
        let command = self.command_line();
        let Some((program, args)) = self.command.split_first() else {
            return RunResult::errored(
                Vec::new(),
                Vec::new(),
                Vec::new(),
                OperationError::Launch {
                    command,
                    source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
                },
            );
        };

        let spawned = Command::new(program)
            .args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                return RunResult::errored(
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    OperationError::Launch { command, source },
                )
            }
        };
        debug!(pid = child.id(), dir = %self.dir.display(), command = %command, "spawned");

        let deadline = timeout.map(|limit| (Instant::now() + limit, limit));
        let capture = Capture::attach(&mut child);
        let (status, killed) = supervise(&mut child, deadline, cancel);
        // 子进程已退出，但其后台子孙可能仍持有输出管道
        let (stdout, stderr, stdall, overrun) = capture.drain(killed, deadline, cancel);
        let killed = killed.or(overrun);

        match status {
            Ok(status) => classify(status, killed, cancel, command, stdout, stderr, stdall),
            Err(source) => {
                RunResult::errored(stdout, stderr, stdall, OperationError::Io { command, source })
            }
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 子进程被强制终止的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KillReason {
    Interrupted,
    TimedOut(Duration),
}

/// 等待子进程退出；取消或超时时强制终止
///
/// 超时从本操作开始执行时计时，不包含排队时间。
fn supervise(
    child: &mut Child,
    deadline: Option<(Instant, Duration)>,
    cancel: &CancelToken,
) -> (io::Result<ExitStatus>, Option<KillReason>) {
    let mut killed = None;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return (Ok(status), killed),
            Ok(None) => {}
            Err(e) => {
                let _ = child.kill();
                return (Err(e), killed);
            }
        }

        if killed.is_none() {
            if let Some(reason) = overrun(deadline, cancel) {
                debug!(pid = child.id(), ?reason, "killing command");
                // kill 失败说明进程已自行退出，下一轮 try_wait 取其真实状态
                match child.kill() {
                    Ok(()) => killed = Some(reason),
                    Err(e) => trace!(error = %e, "kill failed, process already exited"),
                }
            }
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// 取消优先于超时
fn overrun(deadline: Option<(Instant, Duration)>, cancel: &CancelToken) -> Option<KillReason> {
    if cancel.is_cancelled() {
        return Some(KillReason::Interrupted);
    }
    deadline
        .filter(|(at, _)| Instant::now() >= *at)
        .map(|(_, limit)| KillReason::TimedOut(limit))
}

/// 由退出状态推导终态
fn classify(
    status: ExitStatus,
    killed: Option<KillReason>,
    cancel: &CancelToken,
    command: String,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    stdall: Vec<u8>,
) -> RunResult {
    // 终端 Ctrl-C 也会直接发给子进程，它可能先于我们的 kill 退出
    let reason = killed.or_else(|| {
        (status.code().is_none() && cancel.is_cancelled()).then_some(KillReason::Interrupted)
    });

    let error = match (reason, status.code()) {
        (None, Some(code)) => return RunResult::finished(stdout, stderr, stdall, code == 0),
        (Some(KillReason::Interrupted), _) => OperationError::Interrupted { command },
        (Some(KillReason::TimedOut(limit)), _) => OperationError::TimedOut { command, limit },
        (None, None) => OperationError::Signaled {
            command,
            signal: signal_number(&status),
        },
    };
    RunResult::errored(stdout, stderr, stdall, error)
}

#[cfg(unix)]
fn signal_number(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_number(_status: &ExitStatus) -> i32 {
    -1
}

type SharedBuf = Arc<Mutex<Vec<u8>>>;

/// 子进程输出捕获：stdout、stderr 各自一份，另有一份按到达顺序交错
struct Capture {
    stdout: SharedBuf,
    stderr: SharedBuf,
    stdall: SharedBuf,
    readers: Vec<JoinHandle<()>>,
}

impl Capture {
    fn attach(child: &mut Child) -> Self {
        let stdout = SharedBuf::default();
        let stderr = SharedBuf::default();
        let stdall = SharedBuf::default();

        let mut readers = Vec::with_capacity(2);
        if let Some(pipe) = child.stdout.take() {
            readers.push(copy_stream(pipe, Arc::clone(&stdout), Arc::clone(&stdall)));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(copy_stream(pipe, Arc::clone(&stderr), Arc::clone(&stdall)));
        }

        Self {
            stdout,
            stderr,
            stdall,
            readers,
        }
    }

    /// 等待读取线程结束并取出缓冲区
    ///
    /// 子进程被杀死后最多再等 `DRAIN_GRACE`；否则等待受同一时限与取消约束，
    /// 越界时返回已读到的部分输出及越界原因。
    fn drain(
        self,
        killed: Option<KillReason>,
        deadline: Option<(Instant, Duration)>,
        cancel: &CancelToken,
    ) -> (Vec<u8>, Vec<u8>, Vec<u8>, Option<KillReason>) {
        let Capture {
            stdout,
            stderr,
            stdall,
            readers,
        } = self;

        let grace_until = killed.map(|_| Instant::now() + DRAIN_GRACE);
        let mut exceeded = None;
        for reader in readers {
            while !reader.is_finished() && exceeded.is_none() {
                match grace_until {
                    Some(until) if Instant::now() >= until => break,
                    Some(_) => {}
                    None => exceeded = overrun(deadline, cancel),
                }
                if exceeded.is_none() {
                    thread::sleep(POLL_INTERVAL);
                }
            }
            if reader.is_finished() {
                let _ = reader.join();
            } else {
                trace!("output pipe still held open, leaving reader behind");
            }
        }
        if let Some(reason) = exceeded {
            debug!(?reason, "output not closed in time");
        }

        (take(&stdout), take(&stderr), take(&stdall), exceeded)
    }
}

fn copy_stream<R>(mut pipe: R, own: SharedBuf, all: SharedBuf) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    lock(&own).extend_from_slice(&buf[..n]);
                    lock(&all).extend_from_slice(&buf[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    })
}

fn lock(buf: &SharedBuf) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take(buf: &SharedBuf) -> Vec<u8> {
    std::mem::take(&mut *lock(buf))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use crate::models::StatusType;

    fn command(args: &[&str]) -> Arc<[String]> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn run_in(dir: &Path, args: &[&str], timeout: Option<Duration>) -> Arc<RunResult> {
        let cancel = CancelToken::new();
        let op = Operation::new(dir.to_path_buf(), command(args));
        assert_eq!(op.phase(), Phase::Pending);
        assert!(op.claim(&cancel));
        assert_eq!(op.phase(), Phase::Running);
        op.execute(timeout, &cancel);
        assert!(op.is_done());
        op.result()
    }

    #[test]
    fn test_exit_codes_map_to_status() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(run_in(dir.path(), &["true"], None).status, StatusType::Success);

        let failed = run_in(dir.path(), &["false"], None);
        assert_eq!(failed.status, StatusType::Failure);
        assert!(failed.error.is_none());
    }

    #[test]
    fn test_captures_streams() {
        let dir = tempfile::tempdir().unwrap();
        let res = run_in(dir.path(), &["sh", "-c", "echo out; echo err 1>&2"], None);

        assert_eq!(res.status, StatusType::Success);
        assert_eq!(res.stdout_text(), "out\n");
        assert_eq!(res.stderr_text(), "err\n");
        let all = res.stdall_text();
        assert!(all.contains("out\n"));
        assert!(all.contains("err\n"));
        assert_eq!(res.stdall.len(), res.stdout.len() + res.stderr.len());
    }

    #[test]
    fn test_runs_in_target_directory() {
        let dir = tempfile::tempdir().unwrap();
        let res = run_in(dir.path(), &["pwd"], None);

        let reported = PathBuf::from(res.stdout_text().trim());
        assert_eq!(
            std::fs::canonicalize(reported).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_launch_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = run_in(dir.path(), &["globrun-definitely-not-a-binary"], None);

        assert_eq!(res.status, StatusType::Error);
        assert!(matches!(res.error, Some(OperationError::Launch { .. })));
    }

    #[test]
    fn test_timeout_kills_command() {
        let dir = tempfile::tempdir().unwrap();
        let started = Instant::now();
        let res = run_in(dir.path(), &["sleep", "5"], Some(Duration::from_millis(200)));

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(res.status, StatusType::Error);
        let err = res.error.as_ref().unwrap();
        assert!(matches!(err, OperationError::TimedOut { .. }));
        assert!(err.to_string().contains("signal: killed"));
    }

    #[test]
    fn test_timeout_covers_background_output_holder() {
        let dir = tempfile::tempdir().unwrap();
        let started = Instant::now();
        let res = run_in(
            dir.path(),
            &["sh", "-c", "sleep 4 & echo hi"],
            Some(Duration::from_millis(300)),
        );

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(res.status, StatusType::Error);
        assert!(matches!(res.error, Some(OperationError::TimedOut { .. })));
        assert_eq!(res.stdout_text(), "hi\n");
    }

    #[test]
    fn test_cancel_covers_background_output_holder() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        let op = Operation::new(
            dir.path().to_path_buf(),
            command(&["sh", "-c", "sleep 4 & echo hi"]),
        );
        assert!(op.claim(&cancel));

        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            trigger.cancel();
        });

        let started = Instant::now();
        op.execute(None, &cancel);
        canceller.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        let res = op.result();
        assert_eq!(res.status, StatusType::Error);
        assert!(matches!(res.error, Some(OperationError::Interrupted { .. })));
    }

    #[test]
    fn test_exit_before_deadline_keeps_true_status() {
        let dir = tempfile::tempdir().unwrap();
        let res = run_in(dir.path(), &["true"], Some(Duration::from_secs(5)));
        assert_eq!(res.status, StatusType::Success);
        assert!(res.error.is_none());

        let deadline = Some((Instant::now(), Duration::ZERO));
        assert_eq!(
            overrun(deadline, &CancelToken::new()),
            Some(KillReason::TimedOut(Duration::ZERO))
        );
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(overrun(deadline, &cancel), Some(KillReason::Interrupted));
        assert_eq!(overrun(None, &CancelToken::new()), None);
    }

    #[test]
    fn test_signal_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = run_in(dir.path(), &["sh", "-c", "kill -9 $$"], None);

        assert_eq!(res.status, StatusType::Error);
        assert!(matches!(
            res.error,
            Some(OperationError::Signaled { signal: 9, .. })
        ));
    }

    #[test]
    fn test_no_claim_after_cancel() {
        let cancel = CancelToken::new();
        let op = Operation::new(PathBuf::from("."), command(&["true"]));
        cancel.cancel();

        assert!(!op.claim(&cancel));
        assert!(op.is_abandoned(&cancel));
        let mut ticks = 0;
        assert!(op
            .wait_or_abandon(&cancel, Duration::from_millis(10), || ticks += 1)
            .is_none());
        assert_eq!(ticks, 1);
        assert!(op.wait_timeout(Duration::ZERO).is_none());
    }

    #[test]
    fn test_skipped_is_complete() {
        let op = Operation::skipped(PathBuf::from("bar"), command(&["true"]));
        assert!(op.is_done());
        assert_eq!(op.result().status, StatusType::Skipped);
        assert_eq!(op.command_line(), "true");
    }

    #[test]
    fn test_result_shared_between_readers() {
        let dir = tempfile::tempdir().unwrap();
        let op = Arc::new(Operation::new(dir.path().to_path_buf(), command(&["true"])));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let op = Arc::clone(&op);
                thread::spawn(move || op.result().status)
            })
            .collect();

        let cancel = CancelToken::new();
        assert!(op.claim(&cancel));
        op.execute(None, &cancel);

        for reader in readers {
            assert_eq!(reader.join().unwrap(), StatusType::Success);
        }
    }
}
