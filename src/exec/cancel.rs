//! # 取消令牌
//!
//! 进程启动时创建一次，显式传入工作池与每个操作。
//! 一旦触发不可撤销。

use crate::error::{GlobrunError, Result};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// 可跨线程共享的取消令牌
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 触发取消
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// 在 SIGINT / SIGTERM 时触发令牌
///
/// 每个进程只能安装一次。
pub fn install_interrupt_handler(token: &CancelToken) -> Result<()> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received, terminating running commands");
        eprintln!("\nInterrupt received, shutting down...");
        token.cancel();
    })
    .map_err(|e| GlobrunError::Signal(e.to_string()))
}
