//! # 日志初始化
//!
//! 使用 `tracing-subscriber` 输出到 stderr，`RUST_LOG` 优先于 `--verbose`。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用一次

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅者
pub fn init(verbose: bool) {
    let default = if verbose {
        "globrun=debug,warn"
    } else {
        "globrun=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // 重复初始化（例如测试中）时忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
