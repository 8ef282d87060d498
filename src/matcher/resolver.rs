//! # 目录归约
//!
//! 将匹配路径归约为去重后的目标目录列表，保持首次出现顺序。
//! 匹配到目录时直接使用；匹配到文件时使用其所在目录。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 调用
//! - 使用 `matcher/path.rs` 的规范化作为去重键

use super::path::clean_path;
use crate::error::{GlobrunError, Result};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// 将匹配路径归约为唯一目录
///
/// 任何一个匹配无法 stat（例如在匹配后被删除）都会使整个运行失败。
pub fn reduce(matches: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut seen = HashSet::new();

    for m in matches {
        let meta = fs::metadata(m).map_err(|e| GlobrunError::Setup {
            path: m.clone(),
            source: e,
        })?;

        let dir = if meta.is_dir() {
            clean_path(m)
        } else {
            containing_dir(m)
        };

        if seen.insert(dir.clone()) {
            trace!(dir = %dir.display(), "collected directory");
            dirs.push(dir);
        }
    }

    Ok(dirs)
}

/// 文件所在目录；没有父级分量时为 `.`
fn containing_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => clean_path(parent),
        _ => PathBuf::from("."),
    }
}
