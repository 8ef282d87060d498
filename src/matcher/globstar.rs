//! # 递归 globstar 路径匹配器
//!
//! 将 glob 模式解析为有序、去重的路径列表，支持 `**` 段。
//!
//! ## 算法
//! 1. 不含 `**` 段的模式直接交给 `glob` crate 做逐层匹配
//! 2. 在第一个 `**` 处拆分为前缀与后缀（`**` 位于末尾时后缀为 `*`）
//! 3. 以前缀为根按文件名顺序遍历目录树，跳过无法读取的节点
//! 4. 对每个目录节点（包括根）递归解析 `<转义后的节点>/<后缀>`
//! 5. 按首次出现顺序合并、去重
//!
//! 多个 `**` 由第 4 步的递归逐个展开。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 调用
//! - 使用 `glob` 做单层匹配，`walkdir` 遍历目录树

use super::path::{clean_path, join_pattern};
use crate::error::{GlobrunError, Result};

use glob::MatchOptions;
use std::collections::HashSet;
use std::path::{Path, PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// globstar 段
pub const GLOBSTAR: &str = "**";

/// 递归 glob 匹配器
#[derive(Debug, Clone, Copy)]
pub struct PathMatcher {
    /// 单层匹配选项
    options: MatchOptions,
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PathMatcher {
    /// 创建匹配器（大小写敏感，`*` 可匹配以 `.` 开头的名称）
    pub fn new() -> Self {
        Self {
            options: MatchOptions::new(),
        }
    }

    /// 解析模式，返回所有匹配路径
    ///
    /// 没有匹配不是错误，返回空列表；只有语法错误（如未闭合的 `[`）才报错。
    pub fn resolve(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        if pattern.is_empty() {
            return Ok(Vec::new());
        }

        let segments: Vec<&str> = pattern.split(MAIN_SEPARATOR).collect();
        let Some(star) = segments.iter().position(|s| *s == GLOBSTAR) else {
            return self.shallow(pattern);
        };

        let root = walk_root(pattern, &segments[..star]);
        // 前缀本身含通配符时先逐层展开，再分别遍历
        let roots = if has_magic(&root.to_string_lossy()) {
            self.shallow(&root.to_string_lossy())?
        } else {
            vec![root]
        };
        let suffix = if star == segments.len() - 1 {
            "*".to_string()
        } else {
            segments[star + 1..].join(MAIN_SEPARATOR_STR)
        };
        debug!(pattern, roots = roots.len(), suffix = %suffix, "expanding globstar");

        let mut matches = Vec::new();
        let mut seen = HashSet::new();

        let walk = roots
            .iter()
            .flat_map(|root| WalkDir::new(root).follow_links(false).sort_by_file_name());
        for entry in walk {
            // 与单层 glob 一致：访问错误不终止枚举
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    trace!(error = %err, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            // 磁盘上的名称按字面匹配，不能被当作模式语法
            let node = glob::Pattern::escape(&entry.path().to_string_lossy());
            let nested = join_pattern(Path::new(&node), &suffix);
            for found in self.resolve(&nested)? {
                if seen.insert(found.clone()) {
                    matches.push(found);
                }
            }
        }

        Ok(matches)
    }

    /// 单层 glob（不含 `**` 段）
    fn shallow(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = collapse_stars(pattern);
        let paths =
            glob::glob_with(&pattern, self.options).map_err(|e| GlobrunError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;

        let mut matches = Vec::new();
        let mut seen = HashSet::new();
        for path in paths {
            match path {
                Ok(path) => {
                    let path = clean_path(&path);
                    if seen.insert(path.clone()) {
                        matches.push(path);
                    }
                }
                Err(err) => trace!(error = %err, "skipping unreadable path"),
            }
        }
        Ok(matches)
    }
}

/// 计算 globstar 前缀对应的遍历根
fn walk_root(pattern: &str, head: &[&str]) -> PathBuf {
    let root = clean_path(Path::new(&head.join(MAIN_SEPARATOR_STR)));
    if Path::new(pattern).is_absolute() && !root.is_absolute() {
        clean_path(&Path::new(MAIN_SEPARATOR_STR).join(root))
    } else {
        root
    }
}

/// 是否含有通配符
fn has_magic(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// 将段内连续的 `*` 折叠为一个（`**.txt` 等价于 `*.txt`）
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut prev_star = false;
    for c in pattern.chars() {
        if c == '*' && prev_star {
            continue;
        }
        prev_star = c == '*';
        out.push(c);
    }
    out
}
