//! # 路径词法规范化
//!
//! 不访问文件系统，只按词法折叠 `.`、`..` 与重复分隔符。
//! 用作匹配结果与目录的去重键。

use std::path::{Component, Path, PathBuf};

/// 按词法规范化路径
///
/// - 去掉 `.` 分量与尾部分隔符
/// - `..` 抵消前一个普通分量；根目录之上的 `..` 被丢弃
/// - 相对路径开头的 `..` 保留
/// - 空的相对路径变为 `.`
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

/// 在目录后拼接一段（可能含通配符的）模式，并规范化
pub fn join_pattern(dir: &Path, tail: &str) -> String {
    if tail.is_empty() {
        return clean_path(dir).to_string_lossy().into_owned();
    }
    clean_path(&dir.join(tail)).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("")), PathBuf::from("."));
        assert_eq!(clean_path(Path::new("./a/b/")), PathBuf::from("a/b"));
        assert_eq!(clean_path(Path::new("a//b/./c")), PathBuf::from("a/b/c"));
        assert_eq!(clean_path(Path::new("a/b/../c")), PathBuf::from("a/c"));
        assert_eq!(clean_path(Path::new("../a/..")), PathBuf::from(".."));
        assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_absolute_path() {
        assert_eq!(clean_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean_path(Path::new("/.")), PathBuf::from("/"));
    }

    #[cfg(unix)]
    #[test]
    fn test_join_pattern_keeps_wildcards() {
        assert_eq!(join_pattern(Path::new("."), "*.txt"), "*.txt");
        assert_eq!(join_pattern(Path::new("./a"), "b/*.txt"), "a/b/*.txt");
        assert_eq!(join_pattern(Path::new("a/b"), ""), "a/b");
    }
}
