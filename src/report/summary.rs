//! # 汇总输出
//!
//! 各终态计数表，以及每个目录一行的 `path/to/dir.......[ STATUS]`。

use super::Entry;
use crate::models::StatusType;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 状态行中目录名的最大显示宽度
const DIR_WIDTH: usize = 67;
/// 目录名与填充点的总宽度
const LINE_WIDTH: usize = 70;

/// 各终态计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
    pub error: usize,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Count")]
    count: usize,
}

impl Summary {
    pub fn tally(entries: &[Entry]) -> Self {
        let mut summary = Summary::default();
        for entry in entries {
            match entry.status() {
                StatusType::Success => summary.success += 1,
                StatusType::Failure => summary.failure += 1,
                StatusType::Skipped => summary.skipped += 1,
                StatusType::Error => summary.error += 1,
            }
        }
        summary
    }

    pub fn count(&self, status: StatusType) -> usize {
        match status {
            StatusType::Success => self.success,
            StatusType::Failure => self.failure,
            StatusType::Skipped => self.skipped,
            StatusType::Error => self.error,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.failure + self.skipped + self.error
    }

    /// 计数表
    pub fn table(&self) -> String {
        let rows: Vec<CountRow> = StatusType::ALL
            .iter()
            .map(|s| CountRow {
                status: s.to_string(),
                count: self.count(*s),
            })
            .collect();
        Table::new(rows).to_string()
    }
}

/// 单个目录的状态行（不着色）
pub fn status_line(dir: &str, status: StatusType) -> String {
    let shown: String = dir.chars().take(DIR_WIDTH).collect();
    let pad = LINE_WIDTH - shown.chars().count();
    format!("{}{}[{:>8}]", shown, ".".repeat(pad), status)
}

/// 打印汇总：计数表 + 每个未跳过目录的状态行
pub fn print_summary(entries: &[Entry]) -> Summary {
    let summary = Summary::tally(entries);

    output::print_banner("Summary");
    println!("{}", summary.table());
    println!();

    for entry in entries {
        let status = entry.status();
        if status == StatusType::Skipped {
            continue;
        }
        let line = status_line(&entry.dir.display().to_string(), status);
        println!("{}", output::paint_status(status, &line));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunResult;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn test_status_line_layout() {
        let line = status_line("foo", StatusType::Failure);
        assert!(line.starts_with("foo..."));
        assert!(line.ends_with("[ FAILURE]"));
        assert_eq!(line.chars().count(), LINE_WIDTH + 10);
    }

    #[test]
    fn test_status_line_truncates_long_dirs() {
        let long = "d".repeat(100);
        let line = status_line(&long, StatusType::Success);
        assert_eq!(line, format!("{}...[ SUCCESS]", "d".repeat(DIR_WIDTH)));
    }

    #[test]
    fn test_tally() {
        let entries = vec![
            Entry::new(
                PathBuf::from("a"),
                Some(Arc::new(RunResult::finished(vec![], vec![], vec![], true))),
            ),
            Entry::new(PathBuf::from("b"), Some(Arc::new(RunResult::skipped()))),
            Entry::new(PathBuf::from("c"), None),
        ];
        let summary = Summary::tally(&entries);
        assert_eq!(
            summary,
            Summary {
                success: 1,
                failure: 0,
                skipped: 1,
                error: 1
            }
        );
        assert_eq!(summary.total(), 3);
        assert!(summary.table().contains("SKIPPED"));
    }
}
