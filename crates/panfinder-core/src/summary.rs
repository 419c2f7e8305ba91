//! End-of-run summary shared by all collectors

use std::path::PathBuf;
use std::time::Duration;

use crate::progress::fmt_num;

/// Summary of one collector run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub collector: &'static str,
    /// Top-level records considered
    pub records: usize,
    /// Composite entries written
    pub entries: usize,
    /// Records skipped because their output already existed
    pub skipped: usize,
    /// Records dropped or degraded by an enrichment fault
    pub failed: usize,
    /// Output files created
    pub files: Vec<PathBuf>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn empty(collector: &'static str) -> Self {
        Self {
            collector,
            records: 0,
            entries: 0,
            skipped: 0,
            failed: 0,
            files: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Label/value rows for a summary table
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Records", fmt_num(self.records)),
            ("Entries written", fmt_num(self.entries)),
        ];
        if self.skipped > 0 {
            rows.push(("Already collected", fmt_num(self.skipped)));
        }
        rows.push(("Enrichment faults", fmt_num(self.failed)));
        match self.files.as_slice() {
            [] => {}
            [one] => rows.push(("Output", one.display().to_string())),
            many => rows.push(("Output files", fmt_num(many.len()))),
        }
        rows.push(("Time", format!("{:.1}s", self.elapsed.as_secs_f64())));
        rows
    }

    pub fn log(&self) {
        log::info!("=== {} summary ===", self.collector);
        for (label, value) in self.rows() {
            log::info!("{label}: {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_summary() {
        let summary = RunSummary::empty("desy");
        assert_eq!(summary.collector, "desy");
        assert_eq!(summary.entries, 0);
        assert!(summary.files.is_empty());
        assert_eq!(summary.elapsed, Duration::ZERO);
    }

    #[test]
    fn rows_single_output_shows_path() {
        let summary = RunSummary {
            records: 2500,
            entries: 2500,
            files: vec![PathBuf::from("/data/out.json")],
            ..RunSummary::empty("desy")
        };
        let rows = summary.rows();
        assert!(rows.contains(&("Records", "2,500".to_string())));
        assert!(rows.contains(&("Output", "/data/out.json".to_string())));
        assert!(!rows.iter().any(|(label, _)| *label == "Already collected"));
    }

    #[test]
    fn rows_many_outputs_shows_count() {
        let summary = RunSummary {
            skipped: 3,
            files: vec![PathBuf::from("a"), PathBuf::from("b")],
            ..RunSummary::empty("esrf-catalogue")
        };
        let rows = summary.rows();
        assert!(rows.contains(&("Output files", "2".to_string())));
        assert!(rows.contains(&("Already collected", "3".to_string())));
    }

    #[test]
    fn log_does_not_panic() {
        RunSummary::empty("ill").log();
    }
}
