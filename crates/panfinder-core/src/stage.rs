//! Collector run stages
//!
//! Every collector moves `Idle → Counting → Paginating → Enriching →
//! Writing → Done`. Any unhandled fault ends the run in `Failed`.

use std::fmt;

use indicatif::ProgressBar;

use crate::progress::ProgressContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Counting,
    Paginating,
    Enriching,
    Writing,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Counting => "counting",
            Self::Paginating => "paginating",
            Self::Enriching => "enriching",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current stage of one collector run, mirrored on its spinner line
pub struct StageTracker {
    name: String,
    stage: Stage,
    line: ProgressBar,
}

impl StageTracker {
    pub fn new(name: &str, progress: &ProgressContext) -> Self {
        Self {
            name: name.to_string(),
            stage: Stage::Idle,
            line: progress.stage_line(name),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spinner line of this run, for fine-grained status messages
    pub fn line(&self) -> &ProgressBar {
        &self.line
    }

    /// Move to `stage`. Terminal stages are final.
    pub fn enter(&mut self, stage: Stage) {
        if self.stage.is_terminal() {
            log::debug!("{}: ignoring {} after {}", self.name, stage, self.stage);
            return;
        }
        log::debug!("{}: {} -> {}", self.name, self.stage, stage);
        self.stage = stage;
        self.line.set_message(stage.to_string());
    }

    /// Settle the run: `Done` on success, `Failed` (logged with the stage
    /// it happened in) on error. The result is passed through.
    pub fn finish<T>(&mut self, result: anyhow::Result<T>) -> anyhow::Result<T> {
        match &result {
            Ok(_) => {
                self.enter(Stage::Done);
                self.line.finish_and_clear();
            }
            Err(e) => {
                log::error!("{}: failed while {}: {e:#}", self.name, self.stage);
                self.enter(Stage::Failed);
                self.line.abandon_with_message(format!("failed: {e}"));
            }
        }
        result
    }
}
