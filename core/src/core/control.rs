// merch-flow/src/core/control.rs

//! Signals returned by handlers and the report produced by a flow run.

/// Returned by a handler to continue with the next step or halt the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  Continue,
  /// Stop immediately. Remaining steps are not run; the run still succeeds.
  Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every step ran, was skipped, or degraded.
  Completed,
  /// A handler returned `FlowControl::Halt`.
  Halted,
}

/// A best-effort step whose handler failed; the run carried on without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedStep {
  pub step: String,
  pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
  pub outcome: FlowOutcome,
  pub degraded: Vec<DegradedStep>,
  pub skipped: Vec<String>,
}

impl FlowReport {
  pub(crate) fn new() -> Self {
    Self {
      outcome: FlowOutcome::Completed,
      degraded: Vec::new(),
      skipped: Vec::new(),
    }
  }

  pub fn is_degraded(&self) -> bool {
    !self.degraded.is_empty()
  }

  pub fn degraded_step_names(&self) -> Vec<String> {
    self.degraded.iter().map(|d| d.step.clone()).collect()
  }

  pub fn was_skipped(&self, step: &str) -> bool {
    self.skipped.iter().any(|s| s == step)
  }
}
