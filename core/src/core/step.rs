// merch-flow/src/core/step.rs

use super::FlowContext;

/// Evaluated before a step runs; `true` skips the step.
pub type SkipCondition<TData> = std::sync::Arc<dyn Fn(&FlowContext<TData>) -> bool + Send + Sync + 'static>;

/// What a failing handler does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
  /// The error ends the run and is returned to the caller.
  Required,
  /// The error is logged and recorded in the report; the run continues.
  /// A best-effort step without a handler is skipped.
  BestEffort,
}

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub policy: StepPolicy,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("policy", &self.policy)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
