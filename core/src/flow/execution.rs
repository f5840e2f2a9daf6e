// merch-flow/src/flow/execution.rs

use crate::core::context_data::FlowContext;
use crate::core::control::{DegradedStep, FlowControl, FlowOutcome, FlowReport};
use crate::core::step::StepPolicy;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use tracing::{debug, error, info, info_span, warn, Instrument};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in declaration order against `ctx`.
  ///
  /// A required step's error is returned as-is. A best-effort step's error is
  /// logged and recorded in the returned report.
  pub async fn run(&self, ctx: FlowContext<TData>) -> Result<FlowReport, Err> {
    let mut report = FlowReport::new();
    debug!(flow = %self.name, num_steps = self.steps.len(), "Flow run starting.");

    for (idx, step) in self.steps.iter().enumerate() {
      let step_name = step.name.as_str();

      if let Some(skip_if) = &step.skip_if {
        if skip_if(&ctx) {
          debug!(flow = %self.name, step = step_name, "Step skipped by condition.");
          report.skipped.push(step.name.clone());
          continue;
        }
      }

      let Some(handler) = self.handlers.get(step_name) else {
        match step.policy {
          StepPolicy::BestEffort => {
            debug!(flow = %self.name, step = step_name, "Best-effort step has no handler, skipping.");
            report.skipped.push(step.name.clone());
            continue;
          }
          StepPolicy::Required => {
            error!(flow = %self.name, step = step_name, "Required step has no handler.");
            return Err(Err::from(FlowError::HandlerMissing {
              step_name: step.name.clone(),
            }));
          }
        }
      };

      let span = info_span!("flow_step", flow = %self.name, step = step_name, index = idx, policy = ?step.policy);
      match handler(ctx.clone()).instrument(span).await {
        Ok(FlowControl::Continue) => {}
        Ok(FlowControl::Halt) => {
          info!(flow = %self.name, step = step_name, "Flow halted by step.");
          report.outcome = FlowOutcome::Halted;
          return Ok(report);
        }
        Err(e) => match step.policy {
          StepPolicy::Required => {
            error!(flow = %self.name, step = step_name, error = %e, "Required step failed.");
            return Err(e);
          }
          StepPolicy::BestEffort => {
            warn!(flow = %self.name, step = step_name, error = %e, "Best-effort step failed, continuing.");
            report.degraded.push(DegradedStep {
              step: step.name.clone(),
              error: e.to_string(),
            });
          }
        },
      }
    }

    debug!(
      flow = %self.name,
      degraded = report.degraded.len(),
      skipped = report.skipped.len(),
      "Flow run completed."
    );
    Ok(report)
  }
}
