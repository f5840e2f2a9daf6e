// merch-flow/src/flow/definition.rs

//! `Flow<TData, Err>`: an ordered set of named steps plus one handler per step.

use crate::core::context_data::FlowContext;
use crate::core::control::FlowControl;
use crate::core::step::{SkipCondition, StepDef, StepPolicy};
use crate::error::FlowError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Async step handler. Takes a clone of the shared context.
///
/// Lock guards taken on the context must be dropped before awaiting.
pub type Handler<TData, Err> =
  Box<dyn Fn(FlowContext<TData>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>> + Send + Sync>;

pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, Handler<TData, Err>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(step_defs: &[(&str, StepPolicy, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, policy, skip_if)| StepDef {
        name: (*name).to_string(),
        policy: *policy,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name: std::any::type_name::<TData>().to_string(),
      steps,
      handlers: HashMap::new(),
    }
  }

  /// Overrides the name used in tracing spans (defaults to the context type name).
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn policy_of(&self, step_name: &str) -> Option<StepPolicy> {
    self.steps.iter().find(|s| s.name == step_name).map(|s| s.policy)
  }

  /// Attaches the handler for `step_name`, replacing any previous one.
  ///
  /// Panics if the step was not declared in `Flow::new`; that is a wiring
  /// mistake caught at startup.
  pub fn on_step<F>(&mut self, step_name: &str, handler: F) -> &mut Self
  where
    F: Fn(FlowContext<TData>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>> + Send + Sync + 'static,
  {
    if let Err(e) = self.try_on_step(step_name, handler) {
      panic!("flow setup error: {}", e);
    }
    self
  }

  pub fn try_on_step<F>(&mut self, step_name: &str, handler: F) -> Result<(), FlowError>
  where
    F: Fn(FlowContext<TData>) -> Pin<Box<dyn Future<Output = Result<FlowControl, Err>> + Send>> + Send + Sync + 'static,
  {
    if !self.steps.iter().any(|s| s.name == step_name) {
      return Err(FlowError::StepNotFound {
        step_name: step_name.to_string(),
      });
    }
    self.handlers.insert(step_name.to_string(), Box::new(handler));
    Ok(())
  }

  pub fn set_policy(&mut self, step_name: &str, policy: StepPolicy) -> Result<(), FlowError> {
    let step = self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })?;
    step.policy = policy;
    Ok(())
  }
}
