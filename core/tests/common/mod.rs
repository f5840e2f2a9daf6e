// tests/common/mod.rs
#![allow(dead_code)]

use merch_flow::{FlowContext, FlowControl, FlowError, Handler};
use once_cell::sync::Lazy;
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct OrderishContext {
  pub total: i64,
  pub trail: Vec<String>,
  pub halt_at: Option<String>,
  pub skip_notify: bool,
}

#[derive(Clone, Debug, Default)]
pub struct OtherContext {
  pub touched: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step failed: {0}")]
  Step(String),
}

impl From<FlowError> for TestError {
  fn from(e: FlowError) -> Self {
    TestError::Flow(e.to_string())
  }
}

/// Appends `step` to the trail and adds `amount` to the total.
pub fn recording_handler(step: &'static str, amount: i64) -> Handler<OrderishContext, TestError> {
  Box::new(move |ctx: FlowContext<OrderishContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.total += amount;
      guard.trail.push(step.to_string());
      if guard.halt_at.as_deref() == Some(step) {
        return Ok(FlowControl::Halt);
      }
      Ok(FlowControl::Continue)
    })
  })
}

pub fn failing_handler(step: &'static str, message: &'static str) -> Handler<OrderishContext, TestError> {
  Box::new(move |ctx: FlowContext<OrderishContext>| {
    Box::pin(async move {
      ctx.write().trail.push(step.to_string());
      Err(TestError::Step(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
