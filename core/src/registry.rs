// merch-flow/src/registry.rs

//! `FlowRegistry<E>`: holds one flow per context type and runs it on demand.

use crate::core::context_data::FlowContext;
use crate::core::control::FlowReport;
use crate::error::FlowError;
use crate::flow::definition::Flow;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

#[async_trait]
trait ErasedFlowRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowReport, AppErr>;
}

struct FlowRunner<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flow: Arc<Flow<TData, FlowErr>>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, FlowErr, AppErr> ErasedFlowRunner<AppErr> for FlowRunner<TData, FlowErr, AppErr>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<FlowErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowReport, AppErr> {
    let typed = match ctx.downcast::<FlowContext<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected = std::any::type_name::<FlowContext<TData>>();
        error!(expected, "Flow context type mismatch.");
        return Err(AppErr::from(FlowError::TypeMismatch {
          expected_type: expected.to_string(),
        }));
      }
    };
    self.flow.run(typed).await.map_err(AppErr::from)
  }
}

/// Flows keyed by the `TypeId` of their context data.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: Mutex<HashMap<TypeId, Arc<dyn ErasedFlowRunner<AppErr>>>>,
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: Mutex::new(HashMap::new()),
    }
  }

  /// Registers `flow` for its context type, replacing any earlier registration.
  pub fn register<TData, FlowErr>(&self, flow: Flow<TData, FlowErr>)
  where
    TData: 'static + Send + Sync,
    FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<FlowErr>,
  {
    debug!(flow = %flow.name(), "Registering flow.");
    let runner = FlowRunner::<TData, FlowErr, AppErr> {
      flow: Arc::new(flow),
      _app_err: PhantomData,
    };
    self.flows.lock().insert(TypeId::of::<TData>(), Arc::new(runner));
  }

  pub fn is_registered<TData: 'static + Send + Sync>(&self) -> bool {
    self.flows.lock().contains_key(&TypeId::of::<TData>())
  }

  pub async fn run<TData>(&self, ctx: FlowContext<TData>) -> Result<FlowReport, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.flows.lock().get(&TypeId::of::<TData>()).cloned().ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      error!(type_name, "No flow registered.");
      AppErr::from(FlowError::NotRegistered {
        type_name: type_name.to_string(),
      })
    })?;

    runner.run_erased(Box::new(ctx)).await
  }
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
