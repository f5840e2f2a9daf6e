// merch-flow/src/lib.rs

//! merch-flow: small async step flows for storefront workflows.
//!
//! A flow is an ordered list of named steps run against one shared context:
//!  - Each step has a policy: `Required` steps abort the run on error,
//!    `BestEffort` steps log the error, record it in the report and let the
//!    run continue.
//!  - Steps can carry a skip condition evaluated against the context.
//!  - Handlers may halt the flow early with `FlowControl::Halt`.
//!  - A type-keyed registry runs the flow registered for a context type.

pub mod core;
pub mod error;
pub mod flow;
pub mod registry;

pub use crate::core::context_data::FlowContext;
pub use crate::core::control::{DegradedStep, FlowControl, FlowOutcome, FlowReport};
pub use crate::core::step::{SkipCondition, StepDef, StepPolicy};
pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::definition::{Flow, Handler};
pub use crate::registry::FlowRegistry;

/*
    Typical use:
    1. Define a context struct `PlaceOrderCtx`.
    2. `Flow::<PlaceOrderCtx, AppError>::new(&[("validate", StepPolicy::Required, None), ...])`.
    3. Attach one handler per step with `.on_step(name, |ctx| Box::pin(async move { ... }))`.
    4. Register the flow on a `FlowRegistry<AppError>` at startup.
    5. Per request: `registry.run(FlowContext::new(ctx)).await` and read results back from the context.
*/
