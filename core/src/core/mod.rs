pub mod context_data;
pub mod control;
pub mod step;

pub use context_data::FlowContext;
pub use control::{DegradedStep, FlowControl, FlowOutcome, FlowReport};
pub use step::{SkipCondition, StepDef, StepPolicy};
