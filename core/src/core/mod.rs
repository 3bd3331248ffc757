pub mod context;
pub mod control;
pub mod hook;
pub mod step;

pub use context::StepContext;
pub use control::{Flow, Outcome};
pub use hook::{Hook, HookFuture};
pub use step::StepSpec;
