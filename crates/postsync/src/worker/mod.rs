pub mod progress;
pub mod reconciler;

pub use progress::{NoopReporter, PassEvent, PassReporter};
pub use reconciler::Reconciler;
