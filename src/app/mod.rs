pub mod phases;
pub mod sequencer;

pub use sequencer::{BootstrapPlan, BootstrapReport, BootstrapSequencer};
