pub mod catalog;
pub mod compose;
pub mod directive;
pub mod phase_sequence;
pub mod probe;
pub mod resolver;
pub mod secrets;

pub use crate::domain::ports::{CommandRunner, ContainerInspector, Storage};
pub use crate::utils::error::Result;
