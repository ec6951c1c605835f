pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{DockerInspector, LocalStorage, NamespaceLock, ProcessRunner};
pub use crate::app::{BootstrapPlan, BootstrapReport, BootstrapSequencer};
pub use crate::config::{FoundationLocation, StackConfig, StackSettings};
pub use crate::core::{catalog::ServiceCatalog, resolver::DependencyResolver};
pub use crate::domain::model::{Environment, Profile, ResolvedServiceSet, ServiceSelection};
pub use crate::utils::error::{Result, StackError};
