// Adapters layer: docker, process, filesystem and lock implementations of the core ports
pub mod docker;
pub mod lock;
pub mod process;
pub mod storage;

pub use docker::DockerInspector;
pub use lock::NamespaceLock;
pub use process::ProcessRunner;
pub use storage::LocalStorage;
