// bootstrap 的各個階段，順序由 BootstrapSequencer 決定
pub mod directive;
pub mod foundation;
pub mod secrets;
pub mod services;
pub mod teardown;

pub use directive::DirectivePatchPhase;
pub use foundation::{FoundationStartPhase, SettlePhase};
pub use secrets::SecretProvisionPhase;
pub use services::ServicesStartPhase;
pub use teardown::TeardownPhase;
