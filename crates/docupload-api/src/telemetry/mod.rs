pub mod init;
pub mod metrics;
pub mod provider;

pub use init::{init_telemetry, shutdown_telemetry};
pub use provider::MetricsProvider;
