pub mod agent;
pub mod bots;
pub mod clock;
pub mod config;
pub mod controller;
pub mod driver;
pub mod process;

pub use clock::{ChessClock, ClockedController, PendingAction};
pub use config::{ConfigError, HostConfig};
pub use controller::{Canceller, Controller, ControllerError};
pub use driver::MatchDriver;
pub use process::ProcessController;

/// Install the `RUST_LOG`-driven subscriber used by the binaries. Logs go to
/// stderr so stdout stays free for match output and agent replies.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
