pub mod app;
pub mod fixtures;
pub mod flaky;

pub use app::TestApp;
pub use flaky::{Faults, FlakyStorage};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber honouring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
