pub mod clock;
pub mod config;
pub mod core_state; // Composition root for the UI layer
pub mod db;
pub mod models;
pub mod pipeline; // OCR → extraction → catalog match
pub mod records; // Save and read medication records
pub mod session;
pub mod speech;
pub mod time_period;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let initialised = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if initialised {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
