//! Tracing setup helpers.

/// Install a default env-filtered fmt subscriber if none is set.
///
/// Embedding applications usually install their own subscriber; this helper
/// is for demos and tests. Verbosity is controlled through `RUST_LOG`, e.g.
/// `RUST_LOG=hetero_dispatch=debug` to see per-decision dispatch logging.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
