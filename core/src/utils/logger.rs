use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber filtered by `RUST_LOG`.
///
/// Logs go to stderr so they never interleave with program output on stdout. Calling this more
/// than once is harmless.
pub fn setup_logger() {
  let _ = tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}

/// Like [`setup_logger`], but captured by the test harness.
pub fn setup_test_logger() {
  let _ = tracing_subscriber::fmt()
    .with_test_writer()
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}
