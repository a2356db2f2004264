/// Tracing subscriber initialization
///
/// The engine only emits `tracing` events. Embedders that have no subscriber of
/// their own (and tests) can install the default formatter here.

/// Install a fmt subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .with_test_writer()
        .try_init();
}
