//! Shared Runtime

use once_cell::sync::Lazy;
use tokio::runtime::{Builder, Runtime};

/// Multi-thread runtime for the binary; archive work runs on its blocking pool.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    Builder::new_multi_thread()
        .thread_name("adsnap-worker")
        .enable_all()
        .build()
        .expect("failed to build adsnap runtime")
});

/// Drive a batch to completion from synchronous code.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    RUNTIME.block_on(future)
}
