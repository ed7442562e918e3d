// runtime-async-std
#[cfg(feature = "runtime-async-std")]
pub use async_std::task::{sleep, yield_now};

// runtime-tokio
#[cfg(all(feature = "runtime-tokio", not(feature = "runtime-async-std")))]
pub use tokio::task::yield_now;

#[cfg(all(feature = "runtime-tokio", not(feature = "runtime-async-std")))]
pub async fn sleep(duration: std::time::Duration) {
    tokio::time::sleep(duration).await
}

#[cfg(not(any(feature = "runtime-async-std", feature = "runtime-tokio")))]
compile_error!("enable one of the `runtime-async-std` or `runtime-tokio` features");
