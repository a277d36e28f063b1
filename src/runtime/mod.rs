//! Runtime adapters: the seam between backends and the async runtime.

pub mod spawn;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

pub use spawn::{BoxedTask, Spawn};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;
