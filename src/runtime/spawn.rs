//! Object-safe spawn abstraction.

use std::future::Future;
use std::pin::Pin;

/// Boxed unit future handed to a [`Spawn`] implementation.
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Abstraction for driving futures on a runtime.
///
/// The GPU and IO backends submit work through this trait and never block the
/// scheduler's thread of control. Implementations must be cheap to clone
/// behind an `Arc` and safe to call from the scheduler's single logical
/// thread.
pub trait Spawn: Send + Sync {
    /// Spawn a future onto the runtime. Must not block.
    fn spawn(&self, task: BoxedTask);
}
