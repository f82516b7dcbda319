use parking_lot::RwLock;
use std::sync::Arc;

/// A shared, poison-free read-write cell.
pub type Atomic<T> = Arc<RwLock<T>>;

/// Wraps `t` in an [Atomic] cell.
#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

/// Closure-style access to an [Atomic] cell.
pub trait ReadExecutor<T> {
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R;
}

pub trait WriteExecutor<T> {
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> ReadExecutor<T> for Atomic<T> {
    #[inline]
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.read();
        f(&guard)
    }
}

impl<T> WriteExecutor<T> for Atomic<T> {
    #[inline]
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.write();
        f(&mut guard)
    }
}
