//! Type-erased values for caches holding more than one value type.

use std::any::{type_name, Any};
use std::sync::Arc;

/// A cached value of any shareable type.
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Wraps `value` for storage in a `Cache<ErasedValue>`.
pub fn erase<T: Any + Send + Sync>(value: T) -> ErasedValue {
    Arc::new(value)
}

/// Recovers the concrete type of a value loaded for `key`.
///
/// # Panics
/// If the value is not a `T`. That means the key scheme and the loader
/// disagree about what a key holds, which is a bug, not a runtime condition.
pub fn downcast<T: Any + Send + Sync>(key: &str, value: ErasedValue) -> Arc<T> {
    match value.downcast::<T>() {
        Ok(typed) => typed,
        Err(_) => panic!(
            "cached value for key '{key}' is not a {}",
            type_name::<T>()
        ),
    }
}
