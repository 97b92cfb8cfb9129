use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is the handle type the provider hands out for cached chunks. The
/// simulation can hold a clone and mutate the chunk through `get_mut()` while the
/// save worker reads the same chunk through `get()`.
///
/// # Examples
///
/// ```
/// use chunk_provider::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let counter_clone = counter.clone();
///
/// std::thread::spawn(move || {
///     *counter_clone.get_mut() += 1;
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(*counter.get(), 1);
/// ```
///
/// # Poisoning
/// A panic while a guard is held does not make the resource unusable: both
/// accessors recover the inner value from a poisoned lock.
#[derive(Debug)]
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Wraps `resource` in a new shared handle.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read guard. Many readers may hold one at the same time.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive write guard.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles point at the same allocation.
    ///
    /// Two chunks with equal contents loaded by two separate tasks are *not*
    /// the same resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }

    /// Number of live handles to this resource.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_value() {
        let a = MtResource::new(vec![1, 2, 3]);
        let b = a.clone();

        b.get_mut().push(4);

        assert_eq!(*a.get(), vec![1, 2, 3, 4]);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.handle_count(), 2);
    }

    #[test]
    fn equal_values_are_distinct_resources() {
        let a = MtResource::new(7);
        let b = MtResource::new(7);

        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn survives_a_poisoned_lock() {
        let resource = MtResource::new(1);
        let clone = resource.clone();

        let _ = std::thread::spawn(move || {
            let _guard = clone.get_mut();
            panic!("poison the lock");
        })
        .join();

        *resource.get_mut() += 1;
        assert_eq!(*resource.get(), 2);
    }
}
