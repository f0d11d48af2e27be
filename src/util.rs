//! Utility module, a grab-bag of functionality

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, ignoring poison.
///
/// Everything this crate guards with a mutex is plain numbers, registry
/// membership or buffered batches. A panic while a lock was held cannot leave
/// them torn, so a poisoned lock is as good as a clean one.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_recovers_from_poison() {
        let shared = Arc::new(Mutex::new(7));
        let inner = Arc::clone(&shared);
        let res = thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poisoning the lock");
        }).join();
        assert!(res.is_err());
        assert!(shared.is_poisoned());

        *lock(&shared) += 1;
        assert_eq!(8, *lock(&shared));
    }
}
