use std::sync::{Arc, Mutex};

/// Atomically published immutable snapshot cell.
///
/// The timer/control domain builds a complete new value and `store`s it; the
/// frame-processing domain `load`s the latest snapshot once per frame and
/// renders from that `Arc` alone, so it can never observe a half-written
/// split list or region layout.
#[derive(Debug)]
pub struct Shared<T> {
    slot: Mutex<Arc<T>>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Mutex::new(Arc::new(value)),
        }
    }

    pub fn load(&self) -> Arc<T> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn store(&self, value: T) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Arc::new(value);
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
