//! Explicit object pool for short-lived, high-frequency values.
//!
//! Values handed out by [`Pool::acquire`] are always fully reset first, so no
//! state leaks from a previous use. Callers must release values before the
//! end of the tick that acquired them.

/// Values that can be recycled by a [`Pool`].
pub trait Poolable {
    /// Overwrites every field with its pristine state.
    fn reset(&mut self);
}

/// LIFO free list with an upper bound on retained values.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    max_retained: usize,
    created: usize,
    outstanding: usize,
}

impl<T: Poolable + Default> Pool<T> {
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Vec::new(),
            max_retained,
            created: 0,
            outstanding: 0,
        }
    }

    pub fn acquire(&mut self) -> T {
        self.outstanding += 1;
        match self.free.pop() {
            Some(mut item) => {
                item.reset();
                item
            }
            None => {
                self.created += 1;
                T::default()
            }
        }
    }

    pub fn release(&mut self, item: T) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.free.len() < self.max_retained {
            self.free.push(item);
        }
    }

    /// Number of values constructed since the pool was created.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Values acquired and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl<T: Poolable + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new(256)
    }
}
