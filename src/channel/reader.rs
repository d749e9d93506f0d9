use super::Channel;
use std::{
    fmt,
    sync::{Arc, Weak},
};

type Callback<T> = dyn Fn(&Channel<T>, &T) + Send + Sync;

/// A callback registered on a [Channel](crate::channel::Channel)
///
/// Readers are compared by reference identity: clones of one `Reader`
/// are the same reader, two `Reader`s built from equal closures are not.
pub struct Reader<T> {
    callback: Arc<Callback<T>>,
}

pub(crate) struct WeakReader<T> {
    callback: Weak<Callback<T>>,
}

impl<T> Reader<T> {
    /// Wraps a callback into a reader
    ///
    /// The callback receives the channel that delivered the payload,
    /// followed by the payload itself
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Channel<T>, &T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Returns `true` if both handles refer to the same reader
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.callback) as *const () == Arc::as_ptr(&other.callback) as *const ()
    }

    pub(crate) fn downgrade(&self) -> WeakReader<T> {
        WeakReader {
            callback: Arc::downgrade(&self.callback),
        }
    }

    pub(crate) fn call(&self, channel: &Channel<T>, payload: &T) {
        (self.callback)(channel, payload)
    }
}

impl<T> WeakReader<T> {
    pub(crate) fn upgrade(&self) -> Option<Reader<T>> {
        self.callback.upgrade().map(|callback| Reader { callback })
    }
}

impl<T> Clone for Reader<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> Clone for WeakReader<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Weak::clone(&self.callback),
        }
    }
}

impl<T> fmt::Debug for Reader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reader({:p})", Arc::as_ptr(&self.callback) as *const ())
    }
}
