use crate::channel::{Channel, Reader};
use parking_lot::Mutex;
use std::{fmt::Debug, sync::Arc};

/// Shared, ordered record of what readers observed
pub(crate) struct Log<E> {
    entries: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone> Log<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn push(&self, entry: E) {
        self.entries.lock().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<E> {
        self.entries.lock().clone()
    }
}

impl<E> Clone for Log<E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

/// A reader that logs `(tag, payload)`
pub(crate) fn recorder<T>(log: &Log<(&'static str, T)>, tag: &'static str) -> Reader<T>
where
    T: Clone + Debug + Send + 'static,
{
    let log = log.clone();
    Reader::new(move |_: &Channel<T>, payload: &T| {
        println!("{}: {:?}", tag, payload);
        log.push((tag, payload.clone()));
    })
}
