//! # Select
//!
//! Waits for the first payload delivered by any of several channels

use crate::channel::{Channel, Reader, WeakChannel, WeakReader};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering::SeqCst},
    Arc,
};
use tracing::trace;

#[cfg(test)]
mod test;

/// Handle of a pending [select](crate::select::select)
///
/// Dropping the handle does not cancel the select.
pub struct Select<T> {
    shared: Arc<Shared<T>>,
}

// Channels hold the only strong references to the reader,
// so an abandoned select does not keep itself alive.
struct Shared<T> {
    fired: AtomicBool,
    reader: Mutex<Option<WeakReader<T>>>,
    channels: Mutex<Vec<WeakChannel<T>>>,
}

/// Calls `callback` with the first payload delivered by any of `channels`
///
/// Before `callback` runs, the select is unregistered from every channel,
/// so it fires at most once however many of the channels are written to
/// later. The callback receives the channel that delivered the payload.
///
/// Channels are registered in order. If a channel delivers a queued
/// payload while being registered, the select fires right there
/// and the remaining channels are not registered at all.
///
/// ```rust
/// use callchan::{select, Channel, ChannelBuilder};
///
/// let c1: Channel<&'static str> = ChannelBuilder::new().name("c1").build();
/// let c2: Channel<&'static str> = ChannelBuilder::new().name("c2").build();
/// select(|channel, payload| {
///     println!("{} from {}", payload, channel.name());
/// }, [&c1, &c2]);
///
/// c1.write("x"); // fires
/// c2.write("y"); // queued on c2, the select is gone
/// assert_eq!(c2.reader_count(), 0);
/// ```
pub fn select<'a, T, F, I>(callback: F, channels: I) -> Select<T>
where
    T: Send + Sync + 'static,
    F: FnOnce(&Channel<T>, &T) + Send + 'static,
    I: IntoIterator<Item = &'a Channel<T>>,
{
    let shared = Arc::new(Shared {
        fired: AtomicBool::new(false),
        reader: Mutex::new(None),
        channels: Mutex::new(Vec::new()),
    });

    let callback = Mutex::new(Some(callback));
    let reader = Reader::new({
        let shared = Arc::clone(&shared);
        move |channel: &Channel<T>, payload: &T| {
            if !shared.detach() {
                return;
            }
            trace!(channel = channel.name(), "select fired");
            let callback = callback.lock().take();
            if let Some(callback) = callback {
                callback(channel, payload);
            }
        }
    });
    *shared.reader.lock() = Some(reader.downgrade());

    for channel in channels {
        if shared.fired.load(SeqCst) {
            break;
        }
        shared.channels.lock().push(channel.downgrade());
        channel.read(&reader);
        if shared.fired.load(SeqCst) {
            // fired during `read` on a queued payload, or on another thread meanwhile
            channel.unread(&reader);
            break;
        }
    }

    Select { shared }
}

impl<T> Select<T> {
    /// Returns `true` once the select has fired or has been cancelled
    pub fn is_done(&self) -> bool {
        self.shared.fired.load(SeqCst)
    }

    /// Unregisters the select from all channels without calling the callback
    ///
    /// Returns `false` if the select had already fired or been cancelled
    pub fn cancel(&self) -> bool {
        self.shared.detach()
    }
}

impl<T> Shared<T> {
    // Only the first caller detaches and gets `true`
    fn detach(&self) -> bool {
        if self.fired.swap(true, SeqCst) {
            return false;
        }
        let reader = self.reader.lock().take();
        let channels = std::mem::take(&mut *self.channels.lock());
        let reader = match reader.and_then(|reader| reader.upgrade()) {
            Some(reader) => reader,
            None => return true,
        };
        for channel in channels.iter().filter_map(WeakChannel::upgrade) {
            channel.unread(&reader);
        }
        true
    }
}
