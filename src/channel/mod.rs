//! # Channels

use crate::select::select;
use parking_lot::Mutex;
use std::{
    any::Any,
    collections::VecDeque,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Weak},
};
use tracing::{debug, error, trace};

mod config;
mod reader;


pub use config::*;
pub use reader::Reader;

pub(crate) use reader::WeakReader;

/// A cooperative multi-writer, multi-reader channel
///
/// Every payload written to the channel is delivered to all registered
/// [Reader](crate::channel::Reader)s in registration order, synchronously,
/// inside the call that started the delivery. Payloads written while there
/// is no reader, while the channel is blocked or while another payload
/// is being delivered are queued and delivered later in FIFO order.
///
/// `Channel` is a handle: clones refer to the same channel.
pub struct Channel<T> {
    inner: Arc<Inner<T>>,
}

/// A non-owning handle to a [Channel](crate::channel::Channel)
pub struct WeakChannel<T> {
    inner: Weak<Inner<T>>,
}

struct Inner<T> {
    name: &'static str,
    panic_policy: PanicPolicy,
    state: Mutex<State<T>>,
}

struct State<T> {
    readers: Vec<Registration<T>>,
    next_seq: u64,
    pending: VecDeque<Arc<T>>,
    in_flight: Option<InFlight<T>>,
    blocked: bool,
    dispatching: bool,
}

struct Registration<T> {
    seq: u64,
    reader: Reader<T>,
}

// `cursor` is the registration number of the last reader handed `payload`.
// Registration numbers only grow and `readers` stays sorted by them,
// so removals never shift the position.
struct InFlight<T> {
    payload: Arc<T>,
    cursor: u64,
}

struct Delivery<T> {
    reader: Reader<T>,
    payload: Arc<T>,
}

impl<T> Channel<T> {
    /// Creates an empty channel with the default options
    pub fn new() -> Self {
        Self::from_builder(ChannelBuilder::new())
    }

    fn from_builder(builder: ChannelBuilder) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: builder.name,
                panic_policy: builder.panic_policy,
                state: Mutex::new(State {
                    readers: Vec::new(),
                    next_seq: 1,
                    pending: VecDeque::new(),
                    in_flight: None,
                    blocked: false,
                    dispatching: false,
                }),
            }),
        }
    }

    /// Registers a reader
    ///
    /// If the channel is idle and unblocked, the oldest queued payload
    /// is delivered right away to every registered reader, not only to
    /// the new one, and so on until the queue is drained.
    ///
    /// The same reader may be registered several times;
    /// it is then called once per registration.
    pub fn read(&self, reader: &Reader<T>) -> &Self {
        {
            let mut state = self.inner.state.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.readers.push(Registration {
                seq,
                reader: reader.clone(),
            });
            trace!(channel = self.inner.name, seq, "reader registered");
        }
        self.pump();
        self
    }

    /// Removes the first registration of `reader`
    ///
    /// The reader gets no further payloads, including queued ones
    /// and the one being delivered if its turn has not come yet.
    /// Does nothing if the reader is not registered.
    pub fn unread(&self, reader: &Reader<T>) -> &Self {
        let removed = {
            let mut state = self.inner.state.lock();
            let index = state
                .readers
                .iter()
                .position(|registration| registration.reader.ptr_eq(reader));
            index.map(|index| state.readers.remove(index))
        };
        if let Some(registration) = removed {
            trace!(
                channel = self.inner.name,
                seq = registration.seq,
                "reader unregistered"
            );
        }
        self
    }

    /// Writes a payload
    ///
    /// The payload is delivered within this call if the channel has readers,
    /// is not blocked and nothing is queued or being delivered.
    /// Otherwise it is queued. Writes made by a reader during delivery
    /// are always queued and never interleave with the current payload.
    ///
    /// # Panics
    ///
    /// With [PanicPolicy::Propagate](crate::channel::PanicPolicy::Propagate)
    /// a panic raised by a reader unwinds out of this call.
    pub fn write(&self, payload: T) -> &Self {
        {
            let mut state = self.inner.state.lock();
            let queued = state.readers.is_empty()
                || state.blocked
                || state.in_flight.is_some()
                || !state.pending.is_empty();
            state.pending.push_back(Arc::new(payload));
            if queued {
                debug!(
                    channel = self.inner.name,
                    pending = state.pending.len(),
                    "write queued"
                );
            }
        }
        self.pump();
        self
    }

    /// Pauses delivery before the next reader
    ///
    /// A reader that is running is not interrupted. Returns `false`
    /// if the channel was already blocked.
    pub fn block(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.blocked {
            return false;
        }
        state.blocked = true;
        debug!(
            channel = self.inner.name,
            in_flight = state.in_flight.is_some(),
            "channel blocked"
        );
        true
    }

    /// Resumes delivery at the first reader not yet served
    ///
    /// Returns `false` if the channel was not blocked.
    ///
    /// # Panics
    ///
    /// With [PanicPolicy::Propagate](crate::channel::PanicPolicy::Propagate)
    /// a panic raised by a reader unwinds out of this call.
    pub fn unblock(&self) -> bool {
        {
            let mut state = self.inner.state.lock();
            if !state.blocked {
                return false;
            }
            state.blocked = false;
            debug!(
                channel = self.inner.name,
                in_flight = state.in_flight.is_some(),
                pending = state.pending.len(),
                "channel unblocked"
            );
        }
        self.pump();
        true
    }

    /// Blocks the channel until `gate` delivers its next payload
    ///
    /// Readers after the current one wait until something is written
    /// to `gate`. If `gate` already has queued payloads, the channel is
    /// unblocked right away. Returns `false` and leaves `gate` alone
    /// if the channel was already blocked.
    pub fn block_until<U>(&self, gate: &Channel<U>) -> bool
    where
        T: Send + Sync + 'static,
        U: Send + Sync + 'static,
    {
        if !self.block() {
            return false;
        }
        let channel = self.downgrade();
        select(
            move |_, _: &U| {
                if let Some(channel) = channel.upgrade() {
                    channel.unblock();
                }
            },
            [gate],
        );
        true
    }

    /// Returns `true` while delivery is paused
    pub fn is_blocked(&self) -> bool {
        self.inner.state.lock().blocked
    }

    /// Returns `true` while a payload has not yet reached every reader
    pub fn is_in_flight(&self) -> bool {
        self.inner.state.lock().in_flight.is_some()
    }

    /// Number of registered readers
    pub fn reader_count(&self) -> usize {
        self.inner.state.lock().readers.len()
    }

    /// Number of queued payloads, not counting the one being delivered
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Channel name set with [ChannelBuilder::name](crate::channel::ChannelBuilder::name)
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Returns `true` if both handles refer to the same channel
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Creates a non-owning handle to this channel
    pub fn downgrade(&self) -> WeakChannel<T> {
        WeakChannel {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // Only one frame drives delivery at a time. A `read`, `write` or `unblock`
    // made while another frame is driving leaves the work to that frame.
    fn pump(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }
        let mut guard = DispatchGuard {
            inner: &self.inner,
            armed: true,
        };
        loop {
            let delivery = {
                let mut state = self.inner.state.lock();
                match state.next_delivery() {
                    Some(delivery) => delivery,
                    None => {
                        state.dispatching = false;
                        guard.armed = false;
                        return;
                    }
                }
            };
            self.deliver(delivery);
        }
    }

    fn deliver(&self, delivery: Delivery<T>) {
        let Delivery { reader, payload } = delivery;
        match self.inner.panic_policy {
            PanicPolicy::Propagate => reader.call(self, &payload),
            PanicPolicy::Isolate => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| reader.call(self, &payload)));
                if let Err(panic) = result {
                    error!(
                        channel = self.inner.name,
                        panic = panic_message(&*panic),
                        "reader panicked, delivery goes on"
                    );
                }
            }
        }
    }
}

impl<T> State<T> {
    fn next_delivery(&mut self) -> Option<Delivery<T>> {
        loop {
            if let Some(in_flight) = self.in_flight.as_mut() {
                let cursor = in_flight.cursor;
                let index = self.readers.partition_point(|r| r.seq <= cursor);
                if let Some(next) = self.readers.get(index) {
                    if self.blocked {
                        return None;
                    }
                    in_flight.cursor = next.seq;
                    return Some(Delivery {
                        reader: next.reader.clone(),
                        payload: Arc::clone(&in_flight.payload),
                    });
                }
                self.in_flight = None;
            }
            if self.blocked || self.readers.is_empty() {
                return None;
            }
            let payload = self.pending.pop_front()?;
            self.in_flight = Some(InFlight { payload, cursor: 0 });
        }
    }
}

// Releases the dispatch flag when a reader panic unwinds through `pump`
struct DispatchGuard<'a, T> {
    inner: &'a Inner<T>,
    armed: bool,
}

impl<T> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.state.lock().dispatching = false;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "Box<dyn Any>"
    }
}

impl<T> WeakChannel<T> {
    /// Returns the channel if it is still alive
    pub fn upgrade(&self) -> Option<Channel<T>> {
        self.inner.upgrade().map(|inner| Channel { inner })
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Clone for WeakChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("readers", &state.readers.len())
            .field("pending", &state.pending.len())
            .field("in_flight", &state.in_flight.is_some())
            .field("blocked", &state.blocked)
            .finish()
    }
}

impl<T> fmt::Debug for WeakChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakChannel")
    }
}
