#![warn(missing_docs)]
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::missing_panics_doc)]

//! Cooperative callback channels
//!
//! A [Channel] hands every written payload to all of its [Reader]s,
//! synchronously and in registration order. Writes that cannot be delivered
//! yet are queued, and delivery can be paused between two readers with
//! [Channel::block] and resumed with [Channel::unblock].
//!
//! [alts] and [select] read from several channels with one callback,
//! [Channel::subscribe] turns a channel into an async receiver.
//!
//! ## Example
//!
//! ```rust
//! use callchan::{Channel, Reader};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let channel = Channel::new();
//!
//! channel.write((1, "one"));
//!
//! let reader = Reader::<(i32, &str)>::new({
//!     let seen = Arc::clone(&seen);
//!     move |_, &(n, word)| {
//!         seen.lock().unwrap().push(format!("{} {}", n, word));
//!     }
//! });
//! channel.read(&reader).write((2, "two"));
//!
//! assert_eq!(*seen.lock().unwrap(), ["1 one", "2 two"]);
//! ```

pub mod alts;
pub mod channel;
pub mod select;
pub mod subscription;

#[cfg(test)]
mod test_util;

pub use alts::{alts, Alts};
pub use channel::{Channel, ChannelBuilder, PanicPolicy, Reader, WeakChannel};
pub use select::{select, Select};
pub use subscription::{RecvError, Subscription, TryRecvError};
