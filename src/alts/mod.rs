//! # Alts
//!
//! Reads every payload of several channels with one callback

use crate::channel::{Channel, Reader, WeakChannel};


/// Registration made by [alts](crate::alts::alts)
///
/// Dropping the handle keeps the callback registered.
pub struct Alts<T> {
    reader: Reader<T>,
    channels: Vec<WeakChannel<T>>,
}

/// Calls `callback` for every payload delivered by any of `channels`
///
/// The callback receives the channel that delivered the payload.
/// It stays registered until [Alts::cancel](crate::alts::Alts::cancel),
/// and two channels written in the same turn both call it, once each.
///
/// ```rust
/// use callchan::{alts, Channel, ChannelBuilder};
///
/// let c1: Channel<&'static str> = ChannelBuilder::new().name("c1").build();
/// let c2: Channel<&'static str> = ChannelBuilder::new().name("c2").build();
/// alts(|channel, payload| {
///     println!("{} from {}", payload, channel.name());
/// }, [&c1, &c2]);
///
/// c1.write("x");
/// c2.write("y");
/// ```
pub fn alts<'a, T, F, I>(callback: F, channels: I) -> Alts<T>
where
    T: 'static,
    F: Fn(&Channel<T>, &T) + Send + Sync + 'static,
    I: IntoIterator<Item = &'a Channel<T>>,
{
    let reader = Reader::new(callback);
    let channels = channels
        .into_iter()
        .map(|channel| {
            channel.read(&reader);
            channel.downgrade()
        })
        .collect();
    Alts { reader, channels }
}

impl<T> Alts<T> {
    /// Unregisters the callback from every channel that is still alive
    pub fn cancel(self) {
        for channel in self.channels.iter().filter_map(WeakChannel::upgrade) {
            channel.unread(&self.reader);
        }
    }
}
