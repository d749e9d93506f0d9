use super::Channel;

/// What a channel does when one of its readers panics during dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicPolicy {
    /// The panic unwinds out of the `read`, `write` or `unblock` call
    /// that was driving dispatch
    ///
    /// The panicking reader counts as served. Readers after it receive
    /// the payload on the next `read`, `write` or `unblock`
    #[default]
    Propagate,
    /// The panic is caught and logged, dispatch goes on with the next reader
    Isolate,
}

/// Options for a [Channel](crate::channel::Channel)
#[derive(Debug, Clone)]
pub struct ChannelBuilder {
    pub(super) name: &'static str,
    pub(super) panic_policy: PanicPolicy,
}

impl ChannelBuilder {
    /// Creates a builder with the default options
    pub const fn new() -> Self {
        Self {
            name: "channel",
            panic_policy: PanicPolicy::Propagate,
        }
    }

    /// Channel name in log records and debug messages
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the [PanicPolicy](crate::channel::PanicPolicy)
    pub fn panic_policy(mut self, panic_policy: PanicPolicy) -> Self {
        self.panic_policy = panic_policy;
        self
    }

    /// Creates an empty channel with these options
    pub fn build<T>(self) -> Channel<T> {
        Channel::from_builder(self)
    }
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
