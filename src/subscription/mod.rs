//! # Async subscriptions
//!
//! Bridges a callback [Channel](crate::channel::Channel) to async code

use crate::channel::{Channel, Reader, WeakChannel, WeakReader};
use std::mem;
use thiserror::Error;
use tokio::sync::mpsc::{self, unbounded_channel, UnboundedReceiver};
use tracing::trace;


/// Channel subscription
///
/// Each payload delivered by the channel is cloned into the subscription.
/// Dropping the subscription unregisters it from the channel.
pub struct Subscription<T> {
    receiver: UnboundedReceiver<T>,
    registration: Option<(WeakChannel<T>, WeakReader<T>)>,
}

/// Error returned by [Subscription::recv](crate::subscription::Subscription::recv)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// The channel was dropped and every delivered payload was received
    #[error("channel closed")]
    Closed,
}

/// Error returned by [Subscription::try_recv](crate::subscription::Subscription::try_recv)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// No payload is waiting
    #[error("no payload available")]
    Empty,
    /// The channel was dropped and every delivered payload was received
    #[error("channel closed")]
    Closed,
}

impl<T: Clone + Send + 'static> Channel<T> {
    /// Subscribe to the channel
    ///
    /// The subscription is an ordinary reader: it takes part in delivery
    /// of queued payloads and in registration order like any other.
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = unbounded_channel();
        let reader = Reader::new(move |channel: &Channel<T>, payload: &T| {
            // fails only when the subscription is closed on another thread meanwhile
            if sender.send(payload.clone()).is_err() {
                trace!(channel = channel.name(), "subscription closed, payload dropped");
            }
        });
        let registration = (self.downgrade(), reader.downgrade());
        self.read(&reader);
        Subscription {
            receiver,
            registration: Some(registration),
        }
    }
}

impl<T> Subscription<T> {
    /// Receives the next payload for this Subscription
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        self.receiver.recv().await.ok_or(RecvError::Closed)
    }

    /// Receives the next payload if one is waiting
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        self.receiver.try_recv().map_err(|e| match e {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        })
    }

    /// Closes the subscription
    ///
    /// Payloads delivered before closing are dropped
    pub fn close(mut self) {
        self.detach();
        self.receiver.close();
    }

    fn detach(&mut self) {
        let (channel, reader) = match mem::take(&mut self.registration) {
            Some(registration) => registration,
            None => return,
        };
        if let (Some(channel), Some(reader)) = (channel.upgrade(), reader.upgrade()) {
            channel.unread(&reader);
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.detach();
    }
}
