// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tokio::sync::broadcast;

use super::LightEvent;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcasts [`LightEvent`]s to any number of subscribers.
///
/// Cloning the bus shares the channel. A subscriber that falls more than
/// the channel capacity behind receives `RecvError::Lagged` and loses the
/// oldest events; publishers never block.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LightEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity (256 events).
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receives every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LightEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event; dropped if nobody listens.
    pub fn publish(&self, event: LightEvent) {
        tracing::trace!(?event, "publishing light event");
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
