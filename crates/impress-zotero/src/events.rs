//! Mirror lifecycle events
//!
//! Broadcast to any number of subscribers. A subscriber that falls behind
//! loses the oldest events (`RecvError::Lagged`); the mirror never blocks on
//! a slow listener.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::{KeyLibId, LibraryId};

/// Buffered events per subscriber
pub const EVENT_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MirrorEvent {
    /// A page of items was staged during a full load
    BatchLoaded { library_id: LibraryId, loaded: usize },
    /// The search index now belongs to `library_id`
    SearchRefreshed { library_id: LibraryId },
    /// Initialization finished
    Ready,
    /// A debounced batch of remote changes was applied
    ItemsUpdated {
        updated: Vec<KeyLibId>,
        removed: Vec<KeyLibId>,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<MirrorEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.sender.subscribe()
    }

    /// Publish; having no subscribers is not an error
    pub fn emit(&self, event: MirrorEvent) {
        tracing::trace!(?event, "mirror event");
        let _ = self.sender.send(event);
    }
}
