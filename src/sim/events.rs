//! Typed publish/subscribe bus for gameplay notifications

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    PlayerCrashed,
    RestartRequested,
    PlayerJumped,
    PlayerLanded,
    ScoreChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameMessage {
    PlayerCrashed,
    RestartRequested,
    PlayerJumped,
    /// `alignment` is `None` for hops too short to validate
    PlayerLanded { alignment: Option<f32>, flips: u32 },
    ScoreChanged { score: u64 },
}

impl GameMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            GameMessage::PlayerCrashed => MessageKind::PlayerCrashed,
            GameMessage::RestartRequested => MessageKind::RestartRequested,
            GameMessage::PlayerJumped => MessageKind::PlayerJumped,
            GameMessage::PlayerLanded { .. } => MessageKind::PlayerLanded,
            GameMessage::ScoreChanged { .. } => MessageKind::ScoreChanged,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&GameMessage)>;

/// Kind -> ordered subscriber list. Dispatch is synchronous, in
/// subscription order, with any number of subscribers per kind.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<MessageKind, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: MessageKind,
        handler: impl FnMut(&GameMessage) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(index) = list.iter().position(|(sub, _)| *sub == id) {
                drop(list.remove(index));
                return true;
            }
        }
        false
    }

    /// Deliver `message` to every subscriber of its kind; returns how many ran
    pub fn publish(&mut self, message: &GameMessage) -> usize {
        let Some(list) = self.handlers.get_mut(&message.kind()) else {
            log::trace!("{:?}: no subscribers", message.kind());
            return 0;
        };
        for (_, handler) in list.iter_mut() {
            handler(message);
        }
        list.len()
    }

    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .handlers
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        counts.sort_by_key(|(kind, _)| *kind as u8);
        f.debug_struct("EventBus")
            .field("subscribers", &counts)
            .finish()
    }
}
