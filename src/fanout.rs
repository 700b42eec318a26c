//! Room-wide and per-user event fan-out.
//!
//! The engine emits through the [`Broadcaster`] trait and never learns
//! about sockets. Room events and private events travel on separate
//! channels: private delivery is keyed by `(game, user)`, so a room
//! subscription can never observe another user's hole cards, even
//! when the layer downstream is buggy or absent.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::engine::events::RoomEvent;
use crate::engine::types::{GameId, UserId};

const LOG_TARGET: &str = "holdem_engine::fanout";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Audience {
    Room,
    User { user_id: UserId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutboundEvent {
    pub audience: Audience,
    #[serde(flatten)]
    pub event: RoomEvent,
}

/// Delivery is best-effort and non-blocking; per-recipient ordering
/// follows emission order. Implementations must be safe for
/// concurrent callers across engines.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, room: GameId, event: &RoomEvent);
    fn send_private(&self, room: GameId, user_id: UserId, event: &RoomEvent);
}

pub type SharedBroadcaster = Arc<dyn Broadcaster>;

/// Production fan-out over `tokio::sync::broadcast` channels.
///
/// One channel per room carries `Audience::Room` envelopes only. Each
/// `(room, user)` pair gets its own channel for `Audience::User`
/// envelopes; the socket layer subscribes a connection to the room
/// channel plus the channel of the user it authenticated, and nothing
/// else. Private events for other users are unreachable from those
/// two subscriptions.
pub struct ChannelBroadcaster {
    capacity: usize,
    rooms: DashMap<GameId, broadcast::Sender<OutboundEvent>>,
    users: DashMap<(GameId, UserId), broadcast::Sender<OutboundEvent>>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rooms: DashMap::new(),
            users: DashMap::new(),
        }
    }

    /// Room-scoped events only; never yields private envelopes.
    pub fn subscribe(&self, room: GameId) -> broadcast::Receiver<OutboundEvent> {
        self.room_sender(room).subscribe()
    }

    pub fn stream(&self, room: GameId) -> BroadcastStream<OutboundEvent> {
        BroadcastStream::new(self.subscribe(room))
    }

    /// Private events addressed to `user_id` in `room`, and nothing
    /// else. Callers must only hand this to connections they have
    /// authenticated as `user_id`.
    pub fn subscribe_user(&self, room: GameId, user_id: UserId) -> broadcast::Receiver<OutboundEvent> {
        self.user_sender(room, user_id).subscribe()
    }

    pub fn user_stream(&self, room: GameId, user_id: UserId) -> BroadcastStream<OutboundEvent> {
        BroadcastStream::new(self.subscribe_user(room, user_id))
    }

    fn room_sender(&self, room: GameId) -> broadcast::Sender<OutboundEvent> {
        self.rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    fn user_sender(&self, room: GameId, user_id: UserId) -> broadcast::Sender<OutboundEvent> {
        self.users
            .entry((room, user_id))
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, room: GameId, event: &RoomEvent) {
        let outbound = OutboundEvent {
            audience: Audience::Room,
            event: event.clone(),
        };
        // A send error only means no subscriber is connected; the
        // contract is best-effort, so the event is dropped.
        if self.room_sender(room).send(outbound).is_err() {
            debug!(target: LOG_TARGET, room, "no subscribers for room event");
        }
    }

    fn send_private(&self, room: GameId, user_id: UserId, event: &RoomEvent) {
        let outbound = OutboundEvent {
            audience: Audience::User { user_id },
            event: event.clone(),
        };
        if self.user_sender(room, user_id).send(outbound).is_err() {
            debug!(target: LOG_TARGET, room, user_id, "no subscribers for private event");
        }
    }
}

/// Test double that records every emission in order.
#[derive(Default)]
pub struct RecordingBroadcaster {
    log: Mutex<Vec<(GameId, OutboundEvent)>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// All envelopes for a room, in emission order.
    pub fn all(&self, room: GameId) -> Vec<OutboundEvent> {
        self.log
            .lock()
            .iter()
            .filter(|(r, _)| *r == room)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Room-scoped events only.
    pub fn room_events(&self, room: GameId) -> Vec<RoomEvent> {
        self.all(room)
            .into_iter()
            .filter(|o| o.audience == Audience::Room)
            .map(|o| o.event)
            .collect()
    }

    /// Events delivered privately to one user.
    pub fn private_events(&self, room: GameId, user_id: UserId) -> Vec<RoomEvent> {
        self.all(room)
            .into_iter()
            .filter(|o| o.audience == Audience::User { user_id })
            .map(|o| o.event)
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast(&self, room: GameId, event: &RoomEvent) {
        self.log.lock().push((
            room,
            OutboundEvent {
                audience: Audience::Room,
                event: event.clone(),
            },
        ));
    }

    fn send_private(&self, room: GameId, user_id: UserId, event: &RoomEvent) {
        self.log.lock().push((
            room,
            OutboundEvent {
                audience: Audience::User { user_id },
                event: event.clone(),
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    fn hole_cards() -> RoomEvent {
        RoomEvent::HoleCardsDealt {
            hole_cards: ["Ah".parse().unwrap(), "Kd".parse().unwrap()],
        }
    }

    #[tokio::test]
    async fn room_events_reach_every_subscriber() {
        let fanout = ChannelBroadcaster::new(16);
        let mut a = fanout.subscribe(1);
        let mut b = fanout.subscribe(1);
        fanout.broadcast(1, &RoomEvent::PotUpdated { pot: 40 });
        for rx in [&mut a, &mut b] {
            let got = rx.recv().await.unwrap();
            assert_eq!(got.audience, Audience::Room);
            assert_eq!(got.event, RoomEvent::PotUpdated { pot: 40 });
        }
    }

    #[tokio::test]
    async fn private_events_reach_only_the_target_user_channel() {
        let fanout = ChannelBroadcaster::new(16);
        let mut target = fanout.user_stream(9, 42);
        fanout.send_private(9, 42, &hole_cards());
        let got = target.next().await.unwrap().unwrap();
        assert_eq!(got.audience, Audience::User { user_id: 42 });
        assert_eq!(got.event, hole_cards());
    }

    #[tokio::test]
    async fn room_subscriptions_never_carry_other_users_hole_cards() {
        let fanout = ChannelBroadcaster::new(16);
        let mut room = fanout.subscribe(9);
        let mut other_user = fanout.subscribe_user(9, 7);

        fanout.send_private(9, 42, &hole_cards());
        fanout.broadcast(9, &RoomEvent::PotUpdated { pot: 40 });

        // The room channel sees the room event and nothing private.
        let got = room.recv().await.unwrap();
        assert_eq!(got.audience, Audience::Room);
        assert!(matches!(
            room.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
        // Another user's private channel sees nothing at all.
        assert!(matches!(
            other_user.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn rooms_are_isolated() {
        let fanout = ChannelBroadcaster::new(16);
        let mut other = fanout.subscribe(2);
        fanout.broadcast(1, &RoomEvent::PotUpdated { pot: 10 });
        assert!(matches!(
            other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
