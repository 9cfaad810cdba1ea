//! In-process realtime channel between operators and open widgets.
//!
//! Each chat room has its own broadcast channel, created on first use. The
//! widget subscribes over SSE while a room is in realtime mode; operator
//! replies and visitor messages in live rooms are published here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_stream::stream;
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast;

use udyog_core::{ChatRole, ChatRoomId};

/// SSE event name the widget listens for.
pub const REALTIME_EVENT: &str = "realtime-mode";

const CHANNEL_CAPACITY: usize = 64;

/// Payload published on a room channel: `{"chat":{"role":..,"message":..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealtimeEvent {
    pub chat: RealtimeChat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealtimeChat {
    pub role: ChatRole,
    pub message: String,
}

impl RealtimeEvent {
    #[must_use]
    pub fn new(role: ChatRole, message: impl Into<String>) -> Self {
        Self {
            chat: RealtimeChat {
                role,
                message: message.into(),
            },
        }
    }
}

/// Registry of per-room broadcast channels.
#[derive(Clone, Default)]
pub struct RealtimeHub {
    channels: Channels,
}

impl RealtimeHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to everyone watching `room`.
    ///
    /// Returns the number of subscribers that received it. A room nobody is
    /// watching is dropped from the registry.
    pub fn publish(&self, room: ChatRoomId, event: RealtimeEvent) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(&room) else {
            return 0;
        };
        if sender.receiver_count() == 0 {
            channels.remove(&room);
            return 0;
        }
        sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events of `room`.
    ///
    /// Rooms whose subscribers have all gone are swept first.
    #[must_use]
    pub fn subscribe(&self, room: ChatRoomId) -> broadcast::Receiver<RealtimeEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.retain(|_, sender| sender.receiver_count() > 0);
        channels
            .entry(room)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Subscribe to `room` as a stream. Lagging subscribers skip the events
    /// they missed. Dropping the stream releases the room once nobody else
    /// is watching it.
    pub fn stream(&self, room: ChatRoomId) -> impl Stream<Item = RealtimeEvent> + Send + use<> {
        let mut subscription = Subscription {
            channels: Arc::clone(&self.channels),
            room,
            receiver: Some(self.subscribe(room)),
        };
        stream! {
            loop {
                match subscription.recv().await {
                    Ok(event) => yield event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(chat_room_id = %room, skipped, "Realtime subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Number of rooms with a live channel.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

type Channels = Arc<Mutex<HashMap<ChatRoomId, broadcast::Sender<RealtimeEvent>>>>;

/// Receiver that unregisters its room when the last subscriber drops.
struct Subscription {
    channels: Channels,
    room: ChatRoomId,
    receiver: Option<broadcast::Receiver<RealtimeEvent>>,
}

impl Subscription {
    async fn recv(&mut self) -> Result<RealtimeEvent, broadcast::error::RecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => Err(broadcast::error::RecvError::Closed),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        drop(self.receiver.take());
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if channels
            .get(&self.room)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&self.room);
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    fn room() -> ChatRoomId {
        ChatRoomId::new(uuid::Uuid::new_v4())
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(RealtimeEvent::new(ChatRole::Assistant, "On it"))
            .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"chat": {"role": "assistant", "message": "On it"}})
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let hub = RealtimeHub::new();
        assert_eq!(hub.publish(room(), RealtimeEvent::new(ChatRole::User, "hi")), 0);
        assert_eq!(hub.room_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_only_its_room() {
        let hub = RealtimeHub::new();
        let (a, b) = (room(), room());
        let mut rx = hub.subscribe(a);

        assert_eq!(hub.publish(b, RealtimeEvent::new(ChatRole::User, "other")), 0);
        assert_eq!(hub.publish(a, RealtimeEvent::new(ChatRole::User, "mine")), 1);

        let event = rx.recv().await.expect("event");
        assert_eq!(event.chat.message, "mine");
    }

    #[tokio::test]
    async fn test_dropped_subscriber_prunes_room() {
        let hub = RealtimeHub::new();
        let a = room();
        drop(hub.subscribe(a));
        assert_eq!(hub.room_count(), 1);
        hub.publish(a, RealtimeEvent::new(ChatRole::User, "anyone?"));
        assert_eq!(hub.room_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_yields_published_events() {
        let hub = RealtimeHub::new();
        let a = room();
        let stream = hub.stream(a);
        let mut stream = std::pin::pin!(stream);

        hub.publish(a, RealtimeEvent::new(ChatRole::Assistant, "hello from a human"));
        let event = stream.next().await.expect("event");
        assert_eq!(event.chat.role, ChatRole::Assistant);
    }

    #[test]
    fn test_abandoned_streams_release_their_rooms() {
        let hub = RealtimeHub::new();
        for _ in 0..1000 {
            drop(hub.stream(room()));
        }
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_stream_drop_keeps_room_with_other_watchers() {
        let hub = RealtimeHub::new();
        let a = room();
        let _rx = hub.subscribe(a);
        drop(hub.stream(a));
        assert_eq!(hub.room_count(), 1);
    }

    #[test]
    fn test_subscribe_sweeps_dead_rooms() {
        let hub = RealtimeHub::new();
        for _ in 0..10 {
            drop(hub.subscribe(room()));
        }
        let _rx = hub.subscribe(room());
        assert_eq!(hub.room_count(), 1);
    }
}
