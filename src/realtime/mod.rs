//! Live notifications and chat from the communication service.
//!
//! [`NotificationHub`] keeps one STOMP connection per signed-in user, shared by
//! every browser socket that user has open. Each socket holds a [`ViewerGuard`];
//! the connection closes when the last guard drops or the user logs out.

pub mod connection;
pub mod sockjs;
pub mod stomp;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::config::RealtimeConfig;
pub use connection::{InboundMessage, StompHandle, StompSettings};

const CHAT_TOPIC_PREFIX: &str = "/topic/chat/";

pub fn chat_topic(room_id: Uuid) -> String {
    format!("{CHAT_TOPIC_PREFIX}{room_id}")
}

pub fn chat_send_destination(room_id: Uuid) -> String {
    format!("/app/chat/{room_id}")
}

/// Room id of a chat topic destination.
pub fn chat_room_of(destination: &str) -> Option<Uuid> {
    destination
        .strip_prefix(CHAT_TOPIC_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
}

struct UserChannel {
    handle: StompHandle,
    notification_topic: String,
    viewers: AtomicUsize,
    rooms: Mutex<HashMap<Uuid, usize>>,
}

impl UserChannel {
    fn join(&self, room_id: Uuid) {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        let count = rooms.entry(room_id).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.handle.subscribe(&chat_topic(room_id));
        }
    }

    fn leave(&self, room_id: Uuid) {
        let mut rooms = self.rooms.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = rooms.get_mut(&room_id) {
            *count -= 1;
            if *count == 0 {
                rooms.remove(&room_id);
                self.handle.unsubscribe(&chat_topic(room_id));
            }
        }
    }
}

#[derive(Clone)]
pub struct NotificationHub {
    ws_url: String,
    config: RealtimeConfig,
    channels: Arc<DashMap<Uuid, Arc<UserChannel>>>,
}

impl NotificationHub {
    pub fn new(ws_url: &str, config: RealtimeConfig) -> Self {
        Self {
            ws_url: ws_url.to_string(),
            config,
            channels: Arc::new(DashMap::new()),
        }
    }

    pub fn notification_topic(&self, user_id: Uuid) -> String {
        self.config
            .notification_topic
            .replace("{userId}", &user_id.to_string())
    }

    fn open_channel(&self, user_id: Uuid, access_token: &str) -> Arc<UserChannel> {
        let settings = StompSettings {
            url: self.ws_url.clone(),
            transport: self.config.transport,
            reconnect_delay: self.config.reconnect_delay,
            heartbeat: (self.config.heartbeat_outgoing, self.config.heartbeat_incoming),
        };
        let handle = connection::spawn(settings, Some(access_token.to_string()));
        let notification_topic = self.notification_topic(user_id);
        handle.subscribe(&notification_topic);
        tracing::info!(%user_id, "Opened realtime channel");

        Arc::new(UserChannel {
            handle,
            notification_topic,
            viewers: AtomicUsize::new(0),
            rooms: Mutex::new(HashMap::new()),
        })
    }

    /// Register a viewer for `user_id`, opening the user's connection if needed.
    pub fn attach(&self, user_id: Uuid, access_token: &str) -> ViewerGuard {
        let channel = match self.channels.entry(user_id) {
            Entry::Occupied(entry) if !entry.get().handle.is_shut_down() => {
                let channel = entry.get().clone();
                channel.viewers.fetch_add(1, Ordering::SeqCst);
                channel
            }
            Entry::Occupied(mut entry) => {
                let channel = self.open_channel(user_id, access_token);
                channel.viewers.fetch_add(1, Ordering::SeqCst);
                entry.insert(channel.clone());
                channel
            }
            Entry::Vacant(entry) => {
                let channel = self.open_channel(user_id, access_token);
                channel.viewers.fetch_add(1, Ordering::SeqCst);
                entry.insert(channel.clone());
                channel
            }
        };

        channel
            .handle
            .set_access_token(Some(access_token.to_string()));

        ViewerGuard {
            channels: self.channels.clone(),
            user_id,
            channel,
            rooms: HashSet::new(),
        }
    }

    /// Close the user's connection regardless of attached viewers.
    pub fn disconnect(&self, user_id: Uuid) {
        if let Some((_, channel)) = self.channels.remove(&user_id) {
            channel.handle.shutdown();
            tracing::info!(%user_id, "Closed realtime channel");
        }
    }

    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.channels
            .get(&user_id)
            .is_some_and(|c| c.handle.is_connected())
    }

    pub fn viewers(&self, user_id: Uuid) -> usize {
        self.channels
            .get(&user_id)
            .map(|c| c.viewers.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn active_users(&self) -> usize {
        self.channels.len()
    }
}

/// One attached browser socket.
pub struct ViewerGuard {
    channels: Arc<DashMap<Uuid, Arc<UserChannel>>>,
    user_id: Uuid,
    channel: Arc<UserChannel>,
    rooms: HashSet<Uuid>,
}

impl ViewerGuard {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn handle(&self) -> &StompHandle {
        &self.channel.handle
    }

    pub fn notification_topic(&self) -> &str {
        &self.channel.notification_topic
    }

    pub fn join_chat(&mut self, room_id: Uuid) {
        if self.rooms.insert(room_id) {
            self.channel.join(room_id);
        }
    }

    pub fn leave_chat(&mut self, room_id: Uuid) {
        if self.rooms.remove(&room_id) {
            self.channel.leave(room_id);
        }
    }

    pub fn in_chat(&self, room_id: Uuid) -> bool {
        self.rooms.contains(&room_id)
    }

    pub fn send_chat(&self, room_id: Uuid, body: &str) {
        self.channel
            .handle
            .send(&chat_send_destination(room_id), body);
    }
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        for room_id in self.rooms.drain() {
            self.channel.leave(room_id);
        }

        let channel = &self.channel;
        let removed = self.channels.remove_if(&self.user_id, |_, current| {
            Arc::ptr_eq(current, channel) && current.viewers.fetch_sub(1, Ordering::SeqCst) == 1
        });

        if removed.is_some() {
            channel.handle.shutdown();
            tracing::info!(user_id = %self.user_id, "Last viewer left, closed realtime channel");
        }
    }
}
