//! One STOMP client connection with automatic reconnect.
//!
//! The task owns the socket; callers talk to it through [`StompHandle`].
//! After a disconnect it waits `reconnect_delay` and dials again, replaying
//! every active subscription. Subscription changes made while offline are
//! remembered; sends while offline are dropped.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, Interval};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::sockjs::{self, SockJsFrame};
use super::stomp::{self, Frame, Incoming};
use crate::config::WsTransport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MESSAGE_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct StompSettings {
    pub url: String,
    pub transport: WsTransport,
    pub reconnect_delay: Duration,
    /// `(outgoing, incoming)` heart-beat the client offers.
    pub heartbeat: (Duration, Duration),
}

/// A MESSAGE frame delivered on one of our subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub destination: String,
    pub body: String,
}

#[derive(Debug)]
enum Command {
    Subscribe(String),
    Unsubscribe(String),
    Send { destination: String, body: String },
}

/// Client handle: connection state, subscriptions and inbound messages.
#[derive(Debug, Clone)]
pub struct StompHandle {
    commands: mpsc::UnboundedSender<Command>,
    connected: watch::Receiver<bool>,
    messages: broadcast::Sender<InboundMessage>,
    access_token: Arc<RwLock<Option<String>>>,
    shutdown: CancellationToken,
}

impl StompHandle {
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    pub fn messages(&self) -> broadcast::Receiver<InboundMessage> {
        self.messages.subscribe()
    }

    pub fn subscribe(&self, destination: &str) {
        let _ = self.commands.send(Command::Subscribe(destination.to_string()));
    }

    pub fn unsubscribe(&self, destination: &str) {
        let _ = self.commands.send(Command::Unsubscribe(destination.to_string()));
    }

    pub fn send(&self, destination: &str, body: &str) {
        let _ = self.commands.send(Command::Send {
            destination: destination.to_string(),
            body: body.to_string(),
        });
    }

    /// Token used for the CONNECT frame of the next (re)connect.
    pub fn set_access_token(&self, token: Option<String>) {
        let mut slot = self.access_token.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Start the connection task.
pub fn spawn(settings: StompSettings, access_token: Option<String>) -> StompHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (connected_tx, connected_rx) = watch::channel(false);
    let (messages_tx, _) = broadcast::channel(MESSAGE_BUFFER);
    let access_token = Arc::new(RwLock::new(access_token));
    let shutdown = CancellationToken::new();

    let task = Task {
        settings,
        commands: commands_rx,
        connected: connected_tx,
        messages: messages_tx.clone(),
        access_token: access_token.clone(),
        shutdown: shutdown.clone(),
        subscriptions: Subscriptions::default(),
    };
    tokio::spawn(task.run());

    StompHandle {
        commands: commands_tx,
        connected: connected_rx,
        messages: messages_tx,
        access_token,
        shutdown,
    }
}

#[derive(Debug, Default)]
struct Subscriptions {
    by_destination: BTreeMap<String, String>,
    next_id: u64,
}

impl Subscriptions {
    /// Register `destination`; returns the new subscription id, or `None` if already active.
    fn add(&mut self, destination: &str) -> Option<String> {
        if self.by_destination.contains_key(destination) {
            return None;
        }
        let id = format!("sub-{}", self.next_id);
        self.next_id += 1;
        self.by_destination
            .insert(destination.to_string(), id.clone());
        Some(id)
    }

    fn remove(&mut self, destination: &str) -> Option<String> {
        self.by_destination.remove(destination)
    }
}

enum SessionEnd {
    Shutdown,
    Closed(String),
}

struct Task {
    settings: StompSettings,
    commands: mpsc::UnboundedReceiver<Command>,
    connected: watch::Sender<bool>,
    messages: broadcast::Sender<InboundMessage>,
    access_token: Arc<RwLock<Option<String>>>,
    shutdown: CancellationToken,
    subscriptions: Subscriptions,
}

impl Task {
    async fn run(mut self) {
        let mut attempt: u64 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            attempt += 1;

            match self.session().await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Closed(reason)) => {
                    tracing::info!("STOMP connection closed: {reason}");
                    attempt = 0;
                }
                Err(e) => tracing::warn!("STOMP connection attempt {attempt} failed: {e}"),
            }
            self.connected.send_replace(false);

            if !self.wait_reconnect_delay().await {
                break;
            }
        }

        self.connected.send_replace(false);
        tracing::debug!("STOMP connection task stopped");
    }

    /// Sleep for the reconnect delay while still tracking subscription changes.
    /// Returns false if the handle was shut down or dropped meanwhile.
    async fn wait_reconnect_delay(&mut self) -> bool {
        let sleep = tokio::time::sleep(self.settings.reconnect_delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                _ = self.shutdown.cancelled() => return false,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.apply_offline(cmd),
                    None => return false,
                },
            }
        }
    }

    fn apply_offline(&mut self, cmd: Command) {
        match cmd {
            Command::Subscribe(destination) => {
                self.subscriptions.add(&destination);
            }
            Command::Unsubscribe(destination) => {
                self.subscriptions.remove(&destination);
            }
            Command::Send { destination, .. } => {
                tracing::warn!("Dropping message to {destination}: not connected");
            }
        }
    }

    /// Dial, send CONNECT and wait for CONNECTED.
    async fn handshake(&self) -> Result<(Transport, Frame), String> {
        let mut transport = Transport::open(&self.settings).await?;

        let token = self
            .access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let mut connect_headers = Vec::new();
        if let Some(token) = token {
            connect_headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        let connect = Frame::connect(
            &host_of(&self.settings.url),
            self.settings.heartbeat,
            &connect_headers,
        );
        transport.send_frame(&connect).await?;

        let connected = transport.await_connected().await?;
        Ok((transport, connected))
    }

    async fn session(&mut self) -> Result<SessionEnd, String> {
        // A shutdown while dialing drops the half-open socket.
        let shutdown = self.shutdown.clone();
        let (mut transport, connected) = tokio::select! {
            _ = shutdown.cancelled() => return Ok(SessionEnd::Shutdown),
            handshake = tokio::time::timeout(CONNECT_TIMEOUT, self.handshake()) => {
                handshake.map_err(|_| "Timed out waiting for CONNECTED".to_string())??
            }
        };

        let (send_every, expect_within) =
            stomp::negotiate_heartbeat(self.settings.heartbeat, connected.get("heart-beat"));
        let mut send_tick = send_every.map(every);
        let mut check_tick = expect_within.map(every);

        for (destination, id) in &self.subscriptions.by_destination {
            transport
                .send_frame(&Frame::subscribe(id, destination))
                .await?;
        }

        self.connected.send_replace(true);
        tracing::info!(
            "STOMP connected (heart-beat out {:?}, in {:?})",
            send_every,
            expect_within
        );

        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    transport.close().await;
                    return Ok(SessionEnd::Shutdown);
                }
                cmd = self.commands.recv() => match cmd {
                    None => {
                        transport.close().await;
                        return Ok(SessionEnd::Shutdown);
                    }
                    Some(Command::Subscribe(destination)) => {
                        if let Some(id) = self.subscriptions.add(&destination) {
                            transport.send_frame(&Frame::subscribe(&id, &destination)).await?;
                        }
                    }
                    Some(Command::Unsubscribe(destination)) => {
                        if let Some(id) = self.subscriptions.remove(&destination) {
                            transport.send_frame(&Frame::unsubscribe(&id)).await?;
                        }
                    }
                    Some(Command::Send { destination, body }) => {
                        transport.send_frame(&Frame::send(&destination, &body)).await?;
                    }
                },
                received = transport.recv() => match received? {
                    Received::Closed(reason) => return Ok(SessionEnd::Closed(reason)),
                    Received::Units(units) => {
                        last_seen = Instant::now();
                        for unit in units {
                            self.dispatch(unit)?;
                        }
                    }
                },
                _ = tick(&mut send_tick) => transport.send_heartbeat().await?,
                _ = tick(&mut check_tick) => {
                    if let Some(limit) = expect_within {
                        if last_seen.elapsed() > limit * 2 {
                            return Ok(SessionEnd::Closed("heart-beat timeout".to_string()));
                        }
                    }
                }
            }
        }
    }

    fn dispatch(&self, unit: Incoming) -> Result<(), String> {
        let Incoming::Frame(frame) = unit else {
            return Ok(());
        };

        match frame.command.as_str() {
            "MESSAGE" => {
                let message = InboundMessage {
                    destination: frame.get("destination").unwrap_or_default().to_string(),
                    body: frame.body_text(),
                };
                // No receivers just means no browser is listening right now.
                let _ = self.messages.send(message);
                Ok(())
            }
            "ERROR" => Err(format!(
                "Broker error: {}",
                frame
                    .get("message")
                    .map(str::to_string)
                    .unwrap_or_else(|| frame.body_text())
            )),
            "RECEIPT" => Ok(()),
            other => {
                tracing::debug!("Ignoring STOMP {other} frame");
                Ok(())
            }
        }
    }
}

fn every(period: Duration) -> Interval {
    tokio::time::interval_at(Instant::now() + period, period)
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or_default()
        .to_string()
}

enum Received {
    Units(Vec<Incoming>),
    Closed(String),
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Transport {
    socket: Socket,
    sockjs: bool,
    decoder: stomp::Decoder,
}

impl Transport {
    async fn open(settings: &StompSettings) -> Result<Self, String> {
        let sockjs = settings.transport == WsTransport::SockJs;
        let url = if sockjs {
            sockjs::websocket_url(&settings.url)?
        } else {
            sockjs::ws_scheme(&settings.url)?
        };

        tracing::debug!("Dialing {url}");
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| format!("WebSocket connect failed: {e}"))?;

        let mut transport = Transport {
            socket,
            sockjs,
            decoder: stomp::Decoder::new(),
        };

        if sockjs {
            transport.await_open().await?;
        }
        Ok(transport)
    }

    async fn await_open(&mut self) -> Result<(), String> {
        loop {
            let text = match self.socket.next().await {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Close(_))) | None => {
                    return Err("Closed before SockJS open".to_string());
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(format!("WebSocket error: {e}")),
            };
            match sockjs::parse(text.as_str())? {
                SockJsFrame::Open => return Ok(()),
                SockJsFrame::Heartbeat => continue,
                SockJsFrame::Close(code, reason) => {
                    return Err(format!("SockJS refused session: {code} {reason}"));
                }
                SockJsFrame::Messages(_) => return Err("SockJS data before open".to_string()),
            }
        }
    }

    async fn await_connected(&mut self) -> Result<Frame, String> {
        loop {
            match self.recv().await? {
                Received::Closed(reason) => return Err(format!("Closed before CONNECTED: {reason}")),
                Received::Units(units) => {
                    for unit in units {
                        let Incoming::Frame(frame) = unit else {
                            continue;
                        };
                        match frame.command.as_str() {
                            "CONNECTED" => return Ok(frame),
                            "ERROR" => {
                                return Err(format!(
                                    "Broker rejected CONNECT: {}",
                                    frame.get("message").unwrap_or_default()
                                ));
                            }
                            other => tracing::debug!("Unexpected {other} before CONNECTED"),
                        }
                    }
                }
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), String> {
        let payload = if self.sockjs {
            sockjs::encode(&[text])
        } else {
            text
        };
        self.socket
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| format!("WebSocket send failed: {e}"))
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), String> {
        self.send_text(frame.encode_text()).await
    }

    async fn send_heartbeat(&mut self) -> Result<(), String> {
        self.send_text("\n".to_string()).await
    }

    /// Read one transport message and return every complete STOMP unit it finished.
    async fn recv(&mut self) -> Result<Received, String> {
        let message = match self.socket.next().await {
            None => return Ok(Received::Closed("end of stream".to_string())),
            Some(Err(e)) => return Err(format!("WebSocket error: {e}")),
            Some(Ok(message)) => message,
        };

        match message {
            Message::Text(text) if self.sockjs => match sockjs::parse(text.as_str())? {
                SockJsFrame::Open | SockJsFrame::Heartbeat => {}
                SockJsFrame::Messages(parts) => {
                    for part in parts {
                        self.decoder.push(part.as_bytes());
                    }
                }
                SockJsFrame::Close(code, reason) => {
                    return Ok(Received::Closed(format!("SockJS close {code} {reason}")));
                }
            },
            Message::Text(text) => self.decoder.push(text.as_bytes()),
            Message::Binary(bytes) => self.decoder.push(&bytes),
            Message::Close(frame) => {
                let reason = frame
                    .map(|f| format!("{} {}", f.code, f.reason))
                    .unwrap_or_else(|| "no close frame".to_string());
                return Ok(Received::Closed(reason));
            }
            _ => {}
        }

        let mut units = Vec::new();
        while let Some(unit) = self.decoder.next()? {
            units.push(unit);
        }
        Ok(Received::Units(units))
    }

    async fn close(&mut self) {
        let _ = self.send_frame(&Frame::disconnect("disconnect-0")).await;
        let _ = self.socket.close(None).await;
    }
}
