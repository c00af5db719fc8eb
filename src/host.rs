// src/host.rs
//
// The host link: the receiver shim that owns the real playback engine, media
// element, overlay and ad-insertion SDK connects here and we drive it with
// JSON commands. The collaborator traits the session needs are implemented on
// top of this link.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::interceptor::pending_load;
use crate::mediator::{Player, StreamManager, TimelineMediator};
use crate::models::{
    AdProgress, Break, BreakClip, LoadRequest, SeekRequest, StreamEvent, StreamRequest,
};
use crate::session::{ReceiverUi, SessionInput};
use crate::timeline::CuePointTimeline;
use crate::AppState;

/// Frames the host sends us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Load { request_id: u64, request: LoadRequest },
    Seek { request_id: u64, request: SeekRequest },
    Id3 { segment_data: String, timestamp: f64 },
    TimeUpdate { current_time: f64 },
    Stream { event: StreamEvent },
}

/// Frames we send the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    LoadResolved { request_id: u64, request: LoadRequest },
    LoadSuperseded { request_id: u64 },
    SeekResolved { request_id: u64, request: SeekRequest },
    RequestStream { request: StreamRequest },
    ProcessMetadata { kind: String, data: String, timestamp: f64 },
    SetCurrentTime { time: f64 },
    DispatchTimeUpdate,
    BreaksUpdated { breaks: Vec<Break>, break_clips: Vec<BreakClip> },
    AdUi { visible: bool },
    AdProgress(AdProgress),
    HideSplash,
}

#[derive(Clone)]
pub struct HostLink {
    commands: broadcast::Sender<HostCommand>,
    position: Arc<watch::Sender<f64>>,
}

impl HostLink {
    pub fn new(capacity: usize) -> Self {
        let (commands, _) = broadcast::channel(capacity.max(1));
        let (position, _) = watch::channel(0.0);
        Self {
            commands,
            position: Arc::new(position),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostCommand> {
        self.commands.subscribe()
    }

    pub fn report_position(&self, time: f64) {
        self.position.send_replace(time);
    }

    pub fn position(&self) -> f64 {
        *self.position.borrow()
    }

    fn send(&self, command: HostCommand) {
        if self.commands.send(command).is_err() {
            debug!("no host connected; command dropped");
        }
    }

    /// Mediator wired to this link's stream manager and player.
    pub fn mediator(&self) -> TimelineMediator {
        TimelineMediator::new(
            Box::new(HostStreamManager {
                link: self.clone(),
                timeline: CuePointTimeline::new(),
            }),
            Box::new(HostPlayer { link: self.clone() }),
        )
    }

    pub fn ui(&self) -> HostUi {
        HostUi { link: self.clone() }
    }
}

/// Ad-insertion SDK living in the host. Conversions are answered locally
/// from the last cue point list the SDK reported.
pub struct HostStreamManager {
    link: HostLink,
    timeline: CuePointTimeline,
}

impl StreamManager for HostStreamManager {
    fn request_stream(&mut self, request: StreamRequest) {
        self.link.send(HostCommand::RequestStream { request });
    }

    fn process_metadata(&mut self, kind: &str, data: &[u8], timestamp: f64) {
        self.link.send(HostCommand::ProcessMetadata {
            kind: kind.to_string(),
            data: STANDARD.encode(data),
            timestamp,
        });
    }

    fn content_time_for_stream_time(&self, stream_time: f64) -> f64 {
        self.timeline.content_time_for_stream_time(stream_time)
    }

    fn stream_time_for_content_time(&self, content_time: f64) -> f64 {
        self.timeline.stream_time_for_content_time(content_time)
    }

    fn reset(&mut self) {
        self.timeline.clear();
    }

    fn observe(&mut self, event: &StreamEvent) {
        if let StreamEvent::CuePointsChanged { cuepoints } = event {
            self.timeline.update(cuepoints);
        }
    }
}

pub struct HostPlayer {
    link: HostLink,
}

impl Player for HostPlayer {
    fn current_time(&self) -> f64 {
        self.link.position()
    }

    fn set_current_time(&mut self, time: f64) {
        // assume the seek lands until the host reports otherwise
        self.link.report_position(time);
        self.link.send(HostCommand::SetCurrentTime { time });
    }

    fn dispatch_time_update(&mut self) {
        self.link.send(HostCommand::DispatchTimeUpdate);
    }

    fn update_breaks(&mut self, breaks: Vec<Break>, break_clips: Vec<BreakClip>) {
        self.link.send(HostCommand::BreaksUpdated { breaks, break_clips });
    }
}

pub struct HostUi {
    link: HostLink,
}

impl ReceiverUi for HostUi {
    fn show_ad_ui(&mut self) {
        self.link.send(HostCommand::AdUi { visible: true });
    }

    fn hide_ad_ui(&mut self) {
        self.link.send(HostCommand::AdUi { visible: false });
    }

    fn show_ad_progress(&mut self, progress: AdProgress) {
        self.link.send(HostCommand::AdProgress(progress));
    }

    fn hide_splash(&mut self) {
        self.link.send(HostCommand::HideSplash);
    }
}

type PendingReply = BoxFuture<'static, HostCommand>;

/// Hand a host event to the session. Load and seek return the future of
/// their reply frame.
fn forward(
    event: HostEvent,
    link: &HostLink,
    inputs: &mpsc::UnboundedSender<SessionInput>,
) -> Option<PendingReply> {
    let (input, reply) = match event {
        HostEvent::Load { request_id, request } => {
            let (resolver, rx) = pending_load();
            let reply = async move {
                match rx.await {
                    Ok(request) => HostCommand::LoadResolved { request_id, request },
                    Err(_) => HostCommand::LoadSuperseded { request_id },
                }
            }
            .boxed();
            (SessionInput::Load { request, resolver }, Some(reply))
        }
        HostEvent::Seek { request_id, request } => {
            let (tx, rx) = oneshot::channel();
            let original = request.clone();
            let reply = async move {
                let request = rx.await.unwrap_or(original);
                HostCommand::SeekResolved { request_id, request }
            }
            .boxed();
            (SessionInput::Seek { request, reply: tx }, Some(reply))
        }
        HostEvent::Id3 { segment_data, timestamp } => {
            match STANDARD.decode(segment_data.as_bytes()) {
                Ok(data) => (SessionInput::Metadata { data, timestamp }, None),
                Err(e) => {
                    warn!("dropping ID3 frame with bad base64: {e}");
                    return None;
                }
            }
        }
        HostEvent::TimeUpdate { current_time } => {
            link.report_position(current_time);
            return None;
        }
        HostEvent::Stream { event } => (SessionInput::Stream(event), None),
    };

    if inputs.send(input).is_err() {
        error!("session task is gone; host event dropped");
    }
    reply
}

pub async fn host_socket(ws: WebSocketUpgrade, State(st): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_host_socket(socket, st.host.clone(), st.inputs.clone()))
}

async fn handle_host_socket(
    socket: WebSocket,
    link: HostLink,
    inputs: mpsc::UnboundedSender<SessionInput>,
) {
    info!("host connected");
    let (mut sender, mut receiver) = socket.split();
    let mut commands = link.subscribe();
    let mut replies: FuturesUnordered<PendingReply> = FuturesUnordered::new();

    loop {
        let outbound = tokio::select! {
            // a load reply must reach the host before the commands it triggered
            biased;

            Some(reply) = replies.next(), if !replies.is_empty() => reply,

            command = commands.recv() => match command {
                Ok(command) => command,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("host lagged by {n} commands");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<HostEvent>(text.as_str()) {
                            Ok(event) => {
                                if let Some(reply) = forward(event, &link, &inputs) {
                                    replies.push(reply);
                                }
                            }
                            Err(e) => warn!("malformed host frame: {e}"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!("host socket error: {e}");
                        break;
                    }
                    _ => {}
                }
                continue;
            }
        };

        let text = match serde_json::to_string(&outbound) {
            Ok(text) => text,
            Err(e) => {
                error!("failed to encode host command: {e}");
                continue;
            }
        };
        if sender.send(Message::Text(text.into())).await.is_err() {
            debug!("host went away mid-send");
            break;
        }
    }

    info!("host disconnected");
}
