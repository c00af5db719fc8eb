// src/session.rs
//
// One playback session. All inputs (host playback hooks, ad-insertion service
// events, controller commands) are funnelled through a single task that owns
// this struct, so state is only ever touched by one handler at a time.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::breaks::{AdBreak, BreakRegistry};
use crate::interceptor::{LoadInterceptor, LoadResolver, ResolvedLoad};
use crate::mediator::{SeekDecision, TimelineMediator};
use crate::models::{AdProgress, LoadRequest, SeekRequest, StreamEvent, StreamType, Subtitle};
use crate::relay::{Broadcast, ControllerCommand, Relay};
use crate::store::{NewAdEvent, NewBookmark, Store};

/// On-screen signals the receiver shows around ad playback.
pub trait ReceiverUi: Send + Sync {
    fn show_ad_ui(&mut self);
    fn hide_ad_ui(&mut self);
    fn show_ad_progress(&mut self, progress: AdProgress);
    fn hide_splash(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub ad_is_playing: bool,
    pub pending_seek_target: Option<f64>,
    /// Content-time position to resume from, taken from the load's stream parameters.
    pub start_time: f64,
    pub backup_stream_url: String,
}

impl SessionState {
    pub fn new(backup_stream_url: impl Into<String>) -> Self {
        Self {
            ad_is_playing: false,
            pending_seek_target: None,
            start_time: 0.0,
            backup_stream_url: backup_stream_url.into(),
        }
    }

    fn reset(&mut self) {
        self.ad_is_playing = false;
        self.pending_seek_target = None;
        self.start_time = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub ad_is_playing: bool,
    pub pending_seek_target: Option<f64>,
    pub start_time: f64,
    pub load_pending: bool,
    pub current_time: f64,
    pub breaks: Vec<AdBreak>,
}

#[derive(Debug)]
pub enum SessionInput {
    Load {
        request: LoadRequest,
        resolver: LoadResolver,
    },
    Seek {
        request: SeekRequest,
        reply: oneshot::Sender<SeekRequest>,
    },
    Stream(StreamEvent),
    Metadata {
        data: Vec<u8>,
        timestamp: f64,
    },
    Controller(String),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

pub struct Session {
    id: Option<Uuid>,
    state: SessionState,
    breaks: BreakRegistry,
    mediator: TimelineMediator,
    interceptor: LoadInterceptor,
    ui: Box<dyn ReceiverUi>,
    relay: Relay,
    store: Arc<dyn Store>,
}

impl Session {
    pub fn new(
        mediator: TimelineMediator,
        ui: Box<dyn ReceiverUi>,
        relay: Relay,
        store: Arc<dyn Store>,
        backup_stream_url: &str,
    ) -> Self {
        Self {
            id: None,
            state: SessionState::new(backup_stream_url),
            breaks: BreakRegistry::new(),
            mediator,
            interceptor: LoadInterceptor::new(backup_stream_url),
            ui,
            relay,
            store,
        }
    }

    pub async fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Load { request, resolver } => self.load(request, resolver).await,
            SessionInput::Seek { request, reply } => {
                let request = self.seek(request);
                if reply.send(request).is_err() {
                    debug!("seek requester went away");
                }
            }
            SessionInput::Stream(event) => self.on_stream_event(event).await,
            SessionInput::Metadata { data, timestamp } => {
                self.mediator.stream_manager().process_metadata("ID3", &data, timestamp);
            }
            SessionInput::Controller(message) => self.on_controller_message(&message).await,
            SessionInput::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Start a new session around an intercepted LOAD.
    pub async fn load(&mut self, request: LoadRequest, resolver: LoadResolver) {
        let id = Uuid::new_v4();
        self.id = Some(id);
        self.state.reset();
        self.breaks.clear();
        self.mediator.stream_manager().reset();
        info!(session_id = %id, "new playback session");

        let plan = self.interceptor.intercept(request, resolver);
        self.state.start_time = plan.start_time;

        match plan.stream_request {
            Some(stream_request) => {
                self.mediator.stream_manager().request_stream(stream_request);
                self.ui.hide_splash();
                if plan.fire_manual_time_update {
                    debug!("firing manual time update");
                    self.mediator.player().dispatch_time_update();
                }
            }
            None => {
                warn!("load carries no stream request parameters");
                self.on_stream_error(Some("missing stream request parameters".to_string()))
                    .await;
            }
        }
    }

    pub fn seek(&mut self, mut request: SeekRequest) -> SeekRequest {
        let Some(target) = request.current_time else {
            return request;
        };

        match self.mediator.redirect_seek(target, self.state.ad_is_playing, &self.breaks) {
            SeekDecision::Suppressed { to } => request.current_time = Some(to),
            SeekDecision::Redirected { to, resume_at } => {
                request.current_time = Some(to);
                self.state.pending_seek_target = Some(resume_at);
            }
            SeekDecision::PassThrough => {}
        }
        request
    }

    pub async fn on_stream_event(&mut self, event: StreamEvent) {
        self.mediator.stream_manager().observe(&event);

        match event {
            StreamEvent::Loaded { url, subtitles } => self.on_stream_loaded(url, subtitles).await,
            StreamEvent::Error { message } => self.on_stream_error(message).await,
            StreamEvent::CuePointsChanged { cuepoints } => {
                self.breaks.ingest(&cuepoints);
                self.sync_breaks();
                self.log_event("cue_points_changed", Some(json!({ "count": cuepoints.len() })))
                    .await;
            }
            StreamEvent::AdBreakStarted => {
                self.state.ad_is_playing = true;
                self.ui.show_ad_ui();
                self.relay.broadcast(Broadcast::AdBreakStarted);
                self.log_event("ad_break_started", None).await;
            }
            StreamEvent::AdBreakEnded => {
                self.state.ad_is_playing = false;
                self.ui.hide_ad_ui();
                self.relay.broadcast(Broadcast::AdBreakEnded);

                let position = self.mediator.current_time();
                if let Some(break_id) = self.breaks.mark_watched_before(position) {
                    debug!(%break_id, position, "break watched");
                    self.sync_breaks();
                }
                self.log_event("ad_break_ended", None).await;

                if let Some(target) = self.state.pending_seek_target.take() {
                    self.seek_to(target);
                }
            }
            StreamEvent::AdProgress(data) => {
                self.ui.show_ad_progress(data.into());
            }
            quartile @ (StreamEvent::Started
            | StreamEvent::FirstQuartile
            | StreamEvent::Midpoint
            | StreamEvent::ThirdQuartile
            | StreamEvent::Complete) => {
                info!(event = quartile.kind(), "ad SDK event");
                self.log_event(quartile.kind(), None).await;
            }
        }
    }

    pub async fn on_controller_message(&mut self, message: &str) {
        debug!(message, "received message from controller");

        match message.parse::<ControllerCommand>() {
            Ok(ControllerCommand::Bookmark(time)) => {
                let content_time = self.mediator.content_time_for_stream_time(time);
                self.relay.broadcast(Broadcast::Bookmark(content_time));
                self.bookmark(time, content_time).await;
            }
            Ok(ControllerCommand::GetContentTime) => {
                let content_time = self.mediator.content_time();
                self.relay.broadcast(Broadcast::ContentTime(content_time));
            }
            Err(e) => {
                debug!(message, "controller message not recognized: {e}");
                self.relay.broadcast(Broadcast::NotRecognized);
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.map(|id| id.to_string()),
            ad_is_playing: self.state.ad_is_playing,
            pending_seek_target: self.state.pending_seek_target,
            start_time: self.state.start_time,
            load_pending: self.interceptor.is_pending(),
            current_time: self.mediator.current_time(),
            breaks: self.breaks.breaks().to_vec(),
        }
    }

    async fn on_stream_loaded(&mut self, url: String, subtitles: Vec<Subtitle>) {
        let resolved = self.interceptor.on_stream_loaded(&url, &subtitles, &self.breaks);
        let Some(resolved) = resolved else {
            return;
        };
        self.relay.broadcast(Broadcast::StreamRequestSucceeded);
        self.after_resolution(resolved);
        self.log_event("stream_loaded", Some(json!({ "url": url }))).await;
    }

    async fn on_stream_error(&mut self, message: Option<String>) {
        let Some(resolved) = self.interceptor.on_stream_error(&self.breaks) else {
            return;
        };
        self.relay.broadcast(Broadcast::StreamRequestFailed);
        self.after_resolution(resolved);
        self.log_event("stream_error", message.map(|m| json!({ "message": m })))
            .await;
    }

    /// Resume on-demand playback at the stored content position.
    fn after_resolution(&mut self, resolved: ResolvedLoad) {
        info!(
            session_id = ?self.id,
            stream_type = ?resolved.stream_type,
            used_backup = resolved.used_backup,
            "load resolved"
        );
        if resolved.stream_type == StreamType::Buffered && self.state.start_time != 0.0 {
            let to = self.mediator.stream_time_for_content_time(self.state.start_time);
            debug!(start_time = self.state.start_time, to, "resuming at stored start time");
            self.mediator.player().set_current_time(to);
        }
    }

    /// Push the registry to wherever the break markers currently live.
    fn sync_breaks(&mut self) {
        if self.interceptor.is_pending() {
            self.interceptor.on_breaks_changed(&self.breaks);
        } else if self.id.is_some() {
            let (breaks, clips) = self.breaks.descriptors();
            self.mediator.player().update_breaks(breaks, clips);
        }
    }

    fn seek_to(&mut self, time: f64) {
        if self.state.ad_is_playing {
            return;
        }
        self.mediator.player().set_current_time(time);
        self.relay.broadcast(Broadcast::SeekingTo(time));
    }

    async fn bookmark(&self, stream_time: f64, content_time: f64) {
        let bookmark = NewBookmark {
            session_id: self.id.map(|id| id.to_string()),
            stream_time,
            content_time,
        };
        if let Err(e) = self.store.save_bookmark(bookmark).await {
            error!(stream_time, "failed to save bookmark: {e}");
        }
    }

    async fn log_event(&self, kind: &str, detail: Option<serde_json::Value>) {
        let event = NewAdEvent {
            session_id: self.id.map(|id| id.to_string()),
            kind: kind.to_string(),
            stream_time: Some(self.mediator.current_time()),
            detail,
        };
        if let Err(e) = self.store.log_event(event).await {
            error!(kind, "failed to log ad event: {e}");
        }
    }
}

/// Drive a session until every input sender is gone.
pub async fn run(mut session: Session, mut inputs: mpsc::UnboundedReceiver<SessionInput>) {
    while let Some(input) = inputs.recv().await {
        session.handle(input).await;
    }
    info!("session inputs closed; stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::pending_load;
    use crate::mediator::tests::{fake_mediator, Recorded};
    use crate::models::{CuePoint, MediaInformation, StreamRequest, StreamRequestParams};
    use crate::store::sqlite::SqliteStore;
    use crate::store::EventFilters;
    use std::sync::Mutex;
    use tokio::sync::broadcast::{self, error::TryRecvError};

    const BACKUP: &str = "http://backup.example/master.m3u8";

    #[derive(Debug, Default)]
    struct UiRecord {
        ad_ui_visible: bool,
        splash_hidden: bool,
        progress: Vec<AdProgress>,
    }

    struct FakeUi(Arc<Mutex<UiRecord>>);

    impl ReceiverUi for FakeUi {
        fn show_ad_ui(&mut self) {
            self.0.lock().unwrap().ad_ui_visible = true;
        }
        fn hide_ad_ui(&mut self) {
            self.0.lock().unwrap().ad_ui_visible = false;
        }
        fn show_ad_progress(&mut self, progress: AdProgress) {
            let mut ui = self.0.lock().unwrap();
            ui.ad_ui_visible = true;
            ui.progress.push(progress);
        }
        fn hide_splash(&mut self) {
            self.0.lock().unwrap().splash_hidden = true;
        }
    }

    struct Harness {
        session: Session,
        recorded: Arc<Mutex<Recorded>>,
        ui: Arc<Mutex<UiRecord>>,
        broadcasts: broadcast::Receiver<String>,
        store: Arc<SqliteStore>,
    }

    impl Harness {
        fn drain(&mut self) -> Vec<String> {
            let mut out = Vec::new();
            while let Ok(message) = self.broadcasts.try_recv() {
                out.push(message);
            }
            out
        }

        fn set_position(&self, time: f64) {
            self.recorded.lock().unwrap().position = time;
        }
    }

    async fn harness(cue_points: &[CuePoint]) -> Harness {
        let (mediator, recorded) = fake_mediator(cue_points);
        let ui = Arc::new(Mutex::new(UiRecord::default()));
        let relay = Relay::new(32);
        let broadcasts = relay.subscribe();
        let store = Arc::new(SqliteStore::connect("sqlite::memory:").await.unwrap());
        let ui_box = Box::new(FakeUi(ui.clone()));
        let session = Session::new(mediator, ui_box, relay, store.clone(), BACKUP);
        Harness {
            session,
            recorded,
            ui,
            broadcasts,
            store,
        }
    }

    fn vod_load(start_time: Option<f64>) -> LoadRequest {
        LoadRequest {
            media: MediaInformation {
                stream_type: StreamType::Buffered,
                custom_data: Some(StreamRequestParams {
                    content_source_id: Some("2528370".into()),
                    video_id: Some("tears-of-steel".into()),
                    start_time,
                    ..Default::default()
                }),
                ..Default::default()
            },
            current_time: Some(0.0),
            ..Default::default()
        }
    }

    const BREAK_AT_10: CuePoint = CuePoint { start: 10.0, end: 15.0, played: false };

    #[tokio::test]
    async fn load_requests_stream_and_resolves_on_success() {
        let mut h = harness(&[]).await;
        let (resolver, rx) = pending_load();

        h.session.load(vod_load(None), resolver).await;
        {
            let recorded = h.recorded.lock().unwrap();
            assert!(matches!(recorded.requests.as_slice(), [StreamRequest::OnDemand { .. }]));
            assert_eq!(recorded.time_updates, 1);
        }
        assert!(h.ui.lock().unwrap().splash_hidden);
        assert!(h.session.snapshot().load_pending);

        h.session
            .on_stream_event(StreamEvent::Loaded {
                url: "https://dai.example/stitched.m3u8".into(),
                subtitles: vec![],
            })
            .await;
        h.session.on_stream_event(StreamEvent::Error { message: None }).await;

        let request = rx.await.unwrap();
        assert_eq!(request.media.content_url.as_deref(), Some("https://dai.example/stitched.m3u8"));
        assert_eq!(h.drain(), vec!["Stream request successful. Loading stream...".to_string()]);
    }

    #[tokio::test]
    async fn error_first_resolves_with_backup() {
        let mut h = harness(&[]).await;
        let (resolver, rx) = pending_load();
        h.session.load(vod_load(None), resolver).await;

        h.session
            .on_stream_event(StreamEvent::Error { message: Some("403".into()) })
            .await;
        h.session
            .on_stream_event(StreamEvent::Loaded {
                url: "https://late.example".into(),
                subtitles: vec![],
            })
            .await;

        assert_eq!(rx.await.unwrap().media.content_url.as_deref(), Some(BACKUP));
        assert_eq!(h.drain(), vec!["Stream request failed. Loading backup stream...".to_string()]);
    }

    #[tokio::test]
    async fn load_without_params_falls_back_immediately() {
        let mut h = harness(&[]).await;
        let (resolver, rx) = pending_load();
        let mut request = vod_load(None);
        request.media.custom_data = None;

        h.session.load(request, resolver).await;

        assert_eq!(rx.await.unwrap().media.content_url.as_deref(), Some(BACKUP));
        assert!(h.recorded.lock().unwrap().requests.is_empty());
    }

    #[tokio::test]
    async fn resumes_vod_at_stream_time_of_start_time() {
        let mut h = harness(&[BREAK_AT_10]).await;
        let (resolver, _rx) = pending_load();
        h.session.load(vod_load(Some(20.0)), resolver).await;
        h.session
            .on_stream_event(StreamEvent::CuePointsChanged { cuepoints: vec![BREAK_AT_10] })
            .await;
        assert!(h.recorded.lock().unwrap().seeks.is_empty());

        h.session
            .on_stream_event(StreamEvent::Loaded {
                url: "https://dai.example/s.m3u8".into(),
                subtitles: vec![],
            })
            .await;

        assert_eq!(h.recorded.lock().unwrap().seeks, vec![25.0]);
    }

    #[tokio::test]
    async fn seek_over_unwatched_break_plays_it_then_resumes() {
        let mut h = harness(&[BREAK_AT_10]).await;
        let (resolver, _rx) = pending_load();
        h.session.load(vod_load(None), resolver).await;
        h.session
            .on_stream_event(StreamEvent::CuePointsChanged { cuepoints: vec![BREAK_AT_10] })
            .await;

        let seek = h.session.seek(SeekRequest { current_time: Some(20.0), ..Default::default() });
        assert_eq!(seek.current_time, Some(10.1));
        assert_eq!(h.session.snapshot().pending_seek_target, Some(20.0));

        h.session.on_stream_event(StreamEvent::AdBreakStarted).await;
        h.set_position(15.0);
        h.session.on_stream_event(StreamEvent::AdBreakEnded).await;

        assert_eq!(h.recorded.lock().unwrap().seeks, vec![20.0]);
        assert_eq!(h.session.snapshot().pending_seek_target, None);
        assert_eq!(h.drain(), vec!["adBreakStarted", "adBreakEnded", "Seeking to: 20"]);

        // the break is now watched, so the same seek goes straight through
        let seek = h.session.seek(SeekRequest { current_time: Some(20.0), ..Default::default() });
        assert_eq!(seek.current_time, Some(20.0));
    }

    #[tokio::test]
    async fn seeks_are_pinned_while_an_ad_plays() {
        let mut h = harness(&[BREAK_AT_10]).await;
        h.session.on_stream_event(StreamEvent::AdBreakStarted).await;
        h.session.on_stream_event(StreamEvent::AdBreakStarted).await;
        h.set_position(12.0);

        for target in [0.0, 11.0, 300.0] {
            let seek = h.session.seek(SeekRequest {
                current_time: Some(target),
                ..Default::default()
            });
            assert_eq!(seek.current_time, Some(12.0));
        }
        assert_eq!(h.session.snapshot().pending_seek_target, None);
        assert!(h.ui.lock().unwrap().ad_ui_visible);
    }

    #[tokio::test]
    async fn seek_without_target_is_untouched() {
        let mut h = harness(&[]).await;
        let seek = h.session.seek(SeekRequest::default());
        assert_eq!(seek, SeekRequest::default());
    }

    #[tokio::test]
    async fn bookmark_broadcasts_content_time_then_persists() {
        let mut h = harness(&[CuePoint { start: 0.0, end: 5.0, played: true }]).await;

        h.session.on_controller_message("bookmark,12.5").await;

        assert_eq!(h.broadcasts.try_recv().unwrap(), "bookmark,7.5");
        assert_eq!(h.broadcasts.try_recv(), Err(TryRecvError::Empty));
        let bookmarks = h.store.recent_bookmarks(10).await.unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].stream_time, 12.5);
        assert_eq!(bookmarks[0].content_time, 7.5);
    }

    #[tokio::test]
    async fn get_content_time_uses_player_position() {
        let mut h = harness(&[BREAK_AT_10]).await;
        h.set_position(30.0);

        h.session.on_controller_message("getContentTime").await;

        assert_eq!(h.drain(), vec!["contentTime,25"]);
    }

    #[tokio::test]
    async fn unrecognized_message_changes_nothing() {
        let mut h = harness(&[BREAK_AT_10]).await;
        let before = h.session.snapshot();

        h.session.on_controller_message("foo,1,2").await;

        assert_eq!(h.drain(), vec!["Message not recognized"]);
        assert_eq!(h.session.snapshot(), before);
        assert!(h.store.recent_bookmarks(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn breaks_found_after_resolution_reach_the_player() {
        let mut h = harness(&[]).await;
        let (resolver, rx) = pending_load();
        h.session.load(vod_load(None), resolver).await;
        h.session
            .on_stream_event(StreamEvent::Loaded {
                url: "https://dai.example/s.m3u8".into(),
                subtitles: vec![],
            })
            .await;
        assert!(rx.await.unwrap().media.breaks.is_empty());

        h.session
            .on_stream_event(StreamEvent::CuePointsChanged { cuepoints: vec![BREAK_AT_10] })
            .await;

        let recorded = h.recorded.lock().unwrap();
        assert_eq!(recorded.break_updates.len(), 1);
        assert_eq!(recorded.break_updates[0][0].id, "B_0");
    }

    #[tokio::test]
    async fn ad_progress_and_quartiles() {
        let mut h = harness(&[]).await;
        h.session
            .on_stream_event(StreamEvent::AdProgress(crate::models::AdProgressData {
                ad_position: 1,
                total_ads: 2,
                duration: 10.0,
                current_time: 2.5,
            }))
            .await;
        h.session.on_stream_event(StreamEvent::FirstQuartile).await;

        assert_eq!(h.ui.lock().unwrap().progress[0].remaining_seconds, 8);
        let events = h.store.recent_events(10, 0, EventFilters::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "first_quartile");
    }

    #[tokio::test]
    async fn metadata_is_forwarded_to_the_service() {
        let mut h = harness(&[]).await;

        h.session
            .handle(SessionInput::Metadata { data: vec![0x49, 0x44, 0x33], timestamp: 4.0 })
            .await;

        let recorded = h.recorded.lock().unwrap();
        assert_eq!(recorded.metadata, vec![("ID3".to_string(), vec![0x49, 0x44, 0x33], 4.0)]);
    }

    #[tokio::test]
    async fn load_without_params_forgets_previous_ad_timeline() {
        let mut h = harness(&[]).await;
        let (resolver, _rx) = pending_load();
        h.session.load(vod_load(None), resolver).await;
        h.session
            .on_stream_event(StreamEvent::CuePointsChanged { cuepoints: vec![BREAK_AT_10] })
            .await;

        let (resolver, _rx) = pending_load();
        let mut backup_only = vod_load(None);
        backup_only.media.custom_data = None;
        h.session.load(backup_only, resolver).await;
        h.drain();

        h.session.on_controller_message("bookmark,30").await;

        assert_eq!(h.drain(), vec!["bookmark,30"]);
        assert!(h.session.snapshot().breaks.is_empty());
    }

    #[tokio::test]
    async fn watched_break_stays_watched_when_cue_points_are_reported_again() {
        let mut h = harness(&[]).await;
        let (resolver, _rx) = pending_load();
        h.session.load(vod_load(None), resolver).await;
        h.session
            .on_stream_event(StreamEvent::CuePointsChanged { cuepoints: vec![BREAK_AT_10] })
            .await;
        h.session.on_stream_event(StreamEvent::AdBreakStarted).await;
        h.set_position(15.0);
        h.session.on_stream_event(StreamEvent::AdBreakEnded).await;

        let later_break = CuePoint { start: 60.0, end: 75.0, played: false };
        h.session
            .on_stream_event(StreamEvent::CuePointsChanged {
                cuepoints: vec![BREAK_AT_10, later_break],
            })
            .await;

        let seek = h.session.seek(SeekRequest { current_time: Some(20.0), ..Default::default() });
        assert_eq!(seek.current_time, Some(20.0));
        assert_eq!(h.session.snapshot().pending_seek_target, None);
    }

    #[tokio::test]
    async fn new_load_resets_session_state() {
        let mut h = harness(&[BREAK_AT_10]).await;
        let (resolver, _rx) = pending_load();
        h.session.load(vod_load(None), resolver).await;
        h.session
            .on_stream_event(StreamEvent::CuePointsChanged { cuepoints: vec![BREAK_AT_10] })
            .await;
        h.session.seek(SeekRequest { current_time: Some(20.0), ..Default::default() });
        let first_id = h.session.snapshot().session_id;

        let (resolver, _rx) = pending_load();
        h.session.load(vod_load(None), resolver).await;

        let snapshot = h.session.snapshot();
        assert_ne!(snapshot.session_id, first_id);
        assert_eq!(snapshot.pending_seek_target, None);
        assert!(snapshot.breaks.is_empty());
    }
}
