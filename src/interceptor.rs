// src/interceptor.rs
//
// LOAD interception. The playback engine's load is held until the ad-insertion
// service either hands us a stitched manifest or fails; whichever comes first
// resolves it, and the resolver is consumed so a second resolution can't happen.

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::breaks::BreakRegistry;
use crate::models::{LoadRequest, StreamRequest, StreamType, Subtitle};

/// Completes a held load exactly once.
#[derive(Debug)]
pub struct LoadResolver {
    reply: oneshot::Sender<LoadRequest>,
}

impl LoadResolver {
    pub fn new(reply: oneshot::Sender<LoadRequest>) -> Self {
        Self { reply }
    }

    pub fn resolve(self, request: LoadRequest) {
        if self.reply.send(request).is_err() {
            warn!("load requester went away before resolution");
        }
    }
}

/// A load resolver paired with the future the requester awaits.
pub fn pending_load() -> (LoadResolver, oneshot::Receiver<LoadRequest>) {
    let (tx, rx) = oneshot::channel();
    (LoadResolver::new(tx), rx)
}

#[derive(Debug)]
struct PendingLoad {
    request: LoadRequest,
    resolver: LoadResolver,
}

/// What the session must do right after a load was intercepted.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptPlan {
    /// `None` when the request carried no stream parameters.
    pub stream_request: Option<StreamRequest>,
    pub fire_manual_time_update: bool,
    pub start_time: f64,
}

/// How the held load ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLoad {
    pub stream_type: StreamType,
    pub used_backup: bool,
}

#[derive(Debug)]
pub struct LoadInterceptor {
    backup_stream_url: String,
    pending: Option<PendingLoad>,
}

impl LoadInterceptor {
    pub fn new(backup_stream_url: impl Into<String>) -> Self {
        Self {
            backup_stream_url: backup_stream_url.into(),
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Hold `request` until a terminal stream event arrives. Any earlier held
    /// load is dropped unresolved.
    pub fn intercept(&mut self, request: LoadRequest, resolver: LoadResolver) -> InterceptPlan {
        if self.pending.take().is_some() {
            warn!("new load supersedes an unresolved one");
        }

        let params = request.media.custom_data.clone();
        let start_time = params
            .as_ref()
            .and_then(|p| p.start_time)
            .filter(|t| t.is_finite())
            .unwrap_or(0.0);
        let fire_manual_time_update =
            request.media.stream_type == StreamType::Buffered && request.current_time == Some(0.0);
        let stream_request = params.map(StreamRequest::from_params);

        debug!(
            stream_type = ?request.media.stream_type,
            start_time,
            fire_manual_time_update,
            has_params = stream_request.is_some(),
            "load intercepted"
        );

        self.pending = Some(PendingLoad { request, resolver });
        InterceptPlan {
            stream_request,
            fire_manual_time_update,
            start_time,
        }
    }

    /// The service produced a stitched manifest.
    pub fn on_stream_loaded(
        &mut self,
        url: &str,
        subtitles: &[Subtitle],
        breaks: &BreakRegistry,
    ) -> Option<ResolvedLoad> {
        let Some(PendingLoad { mut request, resolver }) = self.pending.take() else {
            debug!("stream loaded after the load was already resolved; ignoring");
            return None;
        };

        request.media.content_url = Some(url.to_string());
        request.media.subtitles = subtitles.to_vec();
        Self::attach_breaks(&mut request, breaks);
        let stream_type = request.media.stream_type;
        resolver.resolve(request);

        info!(url, "load resolved with stitched manifest");
        Some(ResolvedLoad {
            stream_type,
            used_backup: false,
        })
    }

    /// The service failed; fall back to the backup manifest.
    pub fn on_stream_error(&mut self, breaks: &BreakRegistry) -> Option<ResolvedLoad> {
        let Some(PendingLoad { mut request, resolver }) = self.pending.take() else {
            debug!("stream error after the load was already resolved; ignoring");
            return None;
        };

        request.media.content_url = Some(self.backup_stream_url.clone());
        Self::attach_breaks(&mut request, breaks);
        let stream_type = request.media.stream_type;
        resolver.resolve(request);

        info!(url = %self.backup_stream_url, "load resolved with backup stream");
        Some(ResolvedLoad {
            stream_type,
            used_backup: true,
        })
    }

    /// Keep the held request's break markers in step with the registry.
    pub fn on_breaks_changed(&mut self, breaks: &BreakRegistry) {
        if let Some(pending) = self.pending.as_mut() {
            Self::attach_breaks(&mut pending.request, breaks);
        }
    }

    fn attach_breaks(request: &mut LoadRequest, breaks: &BreakRegistry) {
        let (descriptors, clips) = breaks.descriptors();
        request.media.breaks = descriptors;
        request.media.break_clips = clips;
    }
}
