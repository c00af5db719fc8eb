// src/mediator.rs
//
// Timeline mediator: knows when to ask the ad-insertion service for a time
// conversion and decides what happens to a seek that would cross an ad break.

use tracing::debug;

use crate::breaks::BreakRegistry;
use crate::models::{Break, BreakClip, StreamEvent, StreamRequest};

/// Nudge past an exact break boundary; some streams stall when seeking right onto it.
pub const BREAK_START_EPSILON: f64 = 0.1;

/// The ad-insertion service as seen from the receiver.
pub trait StreamManager: Send + Sync {
    fn request_stream(&mut self, request: StreamRequest);
    fn process_metadata(&mut self, kind: &str, data: &[u8], timestamp: f64);
    fn content_time_for_stream_time(&self, stream_time: f64) -> f64;
    fn stream_time_for_content_time(&self, content_time: f64) -> f64;

    /// Forget everything learned about the previous stream.
    fn reset(&mut self);

    /// Called with every service event before the session reacts to it.
    fn observe(&mut self, _event: &StreamEvent) {}
}

/// The playback engine and its media element.
pub trait Player: Send + Sync {
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, time: f64);
    fn dispatch_time_update(&mut self);
    fn update_breaks(&mut self, breaks: Vec<Break>, break_clips: Vec<BreakClip>);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekDecision {
    /// An ad is playing; stay where we are.
    Suppressed { to: f64 },
    /// An unwatched break lies before the target; play it first, then resume.
    Redirected { to: f64, resume_at: f64 },
    PassThrough,
}

pub struct TimelineMediator {
    stream_manager: Box<dyn StreamManager>,
    player: Box<dyn Player>,
}

impl TimelineMediator {
    pub fn new(stream_manager: Box<dyn StreamManager>, player: Box<dyn Player>) -> Self {
        Self {
            stream_manager,
            player,
        }
    }

    pub fn stream_manager(&mut self) -> &mut dyn StreamManager {
        self.stream_manager.as_mut()
    }

    pub fn player(&mut self) -> &mut dyn Player {
        self.player.as_mut()
    }

    pub fn current_time(&self) -> f64 {
        self.player.current_time()
    }

    pub fn content_time_for_stream_time(&self, stream_time: f64) -> f64 {
        self.stream_manager.content_time_for_stream_time(stream_time)
    }

    pub fn stream_time_for_content_time(&self, content_time: f64) -> f64 {
        self.stream_manager.stream_time_for_content_time(content_time)
    }

    /// Content time at the player's current position.
    pub fn content_time(&self) -> f64 {
        self.content_time_for_stream_time(self.player.current_time())
    }

    pub fn redirect_seek(
        &self,
        target: f64,
        ad_is_playing: bool,
        breaks: &BreakRegistry,
    ) -> SeekDecision {
        let previous = breaks.previous_break_before(target);

        if ad_is_playing {
            let to = self.player.current_time();
            debug!(target, to, "seek suppressed during ad");
            return SeekDecision::Suppressed { to };
        }

        match previous {
            Some(ad_break) if !ad_break.watched => {
                let to = ad_break.stream_start + BREAK_START_EPSILON;
                debug!(target, to, break_id = %ad_break.id, "seek redirected to unwatched break");
                SeekDecision::Redirected { to, resume_at: target }
            }
            _ => SeekDecision::PassThrough,
        }
    }
}
