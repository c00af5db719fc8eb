// src/breaks.rs
//
// Break registry: the ordered set of ad breaks known for the current stream.
// Rebuilt from scratch every time the ad-insertion service reports a new cue
// point list, so ingesting the same list twice is a no-op.

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Break, BreakClip, CuePoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdBreak {
    pub id: String,
    pub clip_id: String,
    /// Where the break starts on the stitched (stream) timeline.
    pub stream_start: f64,
    /// Where the break sits on the content timeline: cue start minus all prior break durations.
    pub position: f64,
    pub duration: f64,
    pub watched: bool,
}

impl AdBreak {
    pub fn to_break(&self) -> Break {
        Break {
            id: self.id.clone(),
            break_clip_ids: vec![self.clip_id.clone()],
            position: self.position,
            duration: self.duration,
            is_embedded: true,
            is_watched: self.watched,
        }
    }

    pub fn to_break_clip(&self) -> BreakClip {
        BreakClip {
            id: self.clip_id.clone(),
            duration: self.duration,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct BreakRegistry {
    breaks: Vec<AdBreak>,
}

impl BreakRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current break set with the given cue points. A break we
    /// already saw watched stays watched even if the service still reports it unplayed.
    pub fn ingest(&mut self, cue_points: &[CuePoint]) {
        let mut sorted: Vec<CuePoint> = cue_points
            .iter()
            .copied()
            .filter(|cp| {
                let valid = cp.start.is_finite()
                    && cp.end.is_finite()
                    && cp.start >= 0.0
                    && cp.end >= cp.start;
                if !valid {
                    warn!(start = cp.start, end = cp.end, "dropping malformed cue point");
                }
                valid
            })
            .collect();
        sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

        let previous = std::mem::take(&mut self.breaks);
        let seen_watched = |start: f64, duration: f64| {
            previous
                .iter()
                .any(|b| b.watched && b.stream_start == start && b.duration == duration)
        };

        let mut total_duration = 0.0;
        self.breaks = sorted
            .iter()
            .enumerate()
            .map(|(i, cp)| {
                let duration = cp.end - cp.start;
                let ad_break = AdBreak {
                    id: format!("B_{i}"),
                    clip_id: format!("BC_{i}"),
                    stream_start: cp.start,
                    position: cp.start - total_duration,
                    duration,
                    watched: cp.played || seen_watched(cp.start, duration),
                };
                total_duration += duration;
                ad_break
            })
            .collect();

        debug!(count = self.breaks.len(), total_duration, "ingested ad breaks");
    }

    /// The break with the greatest stream start at or before `stream_time`.
    pub fn previous_break_before(&self, stream_time: f64) -> Option<&AdBreak> {
        let idx = self.breaks.partition_point(|b| b.stream_start <= stream_time);
        idx.checked_sub(1).map(|i| &self.breaks[i])
    }

    /// Mark the break playback has just left as watched. Returns its id.
    pub fn mark_watched_before(&mut self, stream_time: f64) -> Option<String> {
        let idx = self.breaks.partition_point(|b| b.stream_start <= stream_time);
        let ad_break = self.breaks.get_mut(idx.checked_sub(1)?)?;
        ad_break.watched = true;
        Some(ad_break.id.clone())
    }

    pub fn clear(&mut self) {
        self.breaks.clear();
    }

    pub fn breaks(&self) -> &[AdBreak] {
        &self.breaks
    }

    /// Break and clip descriptors for the playback engine's request.
    pub fn descriptors(&self) -> (Vec<Break>, Vec<BreakClip>) {
        self.breaks
            .iter()
            .map(|b| (b.to_break(), b.to_break_clip()))
            .unzip()
    }
}
