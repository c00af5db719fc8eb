// src/timeline.rs
//
// Stream time <-> content time conversion over a list of cue points.
// Stream time counts ad durations; content time skips them.

use crate::models::CuePoint;

#[derive(Debug, Default, Clone)]
pub struct CuePointTimeline {
    cue_points: Vec<CuePoint>,
}

impl CuePointTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, cue_points: &[CuePoint]) {
        self.cue_points = cue_points
            .iter()
            .copied()
            .filter(|cp| {
                cp.start.is_finite() && cp.end.is_finite() && cp.start >= 0.0 && cp.end >= cp.start
            })
            .collect();
        self.cue_points.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    pub fn clear(&mut self) {
        self.cue_points.clear();
    }

    pub fn content_time_for_stream_time(&self, stream_time: f64) -> f64 {
        let mut ad_time = 0.0;
        for cp in &self.cue_points {
            if stream_time >= cp.end {
                ad_time += cp.end - cp.start;
            } else if stream_time >= cp.start {
                // inside a break: pin to where the break sits in the content
                return cp.start - ad_time;
            } else {
                break;
            }
        }
        stream_time - ad_time
    }

    pub fn stream_time_for_content_time(&self, content_time: f64) -> f64 {
        let mut ad_time = 0.0;
        for cp in &self.cue_points {
            let position = cp.start - ad_time;
            if position < content_time {
                ad_time += cp.end - cp.start;
            } else {
                break;
            }
        }
        content_time + ad_time
    }
}
