// src/models.rs
//
// Wire types shared by the host link and the session. Field names follow the
// receiver engine's message schema (camelCase); anything we don't own is kept
// in `extra` so it survives the round trip through the interceptor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamType {
    Live,
    #[default]
    Buffered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtitle {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webvtt: Option<String>,
}

/// Parameters the sender embeds in `customData` for the ad-insertion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequestParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Break {
    pub id: String,
    pub break_clip_ids: Vec<String>,
    pub position: f64,
    pub duration: f64,
    pub is_embedded: bool,
    pub is_watched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakClip {
    pub id: String,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default)]
    pub stream_type: StreamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<StreamRequestParams>,
    #[serde(default)]
    pub subtitles: Vec<Subtitle>,
    #[serde(default)]
    pub breaks: Vec<Break>,
    #[serde(default)]
    pub break_clips: Vec<BreakClip>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The playback engine's LOAD request, mutated in place by the interceptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub media: MediaInformation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeekRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-reported ad break, in stream time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuePoint {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub played: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdProgressData {
    pub ad_position: u32,
    pub total_ads: u32,
    pub duration: f64,
    pub current_time: f64,
}

/// What the on-screen ad overlay shows while a break plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdProgress {
    pub ad_position: u32,
    pub total_ads: u32,
    pub remaining_seconds: u64,
}

impl From<AdProgressData> for AdProgress {
    fn from(data: AdProgressData) -> Self {
        let remaining = (data.duration - data.current_time).ceil().max(0.0);
        Self {
            ad_position: data.ad_position,
            total_ads: data.total_ads,
            remaining_seconds: remaining as u64,
        }
    }
}

/// Stream request issued to the ad-insertion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamRequest {
    Live { params: StreamRequestParams },
    OnDemand { params: StreamRequestParams },
}

impl StreamRequest {
    /// An asset key means a live stream; anything else is on-demand.
    pub fn from_params(params: StreamRequestParams) -> Self {
        if params.asset_key.is_some() {
            StreamRequest::Live { params }
        } else {
            StreamRequest::OnDemand { params }
        }
    }
}

/// Events emitted by the ad-insertion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Loaded {
        url: String,
        #[serde(default)]
        subtitles: Vec<Subtitle>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    CuePointsChanged {
        #[serde(default)]
        cuepoints: Vec<CuePoint>,
    },
    AdBreakStarted,
    AdBreakEnded,
    AdProgress(AdProgressData),
    Started,
    FirstQuartile,
    Midpoint,
    ThirdQuartile,
    Complete,
}

impl StreamEvent {
    /// Stable name used in logs and the event table.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Loaded { .. } => "stream_loaded",
            StreamEvent::Error { .. } => "stream_error",
            StreamEvent::CuePointsChanged { .. } => "cue_points_changed",
            StreamEvent::AdBreakStarted => "ad_break_started",
            StreamEvent::AdBreakEnded => "ad_break_ended",
            StreamEvent::AdProgress(_) => "ad_progress",
            StreamEvent::Started => "started",
            StreamEvent::FirstQuartile => "first_quartile",
            StreamEvent::Midpoint => "midpoint",
            StreamEvent::ThirdQuartile => "third_quartile",
            StreamEvent::Complete => "complete",
        }
    }
}
