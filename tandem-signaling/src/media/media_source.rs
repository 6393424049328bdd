use crate::media::{LocalMedia, MediaConstraints};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Acquires the local stream for a set of constraints (camera, microphone, ...).
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn open(&self, constraints: &MediaConstraints) -> Result<LocalMedia>;
}

/// Media source producing sample tracks that the caller feeds itself:
/// Opus audio and VP8 video.
#[derive(Debug, Clone)]
pub struct SyntheticMediaSource {
    stream_id: String,
}

impl SyntheticMediaSource {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }
}

impl Default for SyntheticMediaSource {
    fn default() -> Self {
        Self::new("tandem")
    }
}

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn open(&self, constraints: &MediaConstraints) -> Result<LocalMedia> {
        let mut tracks = Vec::new();

        if constraints.audio {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48000,
                    channels: 2,
                    ..Default::default()
                },
                "audio".to_owned(),
                self.stream_id.clone(),
            )));
        }

        if constraints.video {
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90000,
                    ..Default::default()
                },
                "video".to_owned(),
                self.stream_id.clone(),
            )));
        }

        info!(
            "Opened synthetic stream '{}' with {} track(s)",
            self.stream_id,
            tracks.len()
        );
        Ok(LocalMedia::new(self.stream_id.clone(), tracks))
    }
}
