//! Audio frames sent over the dictation socket.

use base64::Engine;
use serde::Serialize;

/// Bytes of 16 kHz 16-bit PCM per frame (40 ms of audio).
pub const FRAME_BYTES: usize = 1280;

const AUDIO_FORMAT: &str = "audio/L16;rate=16000";

/// Position of a frame in the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    First,
    Continue,
    Last,
}

impl FrameStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::First => 0,
            Self::Continue => 1,
            Self::Last => 2,
        }
    }
}

impl Serialize for FrameStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Common {
    pub app_id: String,
}

/// Recognition parameters, sent with the first frame only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Business {
    pub language: &'static str,
    pub domain: &'static str,
    pub accent: &'static str,
    pub vad_eos: u32,
    pub dwa: &'static str,
}

impl Default for Business {
    fn default() -> Self {
        Self {
            language: "zh_cn",
            domain: "iat",
            accent: "mandarin",
            vad_eos: 10_000,
            dwa: "wpgs",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FrameData {
    pub status: FrameStatus,
    pub format: &'static str,
    pub audio: String,
    pub encoding: &'static str,
}

/// One JSON message of the upload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AudioFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common: Option<Common>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<Business>,
    pub data: FrameData,
}

impl AudioFrame {
    fn data(status: FrameStatus, chunk: &[u8]) -> FrameData {
        FrameData {
            status,
            format: AUDIO_FORMAT,
            audio: base64::engine::general_purpose::STANDARD.encode(chunk),
            encoding: "raw",
        }
    }

    /// Opening frame, carrying the app id and recognition parameters.
    pub fn first(app_id: &str, chunk: &[u8]) -> Self {
        Self {
            common: Some(Common {
                app_id: app_id.to_string(),
            }),
            business: Some(Business::default()),
            data: Self::data(FrameStatus::First, chunk),
        }
    }

    pub fn next(chunk: &[u8]) -> Self {
        Self {
            common: None,
            business: None,
            data: Self::data(FrameStatus::Continue, chunk),
        }
    }

    /// Closing frame with no audio.
    pub fn last() -> Self {
        Self {
            common: None,
            business: None,
            data: Self::data(FrameStatus::Last, &[]),
        }
    }

    pub fn to_json(&self) -> String {
        // Only strings and integers; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Splits a recording into the frame sequence the vendor expects:
/// one opening frame, continuation frames, and an empty closing frame.
pub fn split_frames(app_id: &str, audio: &[u8]) -> Vec<AudioFrame> {
    let mut frames = Vec::with_capacity(audio.len() / FRAME_BYTES + 2);
    for (i, chunk) in audio.chunks(FRAME_BYTES).enumerate() {
        if i == 0 {
            frames.push(AudioFrame::first(app_id, chunk));
        } else {
            frames.push(AudioFrame::next(chunk));
        }
    }
    if frames.is_empty() {
        frames.push(AudioFrame::first(app_id, &[]));
    }
    frames.push(AudioFrame::last());
    frames
}
