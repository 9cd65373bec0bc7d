//! Speech recognition for Tripwise.
//!
//! Wraps the iFlytek streaming dictation API: a WebSocket whose URL carries
//! an HMAC-SHA256 signature, fed with base64 PCM frames, answering with
//! incremental word lists. The crate also holds the static catalogue of
//! synthesis voices and accepted upload formats served by the HTTP layer.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod frame;
pub mod stt;

pub use auth::{rfc1123_date, sign_url};
pub use catalog::{VoiceProfile, SUPPORTED_FORMATS, VOICES};
pub use config::{VoiceConfig, DEFAULT_HOST_URL};
pub use error::VoiceError;
pub use frame::{split_frames, AudioFrame, FrameStatus, FRAME_BYTES};
pub use stt::{parse_result, RecognitionUpdate, SttService, Transcript, MAX_STT_INPUT_BYTES};
