use crate::auth::{rfc1123_date, sign_url};
use crate::config::VoiceConfig;
use crate::error::VoiceError;
use crate::frame::split_frames;
use chrono::Utc;
use futures_util::{SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

/// Maximum audio input size for STT (10 MiB). Prevents OOM from oversized payloads.
pub const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Outcome of a recognition session.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub text: String,
    /// False when the session ended before the vendor sent its last result.
    pub is_final: bool,
}

/// One decoded vendor message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionUpdate {
    /// Words carried by this message, concatenated.
    pub text: String,
    /// Sequence number of this partial result, when the vendor sends one.
    pub sn: Option<u64>,
    /// Earlier sequence numbers (inclusive range) this result replaces.
    pub replaces: Option<(u64, u64)>,
    pub is_final: bool,
}

#[derive(Deserialize)]
struct VendorMessage {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<VendorData>,
}

#[derive(Deserialize)]
struct VendorData {
    #[serde(default)]
    status: i64,
    result: Option<VendorResult>,
}

#[derive(Deserialize)]
struct VendorResult {
    sn: Option<u64>,
    pgs: Option<String>,
    rg: Option<[u64; 2]>,
    #[serde(default)]
    ws: Vec<VendorWord>,
}

#[derive(Deserialize)]
struct VendorWord {
    #[serde(default)]
    cw: Vec<VendorCandidate>,
}

#[derive(Deserialize)]
struct VendorCandidate {
    #[serde(default)]
    w: String,
}

/// Decodes one text message from the dictation socket.
///
/// A non-zero `code` is reported as [`VoiceError::Vendor`].
pub fn parse_result(raw: &str) -> Result<RecognitionUpdate, VoiceError> {
    let msg: VendorMessage =
        serde_json::from_str(raw).map_err(|e| VoiceError::Protocol(e.to_string()))?;
    if msg.code != 0 {
        return Err(VoiceError::Vendor {
            code: msg.code,
            message: msg.message,
        });
    }

    let Some(data) = msg.data else {
        return Ok(RecognitionUpdate::default());
    };
    let mut update = RecognitionUpdate {
        is_final: data.status == 2,
        ..Default::default()
    };
    if let Some(result) = data.result {
        update.text = result
            .ws
            .iter()
            .flat_map(|word| word.cw.iter())
            .map(|candidate| candidate.w.as_str())
            .collect();
        update.sn = result.sn;
        if result.pgs.as_deref() == Some("rpl") {
            update.replaces = result.rg.map(|[from, to]| (from, to));
        }
    }
    Ok(update)
}

/// Accumulates partial results, honouring the vendor's replace ranges.
#[derive(Debug, Default)]
struct TranscriptBuilder {
    segments: BTreeMap<u64, String>,
}

impl TranscriptBuilder {
    fn apply(&mut self, update: RecognitionUpdate) {
        if let Some((from, to)) = update.replaces {
            self.segments.retain(|sn, _| *sn < from || *sn > to);
        }
        let sn = update.sn.unwrap_or_else(|| {
            self.segments
                .last_key_value()
                .map(|(sn, _)| sn + 1)
                .unwrap_or(0)
        });
        self.segments.insert(sn, update.text);
    }

    fn text(&self) -> String {
        self.segments.values().map(String::as_str).collect::<String>().trim().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct SttService {
    config: VoiceConfig,
}

impl SttService {
    pub fn new(config: VoiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.missing().is_empty()
    }

    /// Transcribes a 16 kHz mono PCM recording.
    ///
    /// If the vendor has not sent its final result within the configured
    /// timeout, the text recognised so far is returned with
    /// `is_final = false`.
    pub async fn recognize(&self, audio: &[u8]) -> Result<Transcript, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::EmptyAudio);
        }
        if audio.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::TooLarge {
                size: audio.len(),
                limit: MAX_STT_INPUT_BYTES,
            });
        }
        self.config.validate()?;

        let mut builder = TranscriptBuilder::default();
        let is_final =
            match tokio::time::timeout(self.config.timeout(), self.session(audio, &mut builder))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = self.config.timeout_secs,
                        "speech recognition timed out, returning partial transcript"
                    );
                    false
                }
            };

        Ok(Transcript {
            text: builder.text(),
            is_final,
        })
    }

    async fn session(
        &self,
        audio: &[u8],
        builder: &mut TranscriptBuilder,
    ) -> Result<bool, VoiceError> {
        let url = sign_url(&self.config, &rfc1123_date(Utc::now()))?;
        let (mut socket, _) = connect_async(url.as_str()).await?;
        tracing::debug!(bytes = audio.len(), "speech recognition session opened");

        for frame in split_frames(&self.config.app_id, audio) {
            socket.send(Message::Text(frame.to_json().into())).await?;
        }

        let is_final = read_results(&mut socket, builder).await?;
        // The vendor usually closes first; a failed close is harmless here.
        let _ = socket.close(None).await;
        Ok(is_final)
    }
}

async fn read_results<S>(socket: &mut S, builder: &mut TranscriptBuilder) -> Result<bool, VoiceError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = socket.next().await {
        match msg? {
            Message::Text(text) => {
                let update = parse_result(text.as_str())?;
                let is_final = update.is_final;
                builder.apply(update);
                if is_final {
                    return Ok(true);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(false)
}
