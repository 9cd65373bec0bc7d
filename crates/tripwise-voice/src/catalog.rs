//! Static voice catalogue.

use serde::Serialize;

/// Upload MIME types accepted for recognition.
pub const SUPPORTED_FORMATS: [&str; 4] = ["audio/wav", "audio/mp3", "audio/m4a", "audio/ogg"];

/// A synthesis voice offered to clients.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct VoiceProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub gender: &'static str,
    pub language: &'static str,
    pub description: &'static str,
}

pub static VOICES: [VoiceProfile; 3] = [
    VoiceProfile {
        id: "xiaoyan",
        name: "Xiaoyan",
        gender: "female",
        language: "zh-cn",
        description: "Young female voice, sweet and clear",
    },
    VoiceProfile {
        id: "xiaofeng",
        name: "Xiaofeng",
        gender: "male",
        language: "zh-cn",
        description: "Young male voice, calm and steady",
    },
    VoiceProfile {
        id: "xiaoye",
        name: "Xiaoye",
        gender: "female",
        language: "zh-cn",
        description: "Young female voice, soft and warm",
    },
];

impl VoiceProfile {
    pub fn find(id: &str) -> Option<&'static VoiceProfile> {
        VOICES.iter().find(|v| v.id == id)
    }
}
