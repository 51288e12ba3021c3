use crate::model::room::RoomId;
use crate::model::session::{IceCandidate, SdpType, SessionDescription};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One signaling message exchanged through the relay.
///
/// On the wire this is a JSON object discriminated by `type`, e.g.
/// `{"type":"offer","sdp":"v=0..."}` or
/// `{"type":"ice-candidate","candidate":{"candidate":"...","sdpMid":"0"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Envelope {
    #[serde(rename_all = "camelCase")]
    Welcome { room_id: RoomId, message: String },
    Offer { sdp: String },
    Answer { sdp: String },
    IceCandidate { candidate: IceCandidate },
    Error { message: String },
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("envelope is not valid UTF-8")]
    NotUtf8,
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| EnvelopeError::NotUtf8)?;
        Self::parse(text)
    }

    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Welcome { .. } => "welcome",
            Envelope::Offer { .. } => "offer",
            Envelope::Answer { .. } => "answer",
            Envelope::IceCandidate { .. } => "ice-candidate",
            Envelope::Error { .. } => "error",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error {
            message: message.into(),
        }
    }

    /// The session description carried by an `offer` or `answer`.
    pub fn description(&self) -> Option<SessionDescription> {
        match self {
            Envelope::Offer { sdp } => Some(SessionDescription::offer(sdp.clone())),
            Envelope::Answer { sdp } => Some(SessionDescription::answer(sdp.clone())),
            _ => None,
        }
    }
}

impl From<SessionDescription> for Envelope {
    fn from(desc: SessionDescription) -> Self {
        match desc.kind {
            SdpType::Offer => Envelope::Offer { sdp: desc.sdp },
            SdpType::Answer => Envelope::Answer { sdp: desc.sdp },
        }
    }
}

impl From<IceCandidate> for Envelope {
    fn from(candidate: IceCandidate) -> Self {
        Envelope::IceCandidate { candidate }
    }
}
