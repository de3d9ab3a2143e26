//! Event wire types
//!
//! Drop payloads arrive as loosely typed key/value pairs (the shape of a
//! browser DataTransfer). They are decoded once, defensively, into a
//! tagged `DropMessage`; anything malformed is discarded before it can
//! touch engine state.

use serde::{Deserialize, Serialize};

use super::state::Relation;

/// DataTransfer key carrying a bare rod value
pub const KEY_ROD_VALUE: &str = "rigleta-value";
/// DataTransfer key carrying the generic JSON token
pub const KEY_TEXT: &str = "text/plain";
/// DataTransfer key carrying a difference option
pub const KEY_DIFFERENCE_OPTION: &str = "difference-option";

/// Raw drop payload: ordered key/value pairs as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    entries: Vec<(String, String)>,
}

impl DropPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry, mirroring DataTransfer.setData
    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.entries.push((key.to_string(), value.to_string()));
        self
    }

    /// A rod token payload
    pub fn rod(value: u32) -> Self {
        Self::new().set(KEY_ROD_VALUE, &value.to_string())
    }

    /// A difference option payload
    pub fn difference_option(value: u32) -> Self {
        Self::new().set(KEY_DIFFERENCE_OPTION, &value.to_string())
    }

    /// A generic token payload (JSON under the text key)
    pub fn generic(id: u32, value: u32, kind: &str) -> Self {
        let json = serde_json::json!({ "id": id, "value": value, "type": kind });
        Self::new().set(KEY_TEXT, &json.to_string())
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Decode into the one tagged message type; None for anything malformed
    pub fn decode(&self) -> Option<DropMessage> {
        if let Some(raw) = self.get(KEY_ROD_VALUE) {
            return match raw.trim().parse::<u32>() {
                Ok(value) => Some(DropMessage::Rod { value }),
                Err(_) => {
                    log::debug!("discarding rod payload with bad value {raw:?}");
                    None
                }
            };
        }

        if let Some(raw) = self.get(KEY_DIFFERENCE_OPTION) {
            return match raw.trim().parse::<u32>() {
                Ok(value) => Some(DropMessage::DistractorChoice { value }),
                Err(_) => {
                    log::debug!("discarding difference option with bad value {raw:?}");
                    None
                }
            };
        }

        if let Some(raw) = self.get(KEY_TEXT) {
            let token: GenericToken = match serde_json::from_str(raw) {
                Ok(token) => token,
                Err(err) => {
                    log::debug!("discarding unparseable drop payload: {err}");
                    return None;
                }
            };
            return match u32::try_from(token.value) {
                Ok(value) => Some(DropMessage::Generic {
                    id: token.id,
                    value,
                    kind: token.kind,
                    position: token.position,
                }),
                Err(_) => {
                    log::debug!("discarding token with out-of-range value {}", token.value);
                    None
                }
            };
        }

        None
    }
}

/// JSON shape of the generic token payload
#[derive(Debug, Deserialize)]
struct GenericToken {
    id: u32,
    value: i64,
    #[serde(rename = "type")]
    kind: String,
    /// Source slot position, when the token came off a slot
    #[serde(default)]
    position: Option<u8>,
}

/// Decoded drop message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropMessage {
    /// A bare rod token
    Rod { value: u32 },
    /// A generic token: id, value, wire `type`, optional source position
    Generic {
        id: u32,
        value: u32,
        kind: String,
        position: Option<u8>,
    },
    /// One of the difference answer options
    DistractorChoice { value: u32 },
}

/// Where a drop landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropTarget {
    LeftPan,
    RightPan,
    /// A place-value slot, by decimal position
    Slot(u8),
    /// The answer area (difference options)
    Answer,
}

/// One keyboard token, real or injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyToken {
    Digit(u8),
    Backspace,
    Validate,
    Plus,
    Minus,
}

impl KeyToken {
    /// Parse a host token; None for anything outside the accepted set
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "backspace" => Some(KeyToken::Backspace),
            "validate" => Some(KeyToken::Validate),
            "+" => Some(KeyToken::Plus),
            "-" => Some(KeyToken::Minus),
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => {
                        Some(KeyToken::Digit(c as u8 - b'0'))
                    }
                    _ => None,
                }
            }
        }
    }
}

/// A discrete learner or host event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A token was dropped somewhere on the scale
    Drop {
        target: DropTarget,
        payload: DropPayload,
    },
    /// A keyboard token
    Key(KeyToken),
    /// Click on a placed token (removes it)
    ClickItem { id: u32 },
    /// Comparison symbol button
    ChooseRelation(Relation),
    /// Full reset: fresh exercise, all timers cancelled
    Reset,
}
