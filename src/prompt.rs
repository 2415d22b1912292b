//! Caller-side content model. Everything here is converted into Gemini
//! wire types right before a request is built.

use crate::error::Error;
use crate::gemini::{GeminiContent, GeminiInlineData, GeminiPart};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Raw image bytes with a MIME subtype such as `png`.
    Image { subtype: String, data: Vec<u8> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    /// Reads an image from disk. The subtype is taken from the extension.
    pub fn image_from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Ok(Part::Image {
            subtype: image_subtype(path).to_string(),
            data,
        })
    }
}

fn image_subtype(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "jpeg",
        Some("webp") => "webp",
        Some("heic") => "heic",
        Some("heif") => "heif",
        _ => "png",
    }
}

impl From<&Part> for GeminiPart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => GeminiPart::text(text.clone()),
            Part::Image { subtype, data } => GeminiPart::InlineData {
                inline_data: GeminiInlineData::from_bytes(format!("image/{}", subtype), data),
            },
        }
    }
}

/// An ordered, immutable list of parts sent as one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    parts: Vec<Part>,
}

impl Prompt {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Part::text(text)])
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn to_content(&self) -> GeminiContent {
        GeminiContent::user(self.parts.iter().map(GeminiPart::from).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, parts: vec![Part::text(text)] }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, parts: vec![Part::text(text)] }
    }

    pub fn to_content(&self) -> GeminiContent {
        GeminiContent {
            role: Some(self.role.as_str().to_string()),
            parts: self.parts.iter().map(GeminiPart::from).collect(),
        }
    }
}

/// Seeded conversation. Grows only by whole turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    #[cfg(test)]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn to_contents(&self) -> Vec<GeminiContent> {
        self.turns.iter().map(Turn::to_content).collect()
    }
}
