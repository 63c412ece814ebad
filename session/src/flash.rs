//! Flash messages.
//!
//! A flash message is queued during one request and shown on the next
//! rendered page. The queue lives inside the session record so it survives
//! a redirect; the pipeline drains it once per request.

use serde::{Deserialize, Serialize};

/// Category of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    /// Operation completed.
    Success,
    /// Operation failed.
    Error,
    /// Something needs attention.
    Warning,
    /// Neutral notice.
    Info,
}

impl FlashKind {
    /// All categories, in render order.
    pub const ALL: [Self; 4] = [Self::Success, Self::Error, Self::Warning, Self::Info];

    /// Name used for the render local.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// Ordered flash messages, one sequence per [`FlashKind`].
///
/// Serializes as `{"success": [...], "error": [...], "warning": [...], "info": [...]}`,
/// which is also the shape handed to templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessages {
    /// Success messages.
    #[serde(default)]
    pub success: Vec<String>,
    /// Error messages.
    #[serde(default)]
    pub error: Vec<String>,
    /// Warning messages.
    #[serde(default)]
    pub warning: Vec<String>,
    /// Informational messages.
    #[serde(default)]
    pub info: Vec<String>,
}

impl FlashMessages {
    /// Append a message to its category.
    pub fn push(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.messages_mut(kind).push(message.into());
    }

    /// Messages of one category, oldest first.
    #[must_use]
    pub fn get(&self, kind: FlashKind) -> &[String] {
        match kind {
            FlashKind::Success => &self.success,
            FlashKind::Error => &self.error,
            FlashKind::Warning => &self.warning,
            FlashKind::Info => &self.info,
        }
    }

    /// `true` when no category holds a message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        FlashKind::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }

    /// Total number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        FlashKind::ALL.iter().map(|kind| self.get(*kind).len()).sum()
    }

    /// Take every message, leaving all four categories empty.
    #[must_use]
    pub fn drain_all(&mut self) -> Self {
        std::mem::take(self)
    }

    fn messages_mut(&mut self, kind: FlashKind) -> &mut Vec<String> {
        match kind {
            FlashKind::Success => &mut self.success,
            FlashKind::Error => &mut self.error,
            FlashKind::Warning => &mut self.warning,
            FlashKind::Info => &mut self.info,
        }
    }
}
