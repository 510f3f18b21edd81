//! Clipboard value object

/// Characters shown when clipboard content appears in logs or notifications
pub const PREVIEW_CHARS: usize = 50;

/// Text observed on the local clipboard.
///
/// `observation` increases with every change the detector records, so two
/// values with equal content can still be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardValue {
    content: String,
    observation: u64,
}

impl ClipboardValue {
    pub fn new(content: impl Into<String>, observation: u64) -> Self {
        Self {
            content: content.into(),
            observation,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    pub fn observation(&self) -> u64 {
        self.observation
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn preview(&self) -> String {
        preview(&self.content)
    }
}

/// Shorten content to [`PREVIEW_CHARS`] characters, marking truncation with "..."
pub fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_short_content_is_unchanged() {
        assert_eq!(preview("hello"), "hello");
        assert_eq!(preview(""), "");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(60);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn value_accessors() {
        let value = ClipboardValue::new("text", 3);
        assert_eq!(value.content(), "text");
        assert_eq!(value.observation(), 3);
        assert!(!value.is_empty());
        assert_eq!(value.into_content(), "text");
    }
}
