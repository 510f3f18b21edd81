//! Clipboard history

mod clipboard_history;

pub use clipboard_history::{
    ClipboardHistory, HistoryItem, HistorySource, DEFAULT_HISTORY_SIZE,
};
