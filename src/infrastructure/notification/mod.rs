//! Notification infrastructure module
//!
//! Desktop notifications through notify-rust.

mod desktop;

pub use desktop::DesktopNotifier;

use crate::application::ports::Notifier;

/// Create the notifier for the current platform
pub fn create_notifier() -> Box<dyn Notifier> {
    Box::new(DesktopNotifier::new())
}
