pub mod notifier;

pub use notifier::{build_notifier, DesktopNotifier, LogNotifier, Notifier};
