pub mod publisher;
pub mod server;

pub use publisher::{BroadcastPublisher, Publisher, UPDATE_EVENT};
pub use server::{routes, AppState, WebServer};
