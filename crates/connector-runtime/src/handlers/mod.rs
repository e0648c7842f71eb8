//! Built-in message handlers registered by the runtime.

pub mod description;
pub mod notification;

pub use description::{self_description, DescriptionHandler};
pub use notification::NotificationHandler;
