// Status notifications from the core to the host process

pub mod channels;
pub mod notification;

pub use channels::{
    NotificationConsumer, NotificationProducer, NotificationSink, create_notification_channel,
    drain, notify,
};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
