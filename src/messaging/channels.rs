// Lock-free notification channel

use crate::messaging::notification::Notification;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::HeapRb;
use std::sync::{Arc, Mutex};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

/// Producer side shared by every component that reports status
pub type NotificationSink = Arc<Mutex<NotificationProducer>>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Push without blocking; the notification is dropped when the sink is
/// contended or full
pub fn notify(sink: &NotificationSink, notification: Notification) {
    if let Ok(mut tx) = sink.try_lock() {
        let _ = tx.try_push(notification);
    }
}

/// Everything queued so far
pub fn drain(rx: &mut NotificationConsumer) -> Vec<Notification> {
    rx.pop_iter().collect()
}
