// Message bus boundary and topic routing

use std::sync::{Arc, Mutex};
use tracing::debug;

/// Outgoing side of a publish/subscribe transport
///
/// Topics are relative; the transport adds its base topic.
pub trait MessageBus: Send + Sync {
    fn publish(&self, topic: &str, payload: &[u8]);
}

/// Incoming side: a component reacting to a fixed set of topics
pub trait TopicHandler: Send + Sync {
    /// Relative topics, e.g. `control/volume/set`
    fn topics(&self) -> Vec<String>;

    fn handle(&self, topic: &str, payload: &[u8]);
}

/// Routes incoming messages to the handlers subscribed to their topic
pub struct TopicRouter {
    basetopic: String,
    routes: Vec<(String, Arc<dyn TopicHandler>)>,
}

impl TopicRouter {
    pub fn new(basetopic: impl Into<String>) -> Self {
        Self {
            basetopic: basetopic.into().trim_end_matches('/').to_string(),
            routes: Vec::new(),
        }
    }

    pub fn attach(&mut self, handler: Arc<dyn TopicHandler>) {
        for topic in handler.topics() {
            self.routes.push((topic, Arc::clone(&handler)));
        }
    }

    /// Full topic names a transport should subscribe to
    pub fn subscriptions(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|(topic, _)| self.full_topic(topic))
            .collect()
    }

    pub fn full_topic(&self, topic: &str) -> String {
        if self.basetopic.is_empty() {
            topic.to_string()
        } else {
            format!("{}/{}", self.basetopic, topic)
        }
    }

    /// Deliver a message; returns false when nobody listens on `topic`
    pub fn dispatch(&self, topic: &str, payload: &[u8]) -> bool {
        let relative = topic
            .strip_prefix(&self.basetopic)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(topic);

        let mut delivered = false;
        for (route, handler) in &self.routes {
            if route == relative {
                handler.handle(relative, payload);
                delivered = true;
            }
        }
        if !delivered {
            debug!("No handler for topic '{}'", topic);
        }
        delivered
    }
}

/// In-process bus that records every publication
#[derive(Debug, Default)]
pub struct LocalBus {
    basetopic: String,
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl LocalBus {
    pub fn new(basetopic: impl Into<String>) -> Self {
        Self {
            basetopic: basetopic.into().trim_end_matches('/').to_string(),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Everything published so far, with full topics
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Take and clear the publication log
    pub fn take(&self) -> Vec<(String, Vec<u8>)> {
        self.published
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }

    /// Most recent payload on a relative topic, as text
    pub fn last(&self, topic: &str) -> Option<String> {
        let full = self.full_topic(topic);
        self.published()
            .into_iter()
            .rev()
            .find(|(t, _)| *t == full)
            .map(|(_, payload)| String::from_utf8_lossy(&payload).into_owned())
    }

    fn full_topic(&self, topic: &str) -> String {
        if self.basetopic.is_empty() {
            topic.to_string()
        } else {
            format!("{}/{}", self.basetopic, topic)
        }
    }
}

impl MessageBus for LocalBus {
    fn publish(&self, topic: &str, payload: &[u8]) {
        let full = self.full_topic(topic);
        debug!("Publish {}: {}", full, String::from_utf8_lossy(payload));
        if let Ok(mut published) = self.published.lock() {
            published.push((full, payload.to_vec()));
        }
    }
}
