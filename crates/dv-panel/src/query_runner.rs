//! Query runner handle
//!
//! Query execution lives outside the editor. The handle only keeps the last
//! result a panel received and hands it to subscribers, which it holds
//! weakly so a dropped options pane or view unsubscribes itself.

use std::sync::{Arc, Weak};

use dv_data::PanelData;
use parking_lot::RwLock;

/// Receives query results delivered to a panel
pub trait PanelDataSubscriber: Send + Sync {
    fn on_panel_data(&self, data: &PanelData);
}

/// Per-panel handle to query results
#[derive(Default)]
pub struct PanelQueryRunner {
    last_result: RwLock<Option<PanelData>>,
    subscribers: RwLock<Vec<Weak<dyn PanelDataSubscriber>>>,
}

impl PanelQueryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber; the last result, if any, is delivered right away
    pub fn subscribe(&self, subscriber: Arc<dyn PanelDataSubscriber>) {
        if let Some(data) = self.last_result() {
            subscriber.on_panel_data(&data);
        }
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Deliver a new result
    pub fn publish(&self, data: PanelData) {
        *self.last_result.write() = Some(data.clone());
        self.notify_subscribers(&data);
    }

    /// The last delivered result
    pub fn last_result(&self) -> Option<PanelData> {
        self.last_result.read().clone()
    }

    /// Start from another runner's last result (edit clones start with the
    /// live panel's data)
    pub fn use_last_result_from(&self, other: &PanelQueryRunner) {
        if let Some(data) = other.last_result() {
            *self.last_result.write() = Some(data);
        }
    }

    /// Deliver the last result again, e.g. after the field config changed
    pub fn resend_last_result(&self) {
        if let Some(data) = self.last_result() {
            self.notify_subscribers(&data);
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Drop all subscribers and the cached result
    pub fn destroy(&self) {
        self.subscribers.write().clear();
        *self.last_result.write() = None;
    }

    fn notify_subscribers(&self, data: &PanelData) {
        let live: Vec<Arc<dyn PanelDataSubscriber>> = {
            let mut subscribers = self.subscribers.write();

            // Remove any dead weak references
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(|weak| weak.upgrade()).collect()
        };

        for subscriber in live {
            subscriber.on_panel_data(data);
        }
    }
}
