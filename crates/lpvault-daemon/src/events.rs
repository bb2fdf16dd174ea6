//! Event emission.
//!
//! Vault events drained after each operation, plus daemon lifecycle events,
//! are broadcast to subscribers and kept in a bounded history that RPC
//! clients can page through.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use lpvault_types::VaultEvent;

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Position in the daemon's event stream, starting at 1.
    pub sequence: u64,
    /// Event type name (e.g. "Deposit", "DaemonStarted").
    pub event_type: String,
    /// Simulated-clock timestamp in seconds.
    pub timestamp: u64,
    /// Type-specific payload.
    pub payload: serde_json::Value,
}

impl Event {
    /// A daemon event; the sequence is assigned on emission.
    pub fn new(event_type: &str, timestamp: u64, payload: serde_json::Value) -> Self {
        Self {
            sequence: 0,
            event_type: event_type.to_string(),
            timestamp,
            payload,
        }
    }

    /// Wrap a vault event.
    pub fn from_vault(event: &VaultEvent, timestamp: u64) -> Self {
        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        Self::new(event.name(), timestamp, payload)
    }
}

/// Filter for event queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "vault", "admin", "system".
    pub categories: Option<Vec<String>>,
    /// Only events concerning this account (hex).
    pub user: Option<String>,
    /// Only events after this sequence number.
    pub after_sequence: Option<u64>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
    history: Arc<Mutex<VecDeque<Event>>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with the given buffer and history capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
            history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Emit an event to all subscribers. Returns its sequence number.
    pub fn emit(&self, mut event: Event) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        event.sequence = sequence;

        if let Ok(mut history) = self.history.lock() {
            if history.len() >= self.capacity.max(1) {
                history.pop_front();
            }
            history.push_back(event.clone());
        }
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
        sequence
    }

    /// Emit every vault event in order.
    pub fn publish_vault(&self, events: Vec<VaultEvent>, timestamp: u64) {
        for event in &events {
            self.emit(Event::from_vault(event, timestamp));
        }
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Up to `limit` of the oldest retained events matching `filter`.
    pub fn history(&self, filter: &EventFilter, limit: usize) -> Vec<Event> {
        let Ok(history) = self.history.lock() else {
            return Vec::new();
        };
        history
            .iter()
            .filter(|event| filter.matches(event))
            .take(limit)
            .cloned()
            .collect()
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(after) = self.after_sequence {
            if event.sequence <= after {
                return false;
            }
        }

        if let Some(ref categories) = self.categories {
            let event_category = categorize_event(&event.event_type);
            if !categories.iter().any(|c| c == event_category) {
                return false;
            }
        }

        if let Some(ref user) = self.user {
            match event.payload.get("user").and_then(|v| v.as_str()) {
                Some(event_user) if event_user.eq_ignore_ascii_case(user) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Categorize an event type into a category.
fn categorize_event(event_type: &str) -> &'static str {
    match event_type {
        "Deposit" | "Withdraw" | "Claim" | "Harvest" => "vault",
        s if s.starts_with("Asset") => "admin",
        _ => "system",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpvault_types::AccountId;

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(Event::new(
            "DaemonStarted",
            1000,
            serde_json::json!({"version": "0.1.0"}),
        ));

        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.event_type, "DaemonStarted");
        assert_eq!(event.sequence, 1);
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_vault_event_payload() {
        let bus = EventBus::new(16);
        let alice = AccountId::repeat(0xa1);
        bus.publish_vault(
            vec![VaultEvent::Deposit {
                user: alice,
                amount: 100,
            }],
            42,
        );

        let events = bus.history(&EventFilter::default(), 10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "Deposit");
        assert_eq!(events[0].payload["amount"], "100");
        assert_eq!(events[0].payload["user"], alice.to_string());
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = EventBus::new(2);
        for i in 0..3 {
            bus.emit(Event::new("Tick", i, serde_json::json!({})));
        }
        let events = bus.history(&EventFilter::default(), 10);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 2);
        assert_eq!(bus.sequence(), 3);
    }

    #[test]
    fn test_event_filter() {
        let alice = AccountId::repeat(0xa1);
        let bob = AccountId::repeat(0xb0);
        let claim = Event::from_vault(
            &VaultEvent::Claim {
                user: alice,
                crv_reward: 1,
                cvx_reward: 2,
            },
            0,
        );

        let by_user = EventFilter {
            user: Some(alice.to_string()),
            ..EventFilter::default()
        };
        assert!(by_user.matches(&claim));

        let other_user = EventFilter {
            user: Some(bob.to_string()),
            ..EventFilter::default()
        };
        assert!(!other_user.matches(&claim));

        let admin_only = EventFilter {
            categories: Some(vec!["admin".to_string()]),
            ..EventFilter::default()
        };
        assert!(!admin_only.matches(&claim));
    }

    #[test]
    fn test_categorize_event() {
        assert_eq!(categorize_event("Deposit"), "vault");
        assert_eq!(categorize_event("Harvest"), "vault");
        assert_eq!(categorize_event("AssetAllowListUpdated"), "admin");
        assert_eq!(categorize_event("DaemonStarted"), "system");
    }
}
