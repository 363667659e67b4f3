//! # Budget Events
//!
//! Notifications pushed to the rendering layer without a request.
//!
//! ```text
//!   command ──► engine mutation ──► recompute ──► emit_changed(aggregates)
//!   rate task ──► set / fall back ───────────────► emit_rate(info)
//!                                                  emit_changed(aggregates)
//! ```
//!
//! On the wire each event is one JSON line:
//! `{"event":"budget_changed","payload":{...}}`.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use cambio_core::{Aggregates, RateInfo};

/// An event for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum BudgetEvent {
    /// Totals changed; the UI re-renders its totals panel.
    #[serde(rename = "budget_changed")]
    Changed(Aggregates),

    /// The exchange rate settled (fetched or fallback).
    #[serde(rename = "rate_settled")]
    RateSettled(RateInfo),
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Observer notified after every recompute.
pub trait BudgetEventEmitter: Send + Sync {
    /// Emits the freshly computed totals.
    fn emit_changed(&self, aggregates: &Aggregates);

    /// Emits the settled exchange rate.
    fn emit_rate(&self, rate: &RateInfo);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl BudgetEventEmitter for NoOpEmitter {
    fn emit_changed(&self, _aggregates: &Aggregates) {}
    fn emit_rate(&self, _rate: &RateInfo) {}
}

/// Forwards events to the IPC writer.
#[derive(Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<BudgetEvent>,
}

impl ChannelEmitter {
    /// Creates an emitter and the receiver the IPC loop drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BudgetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelEmitter { tx }, rx)
    }

    fn send(&self, event: BudgetEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event receiver closed, dropping event");
        }
    }
}

impl BudgetEventEmitter for ChannelEmitter {
    fn emit_changed(&self, aggregates: &Aggregates) {
        self.send(BudgetEvent::Changed(*aggregates));
    }

    fn emit_rate(&self, rate: &RateInfo) {
        self.send(BudgetEvent::RateSettled(*rate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambio_core::RateStatus;

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(BudgetEvent::Changed(Aggregates::default())).unwrap();
        assert_eq!(json["event"], "budget_changed");
        assert_eq!(json["payload"]["grandTotalUsd"], 0.0);

        let info = RateInfo {
            rate: 36.0,
            status: RateStatus::Fallback,
            fallback_rate: 36.0,
            settled_at: None,
        };
        let json = serde_json::to_value(BudgetEvent::RateSettled(info)).unwrap();
        assert_eq!(json["event"], "rate_settled");
        assert_eq!(json["payload"]["status"], "fallback");
    }

    #[test]
    fn test_channel_emitter_forwards() {
        let (emitter, mut rx) = ChannelEmitter::channel();
        emitter.emit_changed(&Aggregates::default());
        assert_eq!(rx.try_recv().unwrap(), BudgetEvent::Changed(Aggregates::default()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_emitter_survives_closed_receiver() {
        let (emitter, rx) = ChannelEmitter::channel();
        drop(rx);
        emitter.emit_changed(&Aggregates::default());
    }
}
