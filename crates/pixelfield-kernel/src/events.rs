//! Event bus for grid notifications.
//!
//! The grid publishes what happened (build progress, focus changes, commits,
//! clicks on owned cells) and the host drains the bus once per frame.

use crossbeam_channel::{bounded, Receiver, Sender};
use pixelfield_common::{CellId, Rgb};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Notifications published by a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridEvent {
    /// Build progress changed
    BuildProgress {
        /// Percentage of cells generated
        percent: u8,
    },
    /// Build finished and the population is queryable
    BuildComplete {
        /// Number of cells built
        count: usize,
    },
    /// A cell started its focus transition
    FocusStarted {
        /// Focused cell
        id: CellId,
    },
    /// The focus transition reached its end
    FocusSettled {
        /// Focused cell
        id: CellId,
    },
    /// The focused cell was clicked again
    FocusCommitted {
        /// Committed cell
        id: CellId,
        /// Its color at commit time
        color: Rgb,
    },
    /// Focus was cancelled by clicking empty space
    FocusCancelled,
    /// A cell that already carries an answer was clicked
    OwnedCellClicked {
        /// Clicked cell
        id: CellId,
        /// Its answer
        answer: String,
    },
}

/// Event bus for broadcasting grid events to the host.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GridEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GridEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Publishes an event. Dropped with a warning if the bus is full.
    pub fn publish(&self, event: GridEvent) {
        if let Err(e) = self.sender.try_send(event) {
            warn!("Grid event dropped: {:?}", e.into_inner());
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GridEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(4);
        bus.publish(GridEvent::FocusCancelled);
        bus.publish(GridEvent::BuildComplete { count: 3 });
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert_eq!(
            events,
            vec![GridEvent::FocusCancelled, GridEvent::BuildComplete { count: 3 }]
        );
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        bus.publish(GridEvent::FocusCancelled);
        bus.publish(GridEvent::BuildProgress { percent: 50 });
        assert_eq!(bus.drain(), vec![GridEvent::FocusCancelled]);
    }
}
