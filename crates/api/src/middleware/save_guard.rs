//! Per-class guard against overlapping saves.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct SaveGuard {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

/// Held while a save runs; releases the class when dropped.
#[derive(Debug)]
pub struct SaveTicket {
    class_id: Uuid,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl SaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `class_id`, or returns `None` while another save holds it.
    pub fn try_acquire(&self, class_id: Uuid) -> Option<SaveTicket> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.insert(class_id).then(|| SaveTicket {
            class_id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_saving(&self, class_id: Uuid) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&class_id)
    }
}

impl Drop for SaveTicket {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.class_id);
    }
}
