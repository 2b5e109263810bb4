use uuid::Uuid;

use super::{Callback, Predicate};
use crate::prelude::*;

pub(super) enum Edit {
    Register {
        time: BarBeatTime,
        identifier: Uuid,
        callback: Callback,
    },
    RegisterPredicated {
        identifier: Uuid,
        predicate: Predicate,
        callback: Callback,
    },
    Remove {
        time: BarBeatTime,
        identifier: Option<Uuid>,
    },
    RemovePredicated(Uuid),
    Clear,
}

/// Registration changes requested from inside a callback.
///
/// A callback cannot touch the [`Clock`] that is dispatching it. Changes queued
/// here are applied in order once every callback for the current time has run,
/// so a callback registered for the current time first fires the next time the
/// clock reaches it.
#[derive(Default)]
pub struct PendingEdits {
    edits: Vec<Edit>,
}

impl PendingEdits {
    /// Queues [`Clock::register`].
    pub fn register<F>(&mut self, time: BarBeatTime, identifier: Uuid, callback: F)
    where
        F: FnMut(&BarBeatTime, &mut PendingEdits) + Send + 'static,
    {
        self.edits.push(Edit::Register {
            time,
            identifier,
            callback: Box::new(callback),
        });
    }

    /// Queues [`Clock::register_predicated`].
    pub fn register_predicated<P, F>(&mut self, identifier: Uuid, predicate: P, callback: F)
    where
        P: Fn(&BarBeatTime) -> bool + Send + 'static,
        F: FnMut(&BarBeatTime, &mut PendingEdits) + Send + 'static,
    {
        self.edits.push(Edit::RegisterPredicated {
            identifier,
            predicate: Box::new(predicate),
            callback: Box::new(callback),
        });
    }

    /// Queues [`Clock::remove`].
    pub fn remove(&mut self, time: BarBeatTime, identifier: Option<Uuid>) {
        self.edits.push(Edit::Remove { time, identifier });
    }

    /// Queues [`Clock::remove_predicated`].
    pub fn remove_predicated(&mut self, identifier: Uuid) {
        self.edits.push(Edit::RemovePredicated(identifier));
    }

    /// Queues [`Clock::clear_callbacks`].
    pub fn clear(&mut self) {
        self.edits.push(Edit::Clear);
    }

    /// The number of queued edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub(super) fn drain(&mut self) -> std::vec::Drain<'_, Edit> {
        self.edits.drain(..)
    }
}

impl core::fmt::Debug for PendingEdits {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingEdits")
            .field("len", &self.edits.len())
            .finish()
    }
}
