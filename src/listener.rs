// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Caller hooks

use crate::Action;

/// Observer of committed slot mutations.
///
/// Invoked synchronously, once per action, after all mutations of an
/// operation have been applied. This is the only way a caller learns that an
/// item it inserted earlier was relocated by a later insert.
///
/// Implementations must not call back into the table.
pub trait EventListener: Send {
    /// Called for each committed action, in commit order.
    fn on_action(&mut self, action: &Action);
}

impl<F> EventListener for F
where
    F: FnMut(&Action) + Send,
{
    fn on_action(&mut self, action: &Action) {
        self(action);
    }
}

/// Key equality override.
///
/// Only called after the signatures and key lengths already matched, so both
/// slices always have the same length.
pub trait KeyComparator: Send + Sync {
    /// Returns `true` if both keys are to be treated as the same key.
    fn equals(&self, stored: &[u8], key: &[u8]) -> bool;
}

impl<F> KeyComparator for F
where
    F: Fn(&[u8], &[u8]) -> bool + Send + Sync,
{
    fn equals(&self, stored: &[u8], key: &[u8]) -> bool {
        self(stored, key)
    }
}
