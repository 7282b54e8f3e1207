// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::Item;

/// Hard upper bound of slots per bucket
pub const MAX_BUCKET_SIZE: u8 = 8;

/// Fixed-capacity group of slots at one hash coordinate of one table
///
/// A bucket is a window of `bucket_size` consecutive slots into the slot
/// arena of its table. A slot is active if and only if it holds an item;
/// there is no separate membership record that could disagree with it.
#[derive(Copy, Clone)]
pub struct Bucket<'a> {
    slots: &'a [Option<Item>],
}

impl<'a> Bucket<'a> {
    pub fn new(slots: &'a [Option<Item>]) -> Self {
        debug_assert!((1..=usize::from(MAX_BUCKET_SIZE)).contains(&slots.len()));
        Self { slots }
    }

    // NOTE: Capacity is <= MAX_BUCKET_SIZE
    #[allow(clippy::cast_possible_truncation)]
    pub fn capacity(&self) -> u8 {
        self.slots.len() as u8
    }

    // NOTE: Capacity is <= MAX_BUCKET_SIZE
    #[allow(clippy::cast_possible_truncation)]
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    pub fn len(&self) -> u8 {
        self.slots.iter().filter(|slot| slot.is_some()).count() as u8
    }

    #[cfg(test)]
    pub fn is_full(&self) -> bool {
        self.free_slot().is_none()
    }

    pub fn is_active(&self, slot: u8) -> bool {
        self.get(slot).is_some()
    }

    /// Returns the lowest free slot, if any.
    // NOTE: Capacity is <= MAX_BUCKET_SIZE
    #[allow(clippy::cast_possible_truncation)]
    pub fn free_slot(&self) -> Option<u8> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(|slot| slot as u8)
    }

    /// Returns `true` if an active slot other than `except` carries `signature`.
    pub fn has_signature(&self, signature: u32, except: Option<u8>) -> bool {
        self.active_slots()
            .any(|(slot, item)| Some(slot) != except && item.signature() == signature)
    }

    /// Iterates over the active slots in ascending slot order.
    // NOTE: Capacity is <= MAX_BUCKET_SIZE
    #[allow(clippy::cast_possible_truncation)]
    pub fn active_slots(&self) -> impl Iterator<Item = (u8, &'a Item)> + 'a {
        let slots = self.slots;

        slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| item.as_ref().map(|item| (slot as u8, item)))
    }

    pub fn get(&self, slot: u8) -> Option<&'a Item> {
        let slots = self.slots;
        slots.get(usize::from(slot)).and_then(Option::as_ref)
    }
}
