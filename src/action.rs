// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{Item, Location};

/// A slot mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// A new item was written into a free slot
    Added {
        /// Item
        item: Item,

        /// Destination slot
        to: Location,
    },

    /// An existing item was relocated to its other table
    Moved {
        /// Item
        item: Item,

        /// Slot the item left
        from: Location,

        /// Slot the item now occupies
        to: Location,
    },

    /// An item was removed
    Removed {
        /// Item
        item: Item,

        /// Slot that was freed
        from: Location,
    },
}

impl Action {
    /// The item the action refers to
    #[must_use]
    pub fn item(&self) -> &Item {
        match self {
            Self::Added { item, .. } | Self::Moved { item, .. } | Self::Removed { item, .. } => {
                item
            }
        }
    }

    /// Slot the item occupies after the action, if any
    #[must_use]
    pub fn destination(&self) -> Option<Location> {
        match self {
            Self::Added { to, .. } | Self::Moved { to, .. } => Some(*to),
            Self::Removed { .. } => None,
        }
    }

    /// Slot the item occupied before the action, if any
    #[must_use]
    pub fn source(&self) -> Option<Location> {
        match self {
            Self::Moved { from, .. } | Self::Removed { from, .. } => Some(*from),
            Self::Added { .. } => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = String::from_utf8_lossy(self.item().key_bytes());

        match self {
            Self::Added { to, .. } => write!(f, "added {key:?} -> {to}"),
            Self::Moved { from, to, .. } => write!(f, "moved {key:?} {from} -> {to}"),
            Self::Removed { from, .. } => write!(f, "removed {key:?} from {from}"),
        }
    }
}

/// Pending mutations of one insert or remove
///
/// Relocation chains are discovered outside-in (the new item first, then the
/// occupant it would evict, and so on), but a chain only succeeds once its
/// innermost item found a free slot. Actions are therefore recorded
/// innermost-first, which is exactly the order in which they have to be
/// applied: every slot is vacated before it is written again.
#[derive(Default)]
pub struct ActionLog {
    actions: Vec<Action>,
}

impl ActionLog {
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Number of relocations in the log
    pub fn moved_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, Action::Moved { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableId;
    use test_log::test;

    #[test]
    fn action_log_clear() {
        let mut log = ActionLog::default();
        let item = Item::new("a", 1);

        log.record(Action::Moved {
            item: item.clone(),
            from: Location::new(TableId::First, 0, 0),
            to: Location::new(TableId::Second, 0, 0),
        });
        log.record(Action::Added {
            item,
            to: Location::new(TableId::First, 0, 0),
        });

        assert_eq!(2, log.len());
        assert_eq!(1, log.moved_count());

        log.clear();
        assert!(log.is_empty());
        assert_eq!(0, log.moved_count());
    }

    #[test]
    fn action_accessors() {
        let from = Location::new(TableId::First, 1, 0);
        let to = Location::new(TableId::Second, 2, 0);
        let action = Action::Moved {
            item: Item::new("k", 3),
            from,
            to,
        };

        assert_eq!(Some(from), action.source());
        assert_eq!(Some(to), action.destination());
        assert_eq!(3, action.item().value());
        assert_eq!("moved \"k\" T1[1:0] -> T2[2:0]", action.to_string());
    }
}
