// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A fixed-capacity, two-table cuckoo hash.
//!
//! ##### About
//!
//! This crate exports a `CuckooTable` that maps byte-string keys to word-sized
//! values, for example network flow tuples to flow record identifiers.
//!
//! Every key has exactly one candidate bucket in each of the two tables, so a
//! lookup scans at most two buckets. Inserts that find both candidate buckets
//! full relocate existing items into their alternative bucket, up to a
//! configurable chain length. All mutations of an insert are planned first and
//! applied as a unit, so a failed insert leaves the table untouched.
//!
//! Capacity is fixed at creation; the table never grows or rehashes.
//!
//! Callers that keep references to slots (e.g. an index of item locations)
//! can install an [`EventListener`] to learn about every relocation.
//!
//! ```
//! use cuckoo_table::{Config, Item};
//!
//! let mut table = Config::new(8).bucket_size(4).max_depth(4).build()?;
//!
//! table.insert(Item::new("10.0.0.1:443->10.0.0.2:51000", 1))?;
//! assert_eq!(Some(1), table.lookup("10.0.0.1:443->10.0.0.2:51000")?);
//!
//! assert_eq!(1, table.remove("10.0.0.1:443->10.0.0.2:51000")?);
//! assert!(table.is_empty());
//! #
//! # Ok::<(), cuckoo_table::Error>(())
//! ```

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[doc(hidden)]
pub type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

pub(crate) type HashSet<K> = std::collections::HashSet<K, rustc_hash::FxBuildHasher>;

mod action;

mod bucket;

/// Configuration
pub mod config;

mod displacement;
mod error;
mod hash;
mod item;
mod listener;

#[cfg(feature = "metrics")]
mod metrics;

mod shared;
mod slice;
mod stats;
mod table;
mod table_pair;

/// User defined key (byte array)
pub type UserKey = Slice;

/// User defined data (one machine word)
pub type Value = u64;

pub use {
    action::Action,
    bucket::MAX_BUCKET_SIZE,
    config::{Config, MAX_DEPTH},
    error::{Error, Result},
    hash::{hash32, KeyHash},
    item::{Item, ItemKey},
    listener::{EventListener, KeyComparator},
    shared::SharedCuckooTable,
    slice::Slice,
    stats::Stats,
    table::CuckooTable,
    table_pair::{Location, TableId, MAX_TABLE_POWER},
};

#[cfg(feature = "metrics")]
pub use metrics::Metrics;
