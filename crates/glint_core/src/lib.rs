//! Glint Core Runtime
//!
//! This crate provides the reactive foundation of the Glint scene-graph
//! engine:
//!
//! - **Property Cells**: typed reactive value slots with change watchers
//! - **One-way Bindings**: push-on-change propagation across a cycle-checked
//!   dependency graph
//! - **Deterministic ordering**: every cell carries a creation sequence
//!   number, which downstream animation scheduling uses to keep per-frame
//!   evaluation order stable
//!
//! # Example
//!
//! ```rust
//! use glint_core::{OwnerId, PropertyStore, PropertyValue};
//!
//! let mut store = PropertyStore::new();
//!
//! let a = store.create_cell(OwnerId::NONE, PropertyValue::Float(0.0));
//! let b = store.create_cell(OwnerId::NONE, PropertyValue::Float(0.0));
//!
//! // b tracks a from now on
//! store.bind(b, a).unwrap();
//! store.set(a, PropertyValue::Float(400.0)).unwrap();
//!
//! assert_eq!(store.get_f64(b), Some(400.0));
//! ```

pub mod error;
pub mod store;
pub mod value;

pub use error::PropertyError;
pub use store::{CellId, OwnerId, PropertyStore, WatcherFn, WatcherId};
pub use value::{FontHandle, PropertyValue, TextureHandle, ValueKind};
