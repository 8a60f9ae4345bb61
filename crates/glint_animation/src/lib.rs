//! Glint Animation Engine
//!
//! Time-based tween drivers that write interpolated values into property
//! cells owned by a [`glint_core::PropertyStore`]. The engine is entirely
//! pull-driven: nothing moves until the host calls
//! [`DriverSet::advance_all`] with the current clock, which makes frames
//! reproducible under a synthetic clock in tests.
//!
//! - **Tween**: a declarative animation spec (target value, duration,
//!   delay, loop count, autoreverse, easing) built in fluent style
//! - **DriverSet**: the per-engine registry that owns running drivers and
//!   advances them in deterministic cell-creation order
//!
//! # Example
//!
//! ```rust
//! use glint_animation::{DriverSet, Easing, Tween};
//! use glint_core::{OwnerId, PropertyStore, PropertyValue};
//!
//! let mut store = PropertyStore::new();
//! let x = store.create_cell(OwnerId::NONE, PropertyValue::Float(0.0));
//!
//! let mut drivers = DriverSet::new();
//! drivers
//!     .start(&store, x, Tween::new(100.0, 1000.0).easing(Easing::Linear))
//!     .unwrap();
//!
//! drivers.advance_all(&mut store, 0.0);
//! drivers.advance_all(&mut store, 500.0);
//! assert_eq!(store.get_f64(x), Some(50.0));
//! ```

pub mod driver;
pub mod easing;
pub mod tween;

pub use driver::{AnimError, AnimId, AnimState, DriverSet};
pub use easing::Easing;
pub use tween::{LoopCount, ThenFn, Tween};
