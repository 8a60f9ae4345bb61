//! Reactive property cell store
//!
//! This implements a push-on-change reactive system: writing a cell
//! synchronously notifies its watchers and then pushes the value through
//! every cell bound to it, transitively, before the call returns. The
//! binding graph is kept acyclic at [`bind`](PropertyStore::bind) time, so
//! propagation is a plain recursive walk with no topological sort.
//!
//! Cells are addressed by generational [`CellId`] keys. A destroyed cell
//! simply stops resolving: bindings and animations that still reference it
//! become inert instead of dangling, which is the engine's weak-reference
//! discipline for detached scene nodes.
//!
//! Write policy for bound cells (fixed, documented): an explicit
//! [`set`](PropertyStore::set) on a bound cell clears the binding first and
//! then writes. Silent divergence from a still-attached source is never
//! possible.

use crate::error::{PropertyError, Result};
use crate::value::{PropertyValue, ValueKind};
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;
use std::panic::{catch_unwind, AssertUnwindSafe};

new_key_type! {
    /// Unique identifier for a property cell
    pub struct CellId;
}

/// Opaque tag identifying the scene node a cell belongs to.
///
/// The store does not interpret it; the scene layer stamps cells with the
/// owning node's key so they can be destroyed together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OwnerId(pub u64);

impl OwnerId {
    /// Tag for cells not owned by any node.
    pub const NONE: OwnerId = OwnerId(0);
}

/// Handle for unregistering a watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatcherId(u64);

/// Watcher callback: `(new_value, cell, owner, store)`.
///
/// The store reference allows a watcher to read or write other cells;
/// re-entrant writes go through the normal change-guarded path.
pub type WatcherFn = Box<dyn FnMut(&PropertyValue, CellId, OwnerId, &mut PropertyStore)>;

struct Watcher {
    id: WatcherId,
    callback: WatcherFn,
}

struct CellNode {
    value: PropertyValue,
    /// Monotonic creation sequence, used downstream for deterministic
    /// animation advance order.
    seq: u64,
    owner: OwnerId,
    readonly: bool,
    /// Cell this one is bound to (one-way, source side).
    binding_source: Option<CellId>,
    /// Cells bound to this one.
    dependents: SmallVec<[CellId; 2]>,
    /// Change watchers, in registration order.
    watchers: Vec<Watcher>,
}

/// The store managing all property cells of one engine instance.
pub struct PropertyStore {
    cells: SlotMap<CellId, CellNode>,
    next_seq: u64,
    next_watcher: u64,
    /// Cells whose watcher lists are currently taken out for dispatch,
    /// with the ids that were in flight. Stacked for re-entrant notifies.
    in_flight: Vec<(CellId, Vec<WatcherId>)>,
    /// Watchers removed re-entrantly while in flight; honored before the
    /// taken list is merged back.
    tombstones: Vec<WatcherId>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self {
            cells: SlotMap::with_key(),
            next_seq: 0,
            next_watcher: 0,
            in_flight: Vec::new(),
            tombstones: Vec::new(),
        }
    }

    // =========================================================================
    // CREATION / DESTRUCTION
    // =========================================================================

    /// Create a writable cell with an initial value.
    pub fn create_cell(&mut self, owner: OwnerId, initial: PropertyValue) -> CellId {
        self.create_inner(owner, initial, false)
    }

    /// Create a read-only cell. Only [`set_internal`](Self::set_internal)
    /// can write it afterwards (layout outputs, resource results).
    pub fn create_readonly(&mut self, owner: OwnerId, initial: PropertyValue) -> CellId {
        self.create_inner(owner, initial, true)
    }

    fn create_inner(&mut self, owner: OwnerId, initial: PropertyValue, readonly: bool) -> CellId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.cells.insert(CellNode {
            value: initial,
            seq,
            owner,
            readonly,
            binding_source: None,
            dependents: SmallVec::new(),
            watchers: Vec::new(),
        })
    }

    /// Destroy a single cell. Dependents keep their last value; their
    /// binding becomes inert.
    pub fn remove_cell(&mut self, cell: CellId) {
        if let Some(node) = self.cells.remove(cell) {
            if let Some(source) = node.binding_source {
                if let Some(src) = self.cells.get_mut(source) {
                    src.dependents.retain(|d| *d != cell);
                }
            }
            // Dependents are left pointing at the dead key on purpose; the
            // generational key can never resolve again, so no write will
            // ever originate from it.
        }
    }

    /// Destroy every cell stamped with `owner`.
    pub fn remove_owner(&mut self, owner: OwnerId) {
        let doomed: Vec<CellId> = self
            .cells
            .iter()
            .filter(|(_, node)| node.owner == owner)
            .map(|(id, _)| id)
            .collect();
        for cell in doomed {
            self.remove_cell(cell);
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Current value of a cell; `None` for a destroyed cell. Never blocks.
    pub fn get(&self, cell: CellId) -> Option<&PropertyValue> {
        self.cells.get(cell).map(|node| &node.value)
    }

    pub fn get_f64(&self, cell: CellId) -> Option<f64> {
        self.get(cell).and_then(PropertyValue::as_f64)
    }

    pub fn get_bool(&self, cell: CellId) -> Option<bool> {
        self.get(cell).and_then(PropertyValue::as_bool)
    }

    pub fn get_str(&self, cell: CellId) -> Option<&str> {
        self.get(cell).and_then(PropertyValue::as_str)
    }

    pub fn get_enum(&self, cell: CellId) -> Option<u32> {
        self.get(cell).and_then(PropertyValue::as_enum)
    }

    pub fn kind(&self, cell: CellId) -> Option<ValueKind> {
        self.get(cell).map(PropertyValue::kind)
    }

    pub fn owner(&self, cell: CellId) -> Option<OwnerId> {
        self.cells.get(cell).map(|node| node.owner)
    }

    /// Creation sequence number of a cell.
    pub fn seq(&self, cell: CellId) -> Option<u64> {
        self.cells.get(cell).map(|node| node.seq)
    }

    pub fn is_readonly(&self, cell: CellId) -> Option<bool> {
        self.cells.get(cell).map(|node| node.readonly)
    }

    pub fn binding_source(&self, cell: CellId) -> Option<CellId> {
        self.cells.get(cell).and_then(|node| node.binding_source)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Write a value through the public path.
    ///
    /// Fails on read-only cells and on kind mismatch. If the cell is bound,
    /// the binding is cleared first (explicit-unbind-on-set). On an actual
    /// value change, watchers fire in registration order and the value
    /// cascades through all dependent cells before this returns.
    pub fn set(&mut self, cell: CellId, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        let node = self.cells.get(cell).ok_or(PropertyError::DeadCell(cell))?;
        if node.readonly {
            return Err(PropertyError::ReadOnly(cell));
        }
        self.check_kind(cell, &value)?;
        if node.binding_source.is_some() {
            self.unbind(cell);
        }
        self.write_through(cell, value);
        Ok(())
    }

    /// Internal write path: bypasses the read-only flag and leaves any
    /// binding in place, but still fires watchers and cascades.
    ///
    /// Used by the engine for layout outputs and for values arriving from
    /// a binding source.
    pub fn set_internal(&mut self, cell: CellId, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        if !self.cells.contains_key(cell) {
            return Err(PropertyError::DeadCell(cell));
        }
        self.check_kind(cell, &value)?;
        self.write_through(cell, value);
        Ok(())
    }

    fn check_kind(&self, cell: CellId, value: &PropertyValue) -> Result<()> {
        let expected = self.kind(cell).ok_or(PropertyError::DeadCell(cell))?;
        if expected != value.kind() {
            return Err(PropertyError::TypeMismatch {
                expected,
                got: value.kind(),
            });
        }
        Ok(())
    }

    /// Apply a change-guarded write and cascade to dependents.
    fn write_through(&mut self, cell: CellId, value: PropertyValue) {
        let changed = match self.cells.get_mut(cell) {
            Some(node) => {
                if node.value == value {
                    false
                } else {
                    node.value = value.clone();
                    true
                }
            }
            None => false,
        };
        if !changed {
            return;
        }

        self.notify(cell, &value);

        // Re-read the dependent list after watchers ran; a watcher may have
        // bound or unbound cells.
        let dependents: SmallVec<[CellId; 2]> = match self.cells.get(cell) {
            Some(node) => node.dependents.clone(),
            None => return,
        };
        for dep in dependents {
            self.write_through(dep, value.clone());
        }
    }

    /// Run the cell's watchers with per-callback panic isolation.
    ///
    /// The list is taken out of the cell for the duration of dispatch so
    /// callbacks can freely mutate the store; removals requested while it
    /// is out are tracked as tombstones and applied before the merge back.
    fn notify(&mut self, cell: CellId, value: &PropertyValue) {
        let (mut taken, owner) = match self.cells.get_mut(cell) {
            Some(node) => (std::mem::take(&mut node.watchers), node.owner),
            None => return,
        };
        let in_flight_ids: Vec<WatcherId> = taken.iter().map(|w| w.id).collect();
        self.in_flight.push((cell, in_flight_ids));

        for watcher in taken.iter_mut() {
            if self.tombstones.contains(&watcher.id) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                (watcher.callback)(value, cell, owner, self);
            }));
            if outcome.is_err() {
                tracing::error!(?cell, "property watcher panicked; continuing");
            }
        }

        self.in_flight.pop();
        let tombstones = &mut self.tombstones;
        taken.retain(|w| match tombstones.iter().position(|id| *id == w.id) {
            Some(pos) => {
                tombstones.swap_remove(pos);
                false
            }
            None => true,
        });

        // Watchers registered re-entrantly while the list was taken out go
        // after the original ones, preserving registration order.
        if let Some(node) = self.cells.get_mut(cell) {
            taken.append(&mut node.watchers);
            node.watchers = taken;
        }
    }

    // =========================================================================
    // BINDINGS
    // =========================================================================

    /// Bind `cell` to track `source` (one-way).
    ///
    /// Checked at bind time: both cells alive, the target writable, same
    /// value kind, and no path from `source` back to `cell` through
    /// existing bindings. Read-only cells cannot be binding targets; they
    /// are engine outputs and only the internal write path touches them.
    /// On success the source's current value is pulled through immediately.
    pub fn bind(&mut self, cell: CellId, source: CellId) -> Result<()> {
        match self.cells.get(cell) {
            None => return Err(PropertyError::DeadCell(cell)),
            Some(node) if node.readonly => return Err(PropertyError::ReadOnly(cell)),
            Some(_) => {}
        }
        if !self.cells.contains_key(source) {
            return Err(PropertyError::DeadCell(source));
        }
        if cell == source {
            return Err(PropertyError::CyclicBinding { cell, src: source });
        }

        let expected = self.kind(cell).ok_or(PropertyError::DeadCell(cell))?;
        let got = self.kind(source).ok_or(PropertyError::DeadCell(source))?;
        if expected != got {
            return Err(PropertyError::TypeMismatch { expected, got });
        }

        // Walk the source's binding chain; reaching `cell` means the new
        // edge would close a cycle.
        let mut cursor = source;
        while let Some(next) = self.cells.get(cursor).and_then(|n| n.binding_source) {
            if next == cell {
                return Err(PropertyError::CyclicBinding { cell, src: source });
            }
            cursor = next;
        }

        self.unbind(cell);
        if let Some(node) = self.cells.get_mut(cell) {
            node.binding_source = Some(source);
        }
        if let Some(node) = self.cells.get_mut(source) {
            if !node.dependents.contains(&cell) {
                node.dependents.push(cell);
            }
        }

        let initial = self
            .get(source)
            .cloned()
            .ok_or(PropertyError::DeadCell(source))?;
        self.write_through(cell, initial);
        Ok(())
    }

    /// Remove the binding of `cell`, if any. Idempotent.
    pub fn unbind(&mut self, cell: CellId) {
        let source = match self.cells.get_mut(cell) {
            Some(node) => node.binding_source.take(),
            None => None,
        };
        if let Some(source) = source {
            if let Some(src) = self.cells.get_mut(source) {
                src.dependents.retain(|d| *d != cell);
            }
        }
    }

    // =========================================================================
    // WATCHERS
    // =========================================================================

    /// Register a change watcher. With `call_now`, the callback is invoked
    /// immediately with the current value before being registered.
    pub fn watch(
        &mut self,
        cell: CellId,
        mut callback: WatcherFn,
        call_now: bool,
    ) -> Result<WatcherId> {
        if !self.cells.contains_key(cell) {
            return Err(PropertyError::DeadCell(cell));
        }

        if call_now {
            let value = self
                .get(cell)
                .cloned()
                .ok_or(PropertyError::DeadCell(cell))?;
            let owner = self.owner(cell).unwrap_or(OwnerId::NONE);
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                callback(&value, cell, owner, self);
            }));
            if outcome.is_err() {
                tracing::error!(?cell, "property watcher panicked during call_now");
            }
        }

        let id = WatcherId(self.next_watcher);
        self.next_watcher += 1;
        let node = self.cells.get_mut(cell).ok_or(PropertyError::DeadCell(cell))?;
        node.watchers.push(Watcher { id, callback });
        Ok(id)
    }

    /// Unregister a watcher. Returns whether it was found.
    ///
    /// Valid from inside a watcher callback, including a watcher removing
    /// itself: the removal takes effect immediately and survives the
    /// current notification pass.
    pub fn unwatch(&mut self, cell: CellId, id: WatcherId) -> bool {
        if let Some(node) = self.cells.get_mut(cell) {
            let before = node.watchers.len();
            node.watchers.retain(|w| w.id != id);
            if node.watchers.len() != before {
                return true;
            }
        }
        // The watcher may be mid-dispatch, taken out of the cell.
        let dispatching = self
            .in_flight
            .iter()
            .any(|(c, ids)| *c == cell && ids.contains(&id));
        if dispatching && !self.tombstones.contains(&id) {
            self.tombstones.push(id);
            return true;
        }
        false
    }
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("cells", &self.cells.len())
            .finish()
    }
}

// Keys round-trip through u64 for owner stamping.
pub(crate) fn key_to_raw<K: Key>(key: K) -> u64 {
    key.data().as_ffi()
}

impl From<CellId> for OwnerId {
    fn from(cell: CellId) -> Self {
        OwnerId(key_to_raw(cell))
    }
}
