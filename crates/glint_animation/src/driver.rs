//! Driver registry: owns running tweens and advances them per frame.

use crate::tween::{ThenFn, Tween};
use glint_core::{CellId, PropertyStore, ValueKind};
use slotmap::{new_key_type, SlotMap};
use std::collections::BTreeMap;

new_key_type! {
    /// Handle to a started animation.
    pub struct AnimId;
}

/// Lifecycle of a driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimState {
    /// Started but still inside its delay window.
    Pending,
    Running,
    /// Stopped by the host; the cell keeps its last written value.
    Stopped,
    /// Finished all cycles; the exact end value was written.
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum AnimError {
    #[error("cell {0:?} is not animatable (expected Float, found {1:?})")]
    NotAnimatable(CellId, ValueKind),
    #[error("cell {0:?} is read-only")]
    ReadOnly(CellId),
    #[error("cell {0:?} no longer exists")]
    DeadCell(CellId),
}

struct Driver {
    cell: CellId,
    cell_seq: u64,
    tween: Tween,
    state: AnimState,
    /// Timestamp of the start of the first cycle, fixed on first advance.
    anchor: Option<f64>,
    /// Start value, captured once the driver actually runs.
    from: Option<f64>,
}

enum Step {
    Keep,
    /// Finished naturally; fire the completion callback if any.
    Complete(Option<ThenFn>),
    /// Target cell died; drop from the active set silently.
    Retire,
}

/// All animation drivers of one engine instance.
///
/// Advancing is deterministic: drivers step in the creation order of their
/// target cells, so two drivers writing related cells always resolve the
/// same way from frame to frame.
#[derive(Default)]
pub struct DriverSet {
    drivers: SlotMap<AnimId, Driver>,
    /// Active drivers keyed by target-cell creation sequence. One driver
    /// per cell; starting a new one supersedes the old.
    active: BTreeMap<u64, AnimId>,
    /// Drivers that reached a terminal state, reclaimed at the start of
    /// the next advance. Terminal states stay queryable until then.
    finished: Vec<AnimId>,
}

impl DriverSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween on `cell`.
    ///
    /// Only live, writable `Float` cells are animatable. A driver already
    /// animating the same cell is stopped without its completion callback.
    pub fn start(
        &mut self,
        store: &PropertyStore,
        cell: CellId,
        tween: Tween,
    ) -> Result<AnimId, AnimError> {
        let kind = store.kind(cell).ok_or(AnimError::DeadCell(cell))?;
        if kind != ValueKind::Float {
            return Err(AnimError::NotAnimatable(cell, kind));
        }
        if store.is_readonly(cell) == Some(true) {
            return Err(AnimError::ReadOnly(cell));
        }
        let cell_seq = store.seq(cell).ok_or(AnimError::DeadCell(cell))?;

        let id = self.drivers.insert(Driver {
            cell,
            cell_seq,
            tween,
            state: AnimState::Pending,
            anchor: None,
            from: None,
        });
        if let Some(old) = self.active.insert(cell_seq, id) {
            if let Some(driver) = self.drivers.get_mut(old) {
                driver.state = AnimState::Stopped;
                self.finished.push(old);
            }
        }
        Ok(id)
    }

    /// Stop an animation, freezing the cell at its last written value.
    /// Idempotent; never fires the completion callback.
    pub fn stop(&mut self, anim: AnimId) {
        if let Some(driver) = self.drivers.get_mut(anim) {
            if matches!(driver.state, AnimState::Pending | AnimState::Running) {
                driver.state = AnimState::Stopped;
                // only remove if this driver still owns the slot
                if self.active.get(&driver.cell_seq) == Some(&anim) {
                    let seq = driver.cell_seq;
                    self.active.remove(&seq);
                }
                self.finished.push(anim);
            }
        }
    }

    /// State of a driver. Terminal states (`Stopped`, `Completed`) remain
    /// queryable until the advance after they were reached, when the
    /// driver is reclaimed and this returns `None`.
    pub fn state(&self, anim: AnimId) -> Option<AnimState> {
        self.drivers.get(anim).map(|driver| driver.state)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Total drivers still held, active or awaiting reclamation.
    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// Step every active driver to `now_ms`, writing interpolated values
    /// into `store`. Completion callbacks run here, after the final value
    /// is written.
    pub fn advance_all(&mut self, store: &mut PropertyStore, now_ms: f64) {
        for id in self.finished.drain(..) {
            self.drivers.remove(id);
        }

        let order: Vec<(u64, AnimId)> = self.active.iter().map(|(s, id)| (*s, *id)).collect();
        for (seq, id) in order {
            let driver = match self.drivers.get_mut(id) {
                Some(driver) => driver,
                None => {
                    self.active.remove(&seq);
                    continue;
                }
            };
            let cell = driver.cell;
            match Self::step(driver, store, now_ms) {
                Step::Keep => {}
                Step::Complete(then) => {
                    self.active.remove(&seq);
                    self.finished.push(id);
                    if let Some(callback) = then {
                        callback(cell, store);
                    }
                }
                Step::Retire => {
                    self.active.remove(&seq);
                    self.finished.push(id);
                }
            }
        }
    }

    fn step(driver: &mut Driver, store: &mut PropertyStore, now: f64) -> Step {
        let anchor = *driver.anchor.get_or_insert_with(|| {
            let base = driver.tween.ref_time.unwrap_or(now);
            let mut anchor = base + driver.tween.delay_ms;
            if let Some(pos) = driver.tween.start_pos {
                anchor -= pos * driver.tween.duration_ms.max(0.0);
            }
            anchor
        });

        if now < anchor {
            driver.state = AnimState::Pending;
            return Step::Keep;
        }

        let from = match driver.from {
            Some(v) => v,
            None => match driver.tween.from.or_else(|| store.get_f64(driver.cell)) {
                Some(v) => {
                    driver.from = Some(v);
                    v
                }
                None => {
                    tracing::debug!(cell = ?driver.cell, "animation target gone, retiring driver");
                    driver.state = AnimState::Stopped;
                    return Step::Retire;
                }
            },
        };
        driver.state = AnimState::Running;

        let tween = &driver.tween;
        if tween.duration_ms <= 0.0 {
            return Self::finish(driver, store, tween.to);
        }

        let total_cycles = (now - anchor) / tween.duration_ms;
        if let Some(limit) = tween.loops.limit() {
            if total_cycles >= f64::from(limit) {
                let last = limit.saturating_sub(1);
                let end = if tween.autoreverse && last % 2 == 1 {
                    from
                } else {
                    tween.to
                };
                return Self::finish(driver, store, end);
            }
        }

        let completed = total_cycles.floor();
        let mut t = total_cycles - completed;
        if tween.autoreverse && (completed as u64) % 2 == 1 {
            t = 1.0 - t;
        }
        let value = from + (tween.to - from) * tween.easing.apply(t);
        match store.set(driver.cell, value) {
            Ok(()) => Step::Keep,
            Err(err) => {
                tracing::debug!(cell = ?driver.cell, %err, "animation write failed, retiring driver");
                driver.state = AnimState::Stopped;
                Step::Retire
            }
        }
    }

    /// Write the exact end value and mark the driver completed.
    fn finish(driver: &mut Driver, store: &mut PropertyStore, end: f64) -> Step {
        match store.set(driver.cell, end) {
            Ok(()) => {
                driver.state = AnimState::Completed;
                Step::Complete(driver.tween.then.take())
            }
            Err(err) => {
                tracing::debug!(cell = ?driver.cell, %err, "animation write failed, retiring driver");
                driver.state = AnimState::Stopped;
                Step::Retire
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::tween::LoopCount;
    use glint_core::{OwnerId, PropertyValue};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (PropertyStore, DriverSet, CellId) {
        let mut store = PropertyStore::new();
        let cell = store.create_cell(OwnerId::NONE, PropertyValue::Float(0.0));
        (store, DriverSet::new(), cell)
    }

    fn linear(to: f64, duration: f64) -> Tween {
        Tween::new(to, duration).easing(Easing::Linear)
    }

    #[test]
    fn completes_with_exact_end_value() {
        let (mut store, mut drivers, x) = setup();
        let fired = Rc::new(RefCell::new(0));
        let f = Rc::clone(&fired);
        let anim = drivers
            .start(
                &store,
                x,
                linear(100.0, 1000.0).then(move |_, _| *f.borrow_mut() += 1),
            )
            .unwrap();

        drivers.advance_all(&mut store, 0.0);
        drivers.advance_all(&mut store, 999.0);
        assert_eq!(drivers.state(anim), Some(AnimState::Running));

        // overshoot lands exactly on the target
        drivers.advance_all(&mut store, 1234.0);
        assert_eq!(store.get_f64(x), Some(100.0));
        assert_eq!(drivers.state(anim), Some(AnimState::Completed));
        assert_eq!(*fired.borrow(), 1);

        // completed drivers never step again
        drivers.advance_all(&mut store, 5000.0);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(drivers.active_count(), 0);
    }

    #[test]
    fn stop_freezes_without_callback() {
        let (mut store, mut drivers, x) = setup();
        let fired = Rc::new(RefCell::new(false));
        let f = Rc::clone(&fired);
        let anim = drivers
            .start(
                &store,
                x,
                linear(100.0, 1000.0).then(move |_, _| *f.borrow_mut() = true),
            )
            .unwrap();

        drivers.advance_all(&mut store, 0.0);
        drivers.advance_all(&mut store, 250.0);
        drivers.stop(anim);
        drivers.stop(anim); // idempotent

        assert_eq!(drivers.state(anim), Some(AnimState::Stopped));
        assert_eq!(store.get_f64(x), Some(25.0));

        drivers.advance_all(&mut store, 2000.0);
        assert_eq!(store.get_f64(x), Some(25.0));
        assert!(!*fired.borrow());
    }

    #[test]
    fn zero_duration_resolves_on_next_advance() {
        let (mut store, mut drivers, x) = setup();
        let anim = drivers.start(&store, x, linear(5.0, 0.0)).unwrap();

        // nothing written at start time
        assert_eq!(store.get_f64(x), Some(0.0));

        drivers.advance_all(&mut store, 10.0);
        assert_eq!(store.get_f64(x), Some(5.0));
        assert_eq!(drivers.state(anim), Some(AnimState::Completed));
    }

    #[test]
    fn autoreverse_two_cycles() {
        let (mut store, mut drivers, x) = setup();
        let anim = drivers
            .start(
                &store,
                x,
                linear(1.0, 1000.0)
                    .from(0.0)
                    .loops(LoopCount::Finite(2))
                    .autoreverse(true),
            )
            .unwrap();

        drivers.advance_all(&mut store, 0.0);
        drivers.advance_all(&mut store, 500.0);
        assert_eq!(store.get_f64(x), Some(0.5));

        // second cycle runs backwards
        drivers.advance_all(&mut store, 1500.0);
        assert_eq!(store.get_f64(x), Some(0.5));
        drivers.advance_all(&mut store, 1600.0);
        assert!((store.get_f64(x).unwrap() - 0.4).abs() < 1e-12);

        // even cycle count ends back at the start value
        drivers.advance_all(&mut store, 2000.0);
        assert_eq!(store.get_f64(x), Some(0.0));
        assert_eq!(drivers.state(anim), Some(AnimState::Completed));
    }

    #[test]
    fn ref_time_fast_forwards() {
        let (mut store, mut drivers, x) = setup();
        drivers
            .start(
                &store,
                x,
                linear(1.0, 1000.0)
                    .from(0.0)
                    .loops(LoopCount::Forever)
                    .ref_time(0.0),
            )
            .unwrap();

        // first advance lands mid-way through the second cycle
        drivers.advance_all(&mut store, 1500.0);
        assert_eq!(store.get_f64(x), Some(0.5));
    }

    #[test]
    fn start_pos_shifts_into_cycle() {
        let (mut store, mut drivers, x) = setup();
        drivers
            .start(&store, x, linear(1.0, 1000.0).from(0.0).start_pos(0.5))
            .unwrap();

        drivers.advance_all(&mut store, 0.0);
        assert_eq!(store.get_f64(x), Some(0.5));
    }

    #[test]
    fn delay_keeps_driver_pending() {
        let (mut store, mut drivers, x) = setup();
        let anim = drivers
            .start(&store, x, linear(1.0, 1000.0).from(0.0).delay(100.0))
            .unwrap();

        drivers.advance_all(&mut store, 0.0);
        drivers.advance_all(&mut store, 50.0);
        assert_eq!(drivers.state(anim), Some(AnimState::Pending));
        assert_eq!(store.get_f64(x), Some(0.0));

        drivers.advance_all(&mut store, 600.0);
        assert_eq!(drivers.state(anim), Some(AnimState::Running));
        assert_eq!(store.get_f64(x), Some(0.5));
    }

    #[test]
    fn new_driver_supersedes_old_on_same_cell() {
        let (mut store, mut drivers, x) = setup();
        let first = drivers.start(&store, x, linear(100.0, 1000.0)).unwrap();
        let second = drivers.start(&store, x, linear(-100.0, 1000.0)).unwrap();

        assert_eq!(drivers.state(first), Some(AnimState::Stopped));
        assert_eq!(drivers.active_count(), 1);

        drivers.advance_all(&mut store, 0.0);
        drivers.advance_all(&mut store, 500.0);
        assert_eq!(store.get_f64(x), Some(-50.0));
        assert_eq!(drivers.state(second), Some(AnimState::Running));
    }

    #[test]
    fn dead_cell_retires_driver() {
        let mut store = PropertyStore::new();
        let owner = OwnerId(3);
        let x = store.create_cell(owner, PropertyValue::Float(0.0));
        let mut drivers = DriverSet::new();
        let anim = drivers.start(&store, x, linear(1.0, 1000.0)).unwrap();

        store.remove_owner(owner);
        drivers.advance_all(&mut store, 500.0);

        assert_eq!(drivers.state(anim), Some(AnimState::Stopped));
        assert_eq!(drivers.active_count(), 0);
    }

    #[test]
    fn only_float_cells_are_animatable() {
        let mut store = PropertyStore::new();
        let flag = store.create_cell(OwnerId::NONE, PropertyValue::Bool(false));
        let frozen = store.create_readonly(OwnerId::NONE, PropertyValue::Float(0.0));
        let mut drivers = DriverSet::new();

        assert!(matches!(
            drivers.start(&store, flag, linear(1.0, 100.0)),
            Err(AnimError::NotAnimatable(..))
        ));
        assert!(matches!(
            drivers.start(&store, frozen, linear(1.0, 100.0)),
            Err(AnimError::ReadOnly(_))
        ));
    }

    #[test]
    fn finished_drivers_are_reclaimed() {
        let (mut store, mut drivers, x) = setup();

        // long-lived engines churn through many short animations
        for i in 0..100 {
            let anim = drivers.start(&store, x, linear(f64::from(i), 0.0)).unwrap();
            drivers.advance_all(&mut store, f64::from(i));
            assert_eq!(drivers.state(anim), Some(AnimState::Completed));
        }

        // each advance reclaims the previous terminal driver
        assert_eq!(drivers.active_count(), 0);
        assert_eq!(drivers.driver_count(), 1);
        drivers.advance_all(&mut store, 1000.0);
        assert_eq!(drivers.driver_count(), 0);
    }

    #[test]
    fn stopped_drivers_are_reclaimed() {
        let (mut store, mut drivers, x) = setup();
        let anim = drivers.start(&store, x, linear(1.0, 1000.0)).unwrap();

        drivers.advance_all(&mut store, 0.0);
        drivers.stop(anim);
        assert_eq!(drivers.state(anim), Some(AnimState::Stopped));

        drivers.advance_all(&mut store, 100.0);
        assert_eq!(drivers.state(anim), None);
        assert_eq!(drivers.driver_count(), 0);
    }

    #[test]
    fn drivers_advance_in_cell_creation_order() {
        let mut store = PropertyStore::new();
        let first = store.create_cell(OwnerId::NONE, PropertyValue::Float(0.0));
        let second = store.create_cell(OwnerId::NONE, PropertyValue::Float(0.0));

        let log = Rc::new(RefCell::new(Vec::new()));
        for (tag, cell) in [("first", first), ("second", second)] {
            let log = Rc::clone(&log);
            store
                .watch(
                    cell,
                    Box::new(move |_, _, _, _| log.borrow_mut().push(tag)),
                    false,
                )
                .unwrap();
        }

        let mut drivers = DriverSet::new();
        // started in reverse of creation order on purpose
        drivers.start(&store, second, linear(1.0, 1000.0)).unwrap();
        drivers.start(&store, first, linear(1.0, 1000.0)).unwrap();

        drivers.advance_all(&mut store, 0.0);
        drivers.advance_all(&mut store, 500.0);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }
}
