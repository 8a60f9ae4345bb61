//! Declarative tween specifications.

use crate::easing::Easing;
use glint_core::{CellId, PropertyStore};

/// How many times a tween plays before completing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopCount {
    #[default]
    Once,
    Finite(u32),
    Forever,
}

impl LoopCount {
    /// Cycle limit as a count, `None` for endless.
    pub(crate) fn limit(self) -> Option<u32> {
        match self {
            LoopCount::Once => Some(1),
            LoopCount::Finite(n) => Some(n),
            LoopCount::Forever => None,
        }
    }
}

/// Completion callback, fired at most once when a tween finishes naturally.
/// Never fired on [`stop`](crate::DriverSet::stop).
pub type ThenFn = Box<dyn FnOnce(CellId, &mut PropertyStore)>;

/// A time-based animation spec for one `Float` cell.
///
/// Built fluently and handed to [`DriverSet::start`](crate::DriverSet::start):
///
/// ```rust,no_run
/// # use glint_animation::{Easing, LoopCount, Tween};
/// let tween = Tween::new(250.0, 800.0)
///     .from(10.0)
///     .delay(200.0)
///     .loops(LoopCount::Finite(3))
///     .autoreverse(true)
///     .easing(Easing::CubicInOut);
/// ```
pub struct Tween {
    /// Start value. `None` means capture the cell's value when the tween
    /// leaves its delay and actually starts running.
    pub from: Option<f64>,
    pub to: f64,
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub loops: LoopCount,
    pub autoreverse: bool,
    pub easing: Easing,
    /// External start timestamp. When set, elapsed time is measured from
    /// here instead of the first advance, fast-forwarding past any cycles
    /// that already ended.
    pub ref_time: Option<f64>,
    /// Initial position within the first cycle as a fraction in `[0, 1)`.
    pub start_pos: Option<f64>,
    pub(crate) then: Option<ThenFn>,
}

impl Tween {
    pub fn new(to: f64, duration_ms: f64) -> Self {
        Self {
            from: None,
            to,
            duration_ms,
            delay_ms: 0.0,
            loops: LoopCount::Once,
            autoreverse: false,
            easing: Easing::default(),
            ref_time: None,
            start_pos: None,
            then: None,
        }
    }

    pub fn from(mut self, from: f64) -> Self {
        self.from = Some(from);
        self
    }

    pub fn delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn loops(mut self, loops: LoopCount) -> Self {
        self.loops = loops;
        self
    }

    pub fn autoreverse(mut self, autoreverse: bool) -> Self {
        self.autoreverse = autoreverse;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn ref_time(mut self, ref_time_ms: f64) -> Self {
        self.ref_time = Some(ref_time_ms);
        self
    }

    pub fn start_pos(mut self, pos: f64) -> Self {
        self.start_pos = Some(pos.clamp(0.0, 1.0));
        self
    }

    /// Run `callback` once when the tween completes all its cycles.
    pub fn then(mut self, callback: impl FnOnce(CellId, &mut PropertyStore) + 'static) -> Self {
        self.then = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration_ms", &self.duration_ms)
            .field("delay_ms", &self.delay_ms)
            .field("loops", &self.loops)
            .field("autoreverse", &self.autoreverse)
            .field("easing", &self.easing)
            .field("has_then", &self.then.is_some())
            .finish()
    }
}
