//! Easing curves applied to normalized tween progress.

/// Maps normalized progress `t` in `[0, 1]` to an eased fraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    CubicIn,
    #[default]
    CubicOut,
    CubicInOut,
}

impl Easing {
    /// Evaluate the curve at `t`, clamped to `[0, 1]` first.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicIn => cubic_in(t),
            Easing::CubicOut => 1.0 - cubic_in(1.0 - t),
            Easing::CubicInOut => {
                if t < 0.5 {
                    cubic_in(t * 2.0) / 2.0
                } else {
                    1.0 - cubic_in((1.0 - t) * 2.0) / 2.0
                }
            }
        }
    }
}

fn cubic_in(t: f64) -> f64 {
    t * t * t
}
