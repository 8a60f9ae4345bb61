//! Headless demo: a rect bouncing inside a group, evaluated for two
//! seconds of synthetic time. Run with `RUST_LOG=info` to see per-frame
//! output.

use glint_animation::{Easing, LoopCount, Tween};
use glint_scene::Stage;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut stage = Stage::new();
    let root = stage.create_group();
    let rect = stage.create_rect();
    stage.add(root, rect).unwrap();
    stage.set_root(root).unwrap();

    let base = stage.base(rect).unwrap();
    let store = stage.store_mut();
    store.set(base.w, 50.0).unwrap();
    store.set(base.h, 50.0).unwrap();

    stage
        .animate(
            base.y,
            Tween::new(200.0, 500.0)
                .from(0.0)
                .loops(LoopCount::Finite(4))
                .autoreverse(true)
                .easing(Easing::CubicInOut)
                .then(|_, _| tracing::info!("bounce finished")),
        )
        .unwrap();

    // 60 fps for two seconds
    for frame in 0..=120 {
        let now_ms = f64::from(frame) * 1000.0 / 60.0;
        let snapshot = stage.tick(now_ms);
        let y = stage.store().get_f64(base.y).unwrap();
        tracing::info!(now_ms, y, nodes = snapshot.nodes.len(), "frame");
    }
}
