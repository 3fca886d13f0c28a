//! Tracy profiler initialization.

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_tracy::TracyLayer;

/// Spans forwarded to Tracy: every terrain span, `INFO` and up elsewhere.
fn terrain_spans() -> Targets {
  Targets::new()
    .with_target(env!("CARGO_CRATE_NAME"), Level::TRACE)
    .with_default(Level::INFO)
}

/// Installs a Tracy layer as the global tracing subscriber.
///
/// Call before `App::run()` and without Bevy's `LogPlugin`, which installs
/// its own subscriber. The meshing system shows up as a span per frame;
/// engine internals are filtered down to `INFO` so they don't drown it.
pub fn init_tracy() {
  tracing_subscriber::registry()
    .with(TracyLayer::default().with_filter(terrain_spans()))
    .init();
}
