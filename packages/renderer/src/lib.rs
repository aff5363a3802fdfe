//! # MFM Render Engine
//!
//! Interprets a parsed MFM markup tree (produced by an external parser)
//! into a tree of styled visual elements. The engine is deterministic with
//! respect to the AST; the only asynchronous pieces are custom-emoji
//! resolution (which completes after an initial fallback render) and the
//! two timer-driven components (relative time, sparkle particles).

pub mod color;
pub mod config;
pub mod context;
pub mod directive;
pub mod reltime;
pub mod renderer;
pub mod scheduler;
pub mod sparkle;
pub mod vdom;


#[cfg(test)]
mod tests_renderer;


pub use color::{parse as parse_color, to_display, validate_short_code, ParsedColor};
pub use config::{OverrideRenderer, RenderOverrides, RendererConfig};
pub use context::{CatSpeech, RenderContext};
pub use directive::{compose, FunctionInvocation};
pub use reltime::{
    format_relative, parse_timestamp, RelativeTimeTicker, TimeDisplayMode, INVALID_TIME_LABEL,
};
pub use renderer::{nyaize, Renderer};
pub use scheduler::{ManualScheduler, Scheduler, TimerToken, TokioScheduler};
pub use sparkle::{Particle, Rect, SparkleAnimator, SPARKLE_COLORS};
pub use vdom::VNode;
