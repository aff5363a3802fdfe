//! Renderer configuration.

use std::sync::Arc;

use mfm_ast::MarkupNode;

use crate::context::RenderContext;
use crate::vdom::VNode;

/// Replacement renderer for one node family. When supplied it fully replaces
/// the built-in rendering for that family.
pub type OverrideRenderer = Arc<dyn Fn(&MarkupNode, &RenderContext) -> VNode + Send + Sync>;

#[derive(Clone, Default)]
pub struct RenderOverrides {
    /// Custom-emoji (`EmojiCode`) nodes.
    pub emoji: Option<OverrideRenderer>,
    pub hashtag: Option<OverrideRenderer>,
    /// `Url` and `Link` nodes.
    pub link: Option<OverrideRenderer>,
    pub mention: Option<OverrideRenderer>,
}

#[derive(Clone)]
pub struct RendererConfig {
    /// Enables layout-affecting directives (`position`, `scale`) and the
    /// sparkle effect.
    pub advanced: bool,

    /// Enables animated style properties on top of `advanced`. When off,
    /// directives keep their static properties and drop the animation.
    pub animation: bool,

    pub overrides: RenderOverrides,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            advanced: true,
            animation: true,
            overrides: RenderOverrides::default(),
        }
    }
}
