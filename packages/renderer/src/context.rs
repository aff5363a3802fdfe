//! Render context threaded through the recursive walk.
//!
//! Contexts propagate read-only: every child context is a copy of the
//! parent's fields, narrowed only where a construct deliberately does so
//! (`Plain` forces `plain` for its own subtree).

use std::collections::HashMap;
use std::sync::Arc;

/// Cat-speech text transform policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatSpeech {
    #[default]
    Off,
    On,
    /// Apply the transform only when the content's author is flagged as a
    /// cat by the host application.
    Respect,
}

#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Host the content originates from, for custom-emoji resolution.
    pub host: Option<String>,

    /// Explicit per-render emoji dictionary (e.g. the note's own emojis).
    /// Highest-priority resolution source.
    pub emoji_map: HashMap<String, String>,

    /// Dictionary of an enclosing provider, used when nested content (a
    /// quoted sub-tree) carries its own emojis.
    pub ambient_emojis: Option<Arc<HashMap<String, String>>>,

    /// Render everything as one inline run, no block structure.
    pub plain: bool,

    /// Prefer inline containers where a construct offers both.
    pub nowrap: bool,

    pub cat_speech: CatSpeech,

    /// Ambient signal consulted by [`CatSpeech::Respect`].
    pub author_is_cat: bool,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_emoji_map(mut self, map: HashMap<String, String>) -> Self {
        self.emoji_map = map;
        self
    }

    /// Child context for a `Plain` subtree: `plain` forced on, everything
    /// else carried forward.
    pub fn plain_subtree(&self) -> Self {
        let mut child = self.clone();
        child.plain = true;
        child
    }

    pub fn cat_speech_active(&self) -> bool {
        match self.cat_speech {
            CatSpeech::On => true,
            CatSpeech::Respect => self.author_is_cat,
            CatSpeech::Off => false,
        }
    }
}
