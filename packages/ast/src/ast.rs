//! AST definitions for parsed MFM markup.
//!
//! Nodes are produced once by the external parser and never mutated by the
//! render engine. Every markup construct has exactly one variant here; the
//! renderer dispatches with an exhaustive match so a new variant cannot be
//! added without a handler.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arguments of a function directive.
///
/// A bare flag (`$[spin.left ...]` → `left`) carries `None`; a valued
/// argument (`speed=2s`) carries `Some("2s")`.
pub type FnArgs = HashMap<String, Option<String>>;

/// One parsed markup construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MarkupNode {
    /// Plain text run.
    Text { value: String },

    /// A single unicode emoji grapheme.
    UnicodeEmoji { value: String },

    /// Custom emoji reference, `:name:` (without the colons).
    EmojiCode { name: String },

    Bold { children: Vec<MarkupNode> },
    Italic { children: Vec<MarkupNode> },
    Strike { children: Vec<MarkupNode> },
    Small { children: Vec<MarkupNode> },

    InlineCode { code: String },
    BlockCode { code: String, lang: Option<String> },

    MathInline { formula: String },
    MathBlock { formula: String },

    /// Quoted block. `nowrap` selects the inline rendering of the quote.
    Quote { children: Vec<MarkupNode>, nowrap: bool },

    Center { children: Vec<MarkupNode> },

    /// `@username` or `@username@host`.
    Mention {
        username: String,
        host: Option<String>,
        acct: String,
    },

    Hashtag { hashtag: String },

    /// Bare URL.
    Url { url: String },

    /// `[label](url)` style link with rendered children as the label.
    Link { url: String, children: Vec<MarkupNode> },

    /// Search block: a query plus a search action.
    Search { query: String },

    /// Subtree rendered without block-level structure.
    Plain { children: Vec<MarkupNode> },

    /// Function directive `$[name.arg1,arg2=v content]`.
    Fn {
        name: String,
        args: FnArgs,
        children: Vec<MarkupNode>,
    },
}

impl MarkupNode {
    /// Child list of a container variant, empty for leaves.
    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Bold { children }
            | MarkupNode::Italic { children }
            | MarkupNode::Strike { children }
            | MarkupNode::Small { children }
            | MarkupNode::Quote { children, .. }
            | MarkupNode::Center { children }
            | MarkupNode::Link { children, .. }
            | MarkupNode::Plain { children }
            | MarkupNode::Fn { children, .. } => children,
            _ => &[],
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        MarkupNode::Text {
            value: value.into(),
        }
    }

    pub fn emoji_code(name: impl Into<String>) -> Self {
        MarkupNode::EmojiCode { name: name.into() }
    }
}

/// Collect every custom-emoji name referenced in a tree, in order of first
/// appearance, deduplicated.
///
/// This is the single extraction policy used for cache prefetch: names are
/// taken from the parsed AST (never re-scanned from raw text) with their
/// original case, and remote-qualified names (`name@host`) are skipped since
/// they cannot be resolved against the local host's dictionary.
pub fn collect_emoji_codes(nodes: &[MarkupNode]) -> Vec<String> {
    let mut seen = Vec::new();
    collect_into(nodes, &mut seen);
    seen
}

fn collect_into(nodes: &[MarkupNode], out: &mut Vec<String>) {
    for node in nodes {
        if let MarkupNode::EmojiCode { name } = node {
            if !name.contains('@') && !out.iter().any(|n| n == name) {
                out.push(name.clone());
            }
        }
        collect_into(node.children(), out);
    }
}
