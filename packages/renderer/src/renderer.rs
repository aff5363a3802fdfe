//! Recursive AST interpretation.
//!
//! Walks a parsed markup tree and dispatches every node variant to its
//! rendering rule. The match is exhaustive by construction: adding a
//! variant to `MarkupNode` will not compile until it gets a rule here.
//!
//! Rendering never fails. The worst a malformed node produces is a literal
//! fallback (`:name:`, `$[...]` syntax), per the engine's error policy.

use std::sync::Arc;

use tracing::debug;

use mfm_ast::MarkupNode;
use mfm_emoji::EmojiResolver;

use crate::config::RendererConfig;
use crate::context::RenderContext;
use crate::directive::{self, FunctionInvocation};
use crate::vdom::VNode;

/// Cat-speech text transform.
pub fn nyaize(text: &str) -> String {
    text.replace('な', "にゃ")
        .replace('ナ', "ニャ")
        .replace("na", "nya")
        .replace("NA", "NYA")
}

pub struct Renderer {
    config: RendererConfig,
    resolver: Option<Arc<EmojiResolver>>,
    missing_emojis: Vec<String>,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            resolver: None,
            missing_emojis: Vec::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<EmojiResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Custom-emoji names that missed every resolution source during the
    /// renders since the last drain. Feed these to
    /// [`EmojiResolver::prefetch_missing`] and re-render on cache change.
    pub fn take_missing_emojis(&mut self) -> Vec<String> {
        std::mem::take(&mut self.missing_emojis)
    }

    /// Render a markup tree to a list of visual elements.
    pub fn render(&mut self, nodes: &[MarkupNode], ctx: &RenderContext) -> Vec<VNode> {
        debug!(nodes = nodes.len(), plain = ctx.plain, "rendering markup tree");
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            self.render_node(node, ctx, &mut out);
        }
        out
    }

    fn render_children(&mut self, nodes: &[MarkupNode], ctx: &RenderContext) -> Vec<VNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            self.render_node(node, ctx, &mut out);
        }
        out
    }

    fn render_node(&mut self, node: &MarkupNode, ctx: &RenderContext, out: &mut Vec<VNode>) {
        match node {
            MarkupNode::Text { value } => self.render_text(value, ctx, out),

            MarkupNode::UnicodeEmoji { value } => out.push(VNode::text(value.clone())),

            MarkupNode::EmojiCode { name } => self.render_emoji_code(node, name, ctx, out),

            MarkupNode::Bold { children } => {
                let children = self.render_children(children, ctx);
                out.push(VNode::element("b").with_children(children));
            }
            MarkupNode::Italic { children } => {
                let children = self.render_children(children, ctx);
                out.push(VNode::element("i").with_children(children));
            }
            MarkupNode::Strike { children } => {
                let children = self.render_children(children, ctx);
                out.push(VNode::element("del").with_children(children));
            }
            MarkupNode::Small { children } => {
                let children = self.render_children(children, ctx);
                out.push(VNode::element("small").with_children(children));
            }

            MarkupNode::InlineCode { code } => {
                out.push(VNode::element("code").with_child(VNode::text(code.clone())));
            }
            MarkupNode::BlockCode { code, lang } => {
                let mut code_el = VNode::element("code").with_child(VNode::text(code.clone()));
                if let Some(lang) = lang {
                    code_el = code_el.with_class(format!("language-{}", lang));
                }
                out.push(VNode::element("pre").with_child(code_el));
            }

            MarkupNode::MathInline { formula } => {
                out.push(
                    VNode::element("code")
                        .with_class("mfm-math")
                        .with_child(VNode::text(formula.clone())),
                );
            }
            MarkupNode::MathBlock { formula } => {
                out.push(
                    VNode::element("pre").with_class("mfm-math-block").with_child(
                        VNode::element("code").with_child(VNode::text(formula.clone())),
                    ),
                );
            }

            MarkupNode::Quote { children, nowrap } => {
                // The inline/block choice follows the node's own flag, not
                // the ambient context.
                let children = self.render_children(children, ctx);
                let tag = if *nowrap { "span" } else { "blockquote" };
                out.push(
                    VNode::element(tag)
                        .with_class("mfm-quote")
                        .with_children(children),
                );
            }

            MarkupNode::Center { children } => {
                let children = self.render_children(children, ctx);
                out.push(
                    VNode::element("div")
                        .with_class("mfm-center")
                        .with_children(children),
                );
            }

            MarkupNode::Mention { acct, .. } => {
                if let Some(render) = self.config.overrides.mention.clone() {
                    out.push(render(node, ctx));
                    return;
                }
                out.push(
                    VNode::element("a")
                        .with_class("mfm-mention")
                        .with_attr("href", format!("/{}", acct))
                        .with_child(VNode::text(acct.clone())),
                );
            }

            MarkupNode::Hashtag { hashtag } => {
                if let Some(render) = self.config.overrides.hashtag.clone() {
                    out.push(render(node, ctx));
                    return;
                }
                out.push(
                    VNode::element("a")
                        .with_class("mfm-hashtag")
                        .with_attr("href", format!("/tags/{}", hashtag))
                        .with_child(VNode::text(format!("#{}", hashtag))),
                );
            }

            MarkupNode::Url { url } => {
                if let Some(render) = self.config.overrides.link.clone() {
                    out.push(render(node, ctx));
                    return;
                }
                out.push(self.render_url(url));
            }

            MarkupNode::Link { url, children } => {
                if let Some(render) = self.config.overrides.link.clone() {
                    out.push(render(node, ctx));
                    return;
                }
                let children = self.render_children(children, ctx);
                out.push(
                    VNode::element("a")
                        .with_class("mfm-link")
                        .with_attr("href", url.clone())
                        .with_children(children),
                );
            }

            MarkupNode::Search { query } => {
                let href = format!(
                    "https://www.google.com/search?q={}",
                    query.replace(' ', "+")
                );
                out.push(
                    VNode::element("div")
                        .with_class("mfm-search")
                        .with_child(
                            VNode::element("span")
                                .with_class("mfm-search-query")
                                .with_child(VNode::text(query.clone())),
                        )
                        .with_child(
                            VNode::element("a")
                                .with_class("mfm-search-action")
                                .with_attr("href", href)
                                .with_child(VNode::text("Search")),
                        ),
                );
            }

            MarkupNode::Plain { children } => {
                // plain is forced for this subtree only; siblings keep the
                // ambient setting.
                let child_ctx = ctx.plain_subtree();
                let children = self.render_children(children, &child_ctx);
                out.push(VNode::element("span").with_children(children));
            }

            MarkupNode::Fn {
                name,
                args,
                children,
            } => {
                let rendered = self.render_children(children, ctx);
                let invocation = FunctionInvocation {
                    name,
                    args,
                    children,
                };
                match directive::compose(&invocation, &self.config, ctx, rendered.clone()) {
                    Some(node) => out.push(node),
                    None => {
                        // Unknown (or deliberately pass-through) directive:
                        // literal bracket syntax around the rendered
                        // children, never an error.
                        if rendered.is_empty() {
                            out.push(VNode::text(format!("$[{}]", name)));
                        } else {
                            out.push(VNode::text(format!("$[{} ", name)));
                            out.extend(rendered);
                            out.push(VNode::text("]"));
                        }
                    }
                }
            }
        }
    }

    fn render_text(&self, value: &str, ctx: &RenderContext, out: &mut Vec<VNode>) {
        let mut text = value.replace("\r\n", "\n").replace('\r', "\n");
        if ctx.cat_speech_active() {
            text = nyaize(&text);
        }

        if ctx.plain {
            out.push(VNode::text(text.replace('\n', " ")));
            return;
        }

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push(VNode::element("br"));
            }
            out.push(VNode::text(line.to_string()));
        }
    }

    fn render_emoji_code(
        &mut self,
        node: &MarkupNode,
        name: &str,
        ctx: &RenderContext,
        out: &mut Vec<VNode>,
    ) {
        if let Some(render) = self.config.overrides.emoji.clone() {
            out.push(render(node, ctx));
            return;
        }

        let url = match &self.resolver {
            Some(resolver) => resolver.resolve(
                name,
                Some(&ctx.emoji_map),
                ctx.ambient_emojis.as_deref(),
                ctx.host.as_deref(),
            ),
            None => ctx.emoji_map.get(name).cloned().or_else(|| {
                ctx.ambient_emojis
                    .as_ref()
                    .and_then(|map| map.get(name).cloned())
            }),
        };

        match url {
            Some(url) => out.push(
                VNode::element("img")
                    .with_class("mfm-custom-emoji")
                    .with_attr("src", url)
                    .with_attr("alt", format!(":{}:", name)),
            ),
            None => {
                // Stable fallback: the literal code. Queue for prefetch when
                // a remote lookup could still answer it.
                if ctx.host.is_some()
                    && !name.contains('@')
                    && !self.missing_emojis.iter().any(|n| n == name)
                {
                    self.missing_emojis.push(name.to_string());
                }
                out.push(VNode::text(format!(":{}:", name)));
            }
        }
    }

    fn render_url(&self, url: &str) -> VNode {
        let link = VNode::element("a")
            .with_class("mfm-url")
            .with_attr("href", url.to_string());

        // Highlight the host segment only when an authority component is
        // present; a bare string renders as an undifferentiated link.
        let Some(idx) = url.find("//") else {
            return link.with_child(VNode::text(url.to_string()));
        };

        let scheme = &url[..idx];
        let rest = &url[idx + 2..];
        let authority_end = rest
            .find(|c| matches!(c, '/' | '?' | '#'))
            .unwrap_or(rest.len());
        let (authority, remainder) = rest.split_at(authority_end);
        let (userinfo, host) = match authority.rfind('@') {
            Some(at) => (Some(&authority[..=at]), &authority[at + 1..]),
            None => (None, authority),
        };

        let mut link = link.with_child(VNode::text(format!("{}//", scheme)));
        if let Some(userinfo) = userinfo {
            link = link.with_child(VNode::text(userinfo.to_string()));
        }
        link = link.with_child(
            VNode::element("span")
                .with_class("mfm-url-host")
                .with_child(VNode::text(host.to_string())),
        );
        if !remainder.is_empty() {
            link = link.with_child(VNode::text(remainder.to_string()));
        }
        link
    }
}
