//! Node-rule tests for the recursive interpreter.

use std::collections::HashMap;
use std::sync::Arc;

use mfm_ast::{FnArgs, MarkupNode};

use crate::config::{RenderOverrides, RendererConfig};
use crate::context::{CatSpeech, RenderContext};
use crate::renderer::Renderer;
use crate::vdom::VNode;

fn render(nodes: &[MarkupNode], ctx: &RenderContext) -> Vec<VNode> {
    Renderer::new(RendererConfig::default()).render(nodes, ctx)
}

fn text(value: &str) -> MarkupNode {
    MarkupNode::text(value)
}

#[test]
fn test_text_splits_lines_with_breaks_between() {
    let out = render(&[text("a\nb\nc")], &RenderContext::new());

    // Break between every pair, none leading or trailing.
    let tags: Vec<Option<&str>> = out.iter().map(|n| n.tag()).collect();
    assert_eq!(tags, vec![None, Some("br"), None, Some("br"), None]);
    assert_eq!(out[0].text_content(), "a");
    assert_eq!(out[4].text_content(), "c");
}

#[test]
fn test_text_normalizes_crlf_and_cr() {
    let out = render(&[text("a\r\nb\rc")], &RenderContext::new());
    let breaks = out.iter().filter(|n| n.tag() == Some("br")).count();
    assert_eq!(breaks, 2);
}

#[test]
fn test_plain_mode_collapses_newlines_to_spaces() {
    let mut ctx = RenderContext::new();
    ctx.plain = true;
    let out = render(&[text("a\nb")], &ctx);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].text_content(), "a b");
}

#[test]
fn test_plain_node_forces_plain_for_its_subtree_only() {
    let nodes = vec![
        MarkupNode::Plain {
            children: vec![text("x\ny")],
        },
        text("a\nb"),
    ];
    let out = render(&nodes, &RenderContext::new());

    // Inside Plain: one collapsed run.
    assert_eq!(out[0].text_content(), "x y");
    // Sibling is back to ambient: split with a break.
    assert!(out.iter().skip(1).any(|n| n.tag() == Some("br")));
}

#[test]
fn test_cat_speech_transforms_text() {
    let mut ctx = RenderContext::new();
    ctx.cat_speech = CatSpeech::On;
    let out = render(&[text("banana")], &ctx);
    assert_eq!(out[0].text_content(), "banyanya");
}

#[test]
fn test_quote_block_and_inline() {
    let out = render(
        &[MarkupNode::Quote {
            children: vec![text("q")],
            nowrap: false,
        }],
        &RenderContext::new(),
    );
    assert_eq!(out[0].tag(), Some("blockquote"));

    let out = render(
        &[MarkupNode::Quote {
            children: vec![text("q")],
            nowrap: true,
        }],
        &RenderContext::new(),
    );
    assert_eq!(out[0].tag(), Some("span"));
    assert!(out[0].has_class("mfm-quote"));
}

#[test]
fn test_url_with_authority_highlights_host() {
    let out = render(
        &[MarkupNode::Url {
            url: "https://user@misskey.example/notes/1?x=1".to_string(),
        }],
        &RenderContext::new(),
    );

    let link = &out[0];
    assert_eq!(link.tag(), Some("a"));
    assert_eq!(link.attr("href"), Some("https://user@misskey.example/notes/1?x=1"));

    let children = link.children();
    assert_eq!(children[0].text_content(), "https://");
    assert_eq!(children[1].text_content(), "user@");
    assert!(children[2].has_class("mfm-url-host"));
    assert_eq!(children[2].text_content(), "misskey.example");
    assert_eq!(children[3].text_content(), "/notes/1?x=1");
}

#[test]
fn test_url_without_authority_is_undifferentiated() {
    let out = render(
        &[MarkupNode::Url {
            url: "mailto:someone@example.com".to_string(),
        }],
        &RenderContext::new(),
    );

    let link = &out[0];
    assert_eq!(link.children().len(), 1);
    assert_eq!(link.text_content(), "mailto:someone@example.com");
}

#[test]
fn test_unknown_directive_renders_literal_syntax() {
    let nodes = vec![MarkupNode::Fn {
        name: "spooky".to_string(),
        args: FnArgs::new(),
        children: vec![text("text")],
    }];
    let out = render(&nodes, &RenderContext::new());

    let flat: String = out.iter().map(|n| n.text_content()).collect();
    assert_eq!(flat, "$[spooky text]");
    // Distinguishable from a recognized directive: no styled wrapper.
    assert!(out.iter().all(|n| !n.has_class("mfm-spooky")));
}

#[test]
fn test_childless_unknown_directive_has_no_trailing_space() {
    let nodes = vec![MarkupNode::Fn {
        name: "spooky".to_string(),
        args: FnArgs::new(),
        children: vec![],
    }];
    let out = render(&nodes, &RenderContext::new());

    let flat: String = out.iter().map(|n| n.text_content()).collect();
    assert_eq!(flat, "$[spooky]");
}

#[test]
fn test_emoji_explicit_map_hit_renders_image() {
    let mut ctx = RenderContext::new();
    ctx.emoji_map =
        HashMap::from([("blob".to_string(), "https://x/blob.png".to_string())]);
    let out = render(&[MarkupNode::emoji_code("blob")], &ctx);

    assert_eq!(out[0].tag(), Some("img"));
    assert_eq!(out[0].attr("src"), Some("https://x/blob.png"));
    assert_eq!(out[0].attr("alt"), Some(":blob:"));
}

#[test]
fn test_emoji_ambient_map_consulted_after_explicit() {
    let mut ctx = RenderContext::new();
    ctx.ambient_emojis = Some(Arc::new(HashMap::from([(
        "blob".to_string(),
        "https://ambient/blob.png".to_string(),
    )])));
    let out = render(&[MarkupNode::emoji_code("blob")], &ctx);
    assert_eq!(out[0].attr("src"), Some("https://ambient/blob.png"));

    ctx.emoji_map =
        HashMap::from([("blob".to_string(), "https://explicit/blob.png".to_string())]);
    let out = render(&[MarkupNode::emoji_code("blob")], &ctx);
    assert_eq!(out[0].attr("src"), Some("https://explicit/blob.png"));
}

#[test]
fn test_emoji_miss_renders_literal_and_queues_prefetch() {
    let ctx = RenderContext::new().with_host("misskey.example");
    let mut renderer = Renderer::new(RendererConfig::default());

    let out = renderer.render(
        &[
            MarkupNode::emoji_code("missing"),
            MarkupNode::emoji_code("missing"),
            MarkupNode::emoji_code("remote@elsewhere"),
        ],
        &ctx,
    );

    assert_eq!(out[0].text_content(), ":missing:");
    // Deduplicated; remote-qualified names are not prefetchable.
    assert_eq!(renderer.take_missing_emojis(), vec!["missing"]);
    assert!(renderer.take_missing_emojis().is_empty());
}

#[test]
fn test_emoji_miss_without_host_queues_nothing() {
    let mut renderer = Renderer::new(RendererConfig::default());
    renderer.render(&[MarkupNode::emoji_code("missing")], &RenderContext::new());
    assert!(renderer.take_missing_emojis().is_empty());
}

#[test]
fn test_override_renderer_replaces_builtin() {
    let cfg = RendererConfig {
        overrides: RenderOverrides {
            emoji: Some(Arc::new(|node, _ctx| {
                let name = match node {
                    MarkupNode::EmojiCode { name } => name.clone(),
                    _ => String::new(),
                };
                VNode::element("span")
                    .with_class("custom-emoji-override")
                    .with_child(VNode::text(name))
            })),
            ..Default::default()
        },
        ..Default::default()
    };

    let mut ctx = RenderContext::new();
    ctx.emoji_map = HashMap::from([("blob".to_string(), "https://x/b.png".to_string())]);

    let out = Renderer::new(cfg).render(&[MarkupNode::emoji_code("blob")], &ctx);
    assert!(out[0].has_class("custom-emoji-override"));
    assert_eq!(out[0].text_content(), "blob");
}

#[test]
fn test_mention_and_hashtag_links() {
    let out = render(
        &[
            MarkupNode::Mention {
                username: "alice".to_string(),
                host: Some("misskey.example".to_string()),
                acct: "@alice@misskey.example".to_string(),
            },
            MarkupNode::Hashtag {
                hashtag: "rust".to_string(),
            },
        ],
        &RenderContext::new(),
    );

    assert_eq!(out[0].attr("href"), Some("/@alice@misskey.example"));
    assert_eq!(out[0].text_content(), "@alice@misskey.example");
    assert_eq!(out[1].attr("href"), Some("/tags/rust"));
    assert_eq!(out[1].text_content(), "#rust");
}

#[test]
fn test_every_variant_has_a_handler() {
    // One node of every variant; rendering must not panic and must emit
    // something for each.
    let nodes = vec![
        text("t"),
        MarkupNode::UnicodeEmoji {
            value: "🍣".to_string(),
        },
        MarkupNode::emoji_code("e"),
        MarkupNode::Bold { children: vec![] },
        MarkupNode::Italic { children: vec![] },
        MarkupNode::Strike { children: vec![] },
        MarkupNode::Small { children: vec![] },
        MarkupNode::InlineCode {
            code: "x".to_string(),
        },
        MarkupNode::BlockCode {
            code: "x".to_string(),
            lang: Some("rs".to_string()),
        },
        MarkupNode::MathInline {
            formula: "x^2".to_string(),
        },
        MarkupNode::MathBlock {
            formula: "x^2".to_string(),
        },
        MarkupNode::Quote {
            children: vec![],
            nowrap: false,
        },
        MarkupNode::Center { children: vec![] },
        MarkupNode::Mention {
            username: "u".to_string(),
            host: None,
            acct: "@u".to_string(),
        },
        MarkupNode::Hashtag {
            hashtag: "h".to_string(),
        },
        MarkupNode::Url {
            url: "https://x/".to_string(),
        },
        MarkupNode::Link {
            url: "https://x/".to_string(),
            children: vec![],
        },
        MarkupNode::Search {
            query: "q".to_string(),
        },
        MarkupNode::Plain { children: vec![] },
        MarkupNode::Fn {
            name: "bounce".to_string(),
            args: FnArgs::new(),
            children: vec![],
        },
    ];

    let out = render(&nodes, &RenderContext::new());
    assert_eq!(out.len(), nodes.len());
}
