//! Function-directive composition.
//!
//! Interprets `$[name args... content]` invocations against a fixed dispatch
//! table. A directive composes to either a style/class bundle wrapping the
//! rendered children or a specialized sub-render (ruby, time, sparkle).
//! Unknown names compose to `None` and the caller renders the literal
//! bracket syntax, so markup from newer servers degrades instead of erroring.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use mfm_ast::{FnArgs, MarkupNode};

use crate::color;
use crate::config::RendererConfig;
use crate::context::RenderContext;
use crate::reltime::{self, format_relative};
use crate::vdom::VNode;

/// One directive invocation as seen by the composer.
pub struct FunctionInvocation<'a> {
    pub name: &'a str,
    pub args: &'a FnArgs,
    pub children: &'a [MarkupNode],
}

/// Duration arguments must look like `1s`, `0.5s`, `200ms`.
static VALID_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9.]+(ms|s)$").expect("valid regex"));

fn arg<'a>(args: &'a FnArgs, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_deref())
}

fn flag(args: &FnArgs, key: &str) -> bool {
    args.contains_key(key)
}

/// Numeric argument, parsed permissively: non-numeric is absent.
fn num(args: &FnArgs, key: &str) -> Option<f64> {
    arg(args, key).and_then(|v| v.parse::<f64>().ok()).filter(|v| v.is_finite())
}

fn duration(args: &FnArgs, key: &str, default: &str) -> String {
    match arg(args, key) {
        Some(v) if VALID_TIME.is_match(v) => v.to_string(),
        _ => default.to_string(),
    }
}

fn wrapper(name: &str, children: Vec<VNode>) -> VNode {
    VNode::element("span")
        .with_class(format!("mfm-{}", name))
        .with_children(children)
}

/// Style/class bundle for an animated directive: static properties always
/// apply, the animation only when the animation flag is on.
fn animated(
    cfg: &RendererConfig,
    name: &str,
    keyframes: &str,
    args: &FnArgs,
    default_speed: &str,
    statics: &[(&str, &str)],
    children: Vec<VNode>,
) -> VNode {
    let mut node = wrapper(name, children).with_style("display", "inline-block");
    for (prop, value) in statics {
        node = node.with_style(*prop, *value);
    }
    if cfg.animation {
        let speed = duration(args, "speed", default_speed);
        node = node.with_style(
            "animation",
            format!("{} {} linear infinite both", keyframes, speed),
        );
        if let Some(delay) = arg(args, "delay").filter(|v| VALID_TIME.is_match(v)) {
            node = node.with_style("animation-delay", delay.to_string());
        }
    }
    node
}

/// Static transform bundle (flip, rotate, position, scale).
fn transformed(name: &str, transform: String, children: Vec<VNode>) -> VNode {
    wrapper(name, children)
        .with_style("display", "inline-block")
        .with_style("transform", transform)
}

fn compose_ruby(args: &FnArgs, mut children: Vec<VNode>) -> VNode {
    // Single text child: base and furigana split on the first space, then
    // the first comma. Multiple children: the last one is the furigana.
    // Nothing to split: explicit `rt` argument or an empty furigana.
    enum Plan {
        SplitText(String, String),
        LastChild,
        Fallback,
    }

    let plan = match children.as_slice() {
        [VNode::Text { content }] => match content
            .split_once(' ')
            .or_else(|| content.split_once(','))
        {
            Some((base, rt)) => Plan::SplitText(base.to_string(), rt.to_string()),
            None => Plan::Fallback,
        },
        [] | [_] => Plan::Fallback,
        _ => Plan::LastChild,
    };

    let (base, furigana) = match plan {
        Plan::SplitText(base, rt) => (vec![VNode::text(base)], vec![VNode::text(rt)]),
        Plan::LastChild => {
            let rt = children.pop().expect("more than one child");
            (children, vec![rt])
        }
        Plan::Fallback => {
            let rt = arg(args, "rt").unwrap_or_default().to_string();
            (children, vec![VNode::text(rt)])
        }
    };

    VNode::element("ruby")
        .with_class("mfm-ruby")
        .with_children(base)
        .with_child(VNode::element("rt").with_children(furigana))
}

fn compose_unixtime(inv: &FunctionInvocation, children: Vec<VNode>) -> VNode {
    let raw = arg(inv.args, "time")
        .map(str::to_string)
        .unwrap_or_else(|| {
            children
                .iter()
                .map(|c| c.text_content())
                .collect::<String>()
        });

    // Invalid input falls back to "now".
    let time = reltime::parse_timestamp(raw.trim()).unwrap_or_else(Utc::now);

    VNode::element("time")
        .with_class("mfm-unixtime")
        .with_attr("datetime", time.to_rfc3339())
        .with_child(VNode::text(format_relative(time, Utc::now())))
}

/// Compose one directive. `None` = the name is not in the table and the
/// caller renders the literal `$[...]` syntax.
pub fn compose(
    inv: &FunctionInvocation,
    cfg: &RendererConfig,
    _ctx: &RenderContext,
    children: Vec<VNode>,
) -> Option<VNode> {
    let args = inv.args;
    trace!(directive = inv.name, "composing directive");

    let node = match inv.name {
        // -- structural specializations ----------------------------------
        "ruby" => compose_ruby(args, children),
        "unixtime" => compose_unixtime(inv, children),
        "sparkle" => {
            // The host binds a SparkleAnimator to this class; inert when
            // advanced effects or animation are off.
            if cfg.advanced && cfg.animation {
                wrapper("sparkle", children)
            } else {
                VNode::element("span").with_children(children)
            }
        }
        // Deliberately unimplemented: renders as the literal bracket
        // syntax, exactly like an unknown directive.
        "clickable" => return None,

        // -- animated style bundles --------------------------------------
        "tada" => animated(
            cfg,
            "tada",
            "mfm-tada",
            args,
            "1s",
            &[("font-size", "150%")],
            children,
        ),
        "jelly" => animated(cfg, "jelly", "mfm-rubberBand", args, "1s", &[], children),
        "twitch" => animated(cfg, "twitch", "mfm-twitch", args, "0.5s", &[], children),
        "shake" => animated(cfg, "shake", "mfm-shake", args, "0.5s", &[], children),
        "spin" => {
            let keyframes = if flag(args, "x") {
                "mfm-spinX"
            } else if flag(args, "y") {
                "mfm-spinY"
            } else {
                "mfm-spin"
            };
            let mut node = animated(cfg, "spin", keyframes, args, "1.5s", &[], children);
            if cfg.animation {
                if flag(args, "left") {
                    node = node.with_style("animation-direction", "reverse");
                } else if flag(args, "alternate") {
                    node = node.with_style("animation-direction", "alternate");
                }
            }
            node
        }
        "jump" => animated(cfg, "jump", "mfm-jump", args, "0.75s", &[], children),
        "bounce" => animated(
            cfg,
            "bounce",
            "mfm-bounce",
            args,
            "0.75s",
            &[("transform-origin", "center bottom")],
            children,
        ),
        "rainbow" => animated(cfg, "rainbow", "mfm-rainbow", args, "1s", &[], children),

        // -- static transforms and styles --------------------------------
        "flip" => {
            let transform = if flag(args, "h") && flag(args, "v") {
                "scale(-1, -1)"
            } else if flag(args, "v") {
                "scaleY(-1)"
            } else {
                "scaleX(-1)"
            };
            transformed("flip", transform.to_string(), children)
        }
        "x2" => wrapper("x2", children),
        "x3" => wrapper("x3", children),
        "x4" => wrapper("x4", children),
        "font" => {
            let family = ["serif", "monospace", "cursive", "fantasy"]
                .iter()
                .copied()
                .find(|f| flag(args, f));
            let mut node = wrapper("font", children);
            if let Some(family) = family {
                node = node.with_style("font-family", family);
            }
            node
        }
        "blur" => wrapper("blur", children),
        "rotate" => {
            let deg = num(args, "deg").unwrap_or(90.0);
            transformed("rotate", format!("rotate({}deg)", deg), children)
                .with_style("transform-origin", "center center")
        }
        "position" => {
            if !cfg.advanced {
                return Some(VNode::element("span").with_children(children));
            }
            let x = num(args, "x").unwrap_or(0.0);
            let y = num(args, "y").unwrap_or(0.0);
            transformed("position", format!("translate({}em, {}em)", x, y), children)
        }
        "scale" => {
            if !cfg.advanced {
                return Some(VNode::element("span").with_children(children));
            }
            let x = num(args, "x").unwrap_or(1.0).clamp(-5.0, 5.0);
            let y = num(args, "y").unwrap_or(1.0).clamp(-5.0, 5.0);
            transformed("scale", format!("scale({}, {})", x, y), children)
        }
        "fg" => {
            let color = arg(args, "color")
                .and_then(color::validate_short_code)
                .unwrap_or_else(|| "#f00".to_string());
            wrapper("fg", children).with_style("color", color)
        }
        "bg" => {
            let color = arg(args, "color")
                .and_then(color::validate_short_code)
                .unwrap_or_else(|| "#f00".to_string());
            wrapper("bg", children).with_style("background-color", color)
        }
        "border" => {
            let width = num(args, "width").unwrap_or(1.0);
            let style = arg(args, "style").unwrap_or("solid");
            let color = arg(args, "color")
                .and_then(color::validate_short_code)
                .unwrap_or_else(|| "var(--accent)".to_string());
            let mut node = wrapper("border", children)
                .with_style("display", "inline-block")
                .with_style("border", format!("{}px {} {}", width, style, color));
            if let Some(radius) = num(args, "radius") {
                node = node.with_style("border-radius", format!("{}px", radius));
            }
            if !flag(args, "noclip") {
                node = node.with_style("overflow", "clip");
            }
            node
        }

        _ => return None,
    };

    Some(node)
}
