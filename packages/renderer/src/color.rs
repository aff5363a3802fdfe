//! Short color-code parsing for directive arguments.
//!
//! Accepts 3-, 4-, 6-, and 8-digit hex codes, case-insensitive. 4-digit
//! codes are RGBA shorthand: each color nibble expands by ×17 and the fourth
//! nibble becomes alpha over 15. Anything else is a miss, never an error.

/// Parsed color channels. Constructed only by [`parse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

pub fn parse(input: &str) -> Option<ParsedColor> {
    if !input.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |i: usize| -> u8 {
        // Safe: length and hex-digit checks precede every call.
        u8::from_str_radix(&input[i..i + 1], 16).unwrap_or(0)
    };
    let byte = |i: usize| -> u8 { u8::from_str_radix(&input[i..i + 2], 16).unwrap_or(0) };

    match input.len() {
        3 => Some(ParsedColor {
            r: nibble(0) * 16 + nibble(0),
            g: nibble(1) * 16 + nibble(1),
            b: nibble(2) * 16 + nibble(2),
            a: 1.0,
        }),
        4 => Some(ParsedColor {
            r: nibble(0) * 17,
            g: nibble(1) * 17,
            b: nibble(2) * 17,
            a: f64::from(nibble(3)) / 15.0,
        }),
        6 => Some(ParsedColor {
            r: byte(0),
            g: byte(2),
            b: byte(4),
            a: 1.0,
        }),
        8 => Some(ParsedColor {
            r: byte(0),
            g: byte(2),
            b: byte(4),
            a: f64::from(byte(6)) / 255.0,
        }),
        _ => None,
    }
}

/// CSS display form: `#rrggbb` for opaque colors, `rgba(...)` otherwise.
/// Alpha is emitted at full f64 display precision, no rounding.
pub fn to_display(color: &ParsedColor) -> String {
    if color.a == 1.0 {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        format!(
            "rgba({}, {}, {}, {})",
            color.r, color.g, color.b, color.a
        )
    }
}

/// Directive-facing convenience. 3- and 6-digit codes pass through with a
/// `#` prefix, case preserved; 4-digit codes go through the RGBA shorthand
/// expansion (always emitted as `rgba(...)`, even at alpha 1); everything
/// else is `None`.
pub fn validate_short_code(input: &str) -> Option<String> {
    if !input.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match input.len() {
        3 | 6 => Some(format!("#{}", input)),
        4 => {
            let color = parse(input)?;
            Some(format!(
                "rgba({}, {}, {}, {})",
                color.r, color.g, color.b, color.a
            ))
        }
        _ => None,
    }
}
