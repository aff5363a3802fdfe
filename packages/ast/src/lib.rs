pub mod ast;

pub use ast::{collect_emoji_codes, FnArgs, MarkupNode};
