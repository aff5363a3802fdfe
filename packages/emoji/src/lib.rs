pub mod error;
pub mod fetch;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod tests_resolver;

pub use error::{EmojiError, EmojiResult};
pub use fetch::{EmojiFetcher, HttpEmojiFetcher, RemoteEmoji};
pub use resolver::EmojiResolver;
pub use store::{EmojiSnapshot, EmojiStore, EmojiSubscription};
