use thiserror::Error;

/// Internal failures of the emoji cache and remote lookup.
///
/// None of these cross the rendering boundary: callers of the resolver see
/// misses, not errors. The variants exist so the fetch/store internals can
/// use `?` and log a precise cause at the boundary.
#[derive(Error, Debug)]
pub enum EmojiError {
    #[error("emoji cache database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("emoji lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected emoji lookup payload: {0}")]
    Payload(String),
}

pub type EmojiResult<T> = Result<T, EmojiError>;
