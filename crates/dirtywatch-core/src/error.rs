use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackError>;

/// Failures reported by trackers, wrappers, and field accessors.
///
/// Absent-key and absent-element removals are not errors; they report
/// `None`/`false` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("{wrapper} requires an owner callback")]
    MissingCallback { wrapper: &'static str },

    #[error("{wrapper} requires a backing container")]
    MissingContainer { wrapper: &'static str },

    #[error("duplicate key: {key}")]
    DuplicateKey { key: String },

    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl TrackError {
    #[must_use]
    pub fn duplicate_key(key: &impl std::fmt::Debug) -> Self {
        Self::DuplicateKey {
            key: format!("{key:?}"),
        }
    }

    #[must_use]
    pub fn key_not_found(key: &impl std::fmt::Debug) -> Self {
        Self::KeyNotFound {
            key: format!("{key:?}"),
        }
    }

    #[must_use]
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }
}
