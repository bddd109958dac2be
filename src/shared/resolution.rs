/// Outcome of one strategy in an ordered fallback chain.
///
/// `NotFound` moves on quietly; `Failed` moves on after the caller logs the
/// reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Found(T),
    NotFound,
    Failed(String),
}

impl<T> Resolution<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::Failed(_) => None,
        }
    }

    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::NotFound,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<Option<T>, E>> for Resolution<T> {
    fn from(result: Result<Option<T>, E>) -> Self {
        match result {
            Ok(value) => Self::from_option(value),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}
