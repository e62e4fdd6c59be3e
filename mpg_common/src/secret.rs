use std::{
    env,
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper that keeps credentials out of logs: both `Debug` and `Display` render as `****`.
/// Call [`Secret::reveal`] at the single point where the value is put on the wire.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// Reads the secret from the named environment variable, defaulting to empty when unset.
    pub fn from_env(var: &str) -> Self {
        Self::new(env::var(var).unwrap_or_default())
    }

    /// True when a non-blank value has been provided.
    pub fn is_set(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
