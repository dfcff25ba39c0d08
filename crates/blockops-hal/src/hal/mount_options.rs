//! Mount option handling.

/// Mount options and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOptions {
    /// Additional mount options as a comma-separated string (e.g., "ro,noexec")
    pub options: Option<String>,
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: impl Into<String>) -> Self {
        Self {
            options: Some(options.into()),
        }
    }

    /// Join individual flags with commas. An empty list yields the plain form.
    pub fn from_flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = flags
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        Self::with_options(joined)
    }

    /// The `-o` argument, if any. An empty string counts as no options.
    pub fn as_arg(&self) -> Option<&str> {
        self.options.as_deref().filter(|o| !o.is_empty())
    }
}

impl From<&str> for MountOptions {
    fn from(options: &str) -> Self {
        Self::with_options(options)
    }
}
