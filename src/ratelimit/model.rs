//! Model key normalization.

/// Variant suffixes stripped before limit lookup, in priority order.
pub const DEFAULT_SUFFIXES: &[&str] = &["-non-thinking", "-search", "-image"];

/// A canonical model key used for limit lookup.
///
/// Raw keys may carry variant suffixes (`-search`, `-image`, ...) that share
/// the quota of the base model. At most one suffix is stripped; suffixes are
/// tried most-specific first so that a key is never matched against a rule
/// that would not apply on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey(String);

impl ModelKey {
    /// Canonicalize `raw` against the given suffix list.
    ///
    /// `suffixes` must already be in priority order. A key consisting of
    /// nothing but a suffix is left as-is.
    pub fn canonical<S: AsRef<str>>(raw: &str, suffixes: &[S]) -> Self {
        for suffix in suffixes {
            let suffix = suffix.as_ref();
            if suffix.is_empty() {
                continue;
            }
            if let Some(base) = raw.strip_suffix(suffix) {
                if !base.is_empty() {
                    return Self(base.to_string());
                }
            }
        }
        Self(raw.to_string())
    }

    /// Canonicalize `raw` using [`DEFAULT_SUFFIXES`].
    pub fn from_raw(raw: &str) -> Self {
        Self::canonical(raw, DEFAULT_SUFFIXES)
    }

    /// The canonical key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort suffixes so that longer (more specific) ones are tried first.
///
/// The sort is stable, so suffixes of equal length keep their configured order.
pub fn order_suffixes(mut suffixes: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    suffixes.retain(|s| !s.is_empty() && seen.insert(s.clone()));
    suffixes.sort_by(|a, b| b.len().cmp(&a.len()));
    suffixes
}
