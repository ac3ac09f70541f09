//! Repo handles and name derivation.

use smol_str::SmolStr;

/// A logical database target.
///
/// Repos are identified by a dotted name such as `MyApp.Repo`. The repo
/// governs the on-disk snapshot subdirectory and the emitted migration
/// module name, both derived from the underscored last segment of the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repo {
    /// Dotted repo name.
    pub name: SmolStr,
    /// Database extensions installed for this repo.
    pub installed_extensions: Vec<SmolStr>,
}

impl Repo {
    /// Create a new repo handle.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            installed_extensions: Vec::new(),
        }
    }

    /// Record an installed database extension.
    pub fn with_extension(mut self, name: impl Into<SmolStr>) -> Self {
        self.installed_extensions.push(name.into());
        self
    }

    /// Check whether an extension is installed.
    pub fn has_extension(&self, name: &str) -> bool {
        self.installed_extensions.iter().any(|e| e == name)
    }

    /// The last segment of the dotted name.
    pub fn last_segment(&self) -> &str {
        last_segment(&self.name)
    }

    /// The underscored last segment, used for path layout.
    pub fn underscored(&self) -> String {
        underscore(self.last_segment())
    }
}

/// The last segment of a dotted module-style name.
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Convert a CamelCase name to snake_case.
///
/// Runs of uppercase letters are kept together, so `APIRepo` becomes
/// `api_repo` rather than `a_p_i_repo`.
pub fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let follows_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let starts_word = i > 0
                && chars[i - 1].is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase());
            if follows_lower || starts_word {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
