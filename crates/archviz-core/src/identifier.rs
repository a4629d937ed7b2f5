//! Interned identifiers for nodes and clusters.
//!
//! Every node and cluster in a diagram is addressed by an [`Id`]. Edges refer
//! to their endpoints by `Id`, so comparisons and hashing happen on the
//! interned symbol rather than on the string itself.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner shared by all diagrams in the process.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Identifier of a node or cluster.
///
/// # Examples
///
/// ```
/// use archviz_core::identifier::Id;
///
/// let api = Id::new("api_gateway");
/// assert_eq!(api, "api_gateway");
/// assert_eq!(api, Id::new("api_gateway"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns the identifier text as an owned string.
    pub fn as_string(&self) -> String {
        self.with_str(str::to_owned)
    }

    /// Runs `f` against the identifier text without allocating.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let interner = interner();
        let text = interner
            .resolve(self.0)
            .expect("symbols are only created by the global interner");
        f(text)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.as_string();
        f.write_str(&text)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<String> for Id {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|text| text == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
