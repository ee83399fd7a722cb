use std::collections::BTreeSet;

/// Base-layer packages dropped from generated manifests.
pub const DEFAULT_IGNORED_PACKAGES: &[&str] = &[
    "_libgcc_mutex",
    "_openmp_mutex",
    "bzip2",
    "ca-certificates",
    "ld_impl_linux-64",
    "libffi",
    "libgcc-ng",
    "libgomp",
    "libstdcxx-ng",
    "libuuid",
    "ncurses",
    "openssl",
    "readline",
    "sqlite",
    "tk",
    "tzdata",
    "xz",
    "zlib",
    "certifi",
    "setuptools",
    "pip",
    "wheel",
    "six",
    "zipp",
];

/// Set of package names considered implementation detail.
///
/// Members never appear in a fallback manifest, and their presence in a
/// history export marks that history as polluted. Names are stored
/// lower-cased and matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::from_names(DEFAULT_IGNORED_PACKAGES.iter().copied())
    }
}

impl IgnoreSet {
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        set.extend(names);
        set
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names.extend(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_ascii_lowercase())
                .filter(|n| !n.is_empty()),
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contains_base_packages() {
        let set = IgnoreSet::default();
        assert!(set.contains("six"));
        assert!(set.contains("openssl"));
        assert!(set.contains("pip"));
        assert!(!set.contains("numpy"));
        assert_eq!(set.len(), DEFAULT_IGNORED_PACKAGES.len());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let set = IgnoreSet::from_names(["OpenSSL"]);
        assert!(set.contains("openssl"));
        assert!(set.contains(" OPENSSL "));
    }

    #[test]
    fn test_extend_skips_blank_names() {
        let mut set = IgnoreSet::empty();
        set.extend(["anaconda", "", "  ", "conda"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["anaconda", "conda"]);
    }
}
