//! Common types used across CLI modules

use tundra_core::domain::repo::RepoId;

/// Namespace used when a repo is given without one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Repo reference as typed on the command line
///
/// Either `name`, resolved against the `--namespace` flag, or a fully
/// qualified `namespace/name` that ignores the flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRef {
    Qualified(RepoId),
    Name(String),
}

impl RepoRef {
    pub fn parse(input: &str) -> Self {
        match input.split_once('/') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                RepoRef::Qualified(RepoId::new(namespace, name))
            }
            _ => RepoRef::Name(input.to_string()),
        }
    }

    /// Resolve into a store identity
    pub fn resolve(self, namespace: &str) -> RepoId {
        match self {
            RepoRef::Qualified(id) => id,
            RepoRef::Name(name) => RepoId::new(namespace, name),
        }
    }
}

impl From<&str> for RepoRef {
    fn from(s: &str) -> Self {
        RepoRef::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_uses_namespace_flag() {
        let id = RepoRef::parse("web").resolve("apps");
        assert_eq!(id, RepoId::new("apps", "web"));
    }

    #[test]
    fn test_qualified_name_ignores_flag() {
        let id = RepoRef::from("staging/web").resolve(DEFAULT_NAMESPACE);
        assert_eq!(id, RepoId::new("staging", "web"));
    }

    #[test]
    fn test_degenerate_slash_is_a_name() {
        assert_eq!(RepoRef::parse("/web"), RepoRef::Name("/web".to_string()));
    }
}
