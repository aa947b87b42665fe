//! Structured cache keys.

use std::collections::BTreeMap;
use std::fmt;
use todosync_core::todo::TodoListParams;

/// One component of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    Name(String),
    Id(String),
    Params(BTreeMap<String, String>),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Name(name) => f.write_str(name),
            KeySegment::Id(id) => write!(f, "#{id}"),
            KeySegment::Params(params) => {
                let joined = params
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&");
                write!(f, "{{{joined}}}")
            }
        }
    }
}

/// Ordered tuple identifying a cached query.
///
/// Keys form a hierarchy: a key matches every key it is a prefix of, which
/// is how invalidation reaches a whole family at once. The empty key is the
/// root and matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    /// The empty key.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.push(KeySegment::Name(name.into()));
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.0.push(KeySegment::Id(id.into()));
        self
    }

    pub fn params<K, V, I>(mut self, params: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.0.push(KeySegment::Params(params));
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True if `prefix` is a leading sub-tuple of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/");
        write!(f, "[{joined}]")
    }
}

/// Keys of the todo queries.
pub mod todo_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root().name("todos")
    }

    pub fn lists() -> QueryKey {
        all().name("list")
    }

    pub fn list(params: &TodoListParams) -> QueryKey {
        lists().params([
            ("page", params.page.to_string()),
            ("page_size", params.page_size.to_string()),
            ("sort_by", params.sort_by.clone()),
            ("sort_order", params.sort_order.as_str().to_string()),
        ])
    }

    pub fn details() -> QueryKey {
        all().name("detail")
    }

    pub fn detail(id: &str) -> QueryKey {
        details().id(id)
    }
}

/// Keys of the user queries.
pub mod auth_keys {
    use super::*;

    pub fn user() -> QueryKey {
        QueryKey::root().name("user")
    }

    pub fn profile() -> QueryKey {
        user().name("profile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_hierarchy() {
        let params = TodoListParams::default();
        let list = todo_keys::list(&params);

        assert!(list.starts_with(&todo_keys::lists()));
        assert!(list.starts_with(&todo_keys::all()));
        assert!(list.starts_with(&QueryKey::root()));
        assert!(!list.starts_with(&todo_keys::details()));
        assert!(!todo_keys::lists().starts_with(&list));
        assert!(todo_keys::detail("t-1").starts_with(&todo_keys::details()));
        assert!(!auth_keys::profile().starts_with(&todo_keys::all()));
    }

    #[test]
    fn test_list_keys_compare_structurally() {
        let a = todo_keys::list(&TodoListParams::default());
        let b = todo_keys::list(&TodoListParams::default());
        let c = todo_keys::list(&TodoListParams {
            page: 2,
            ..Default::default()
        });

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            a.to_string(),
            "[todos/list/{page=1&page_size=20&sort_by=created_at&sort_order=desc}]"
        );
    }

    #[test]
    fn test_id_segment_differs_from_name() {
        assert_ne!(
            QueryKey::root().name("x").id("1"),
            QueryKey::root().name("x").name("1")
        );
    }
}
