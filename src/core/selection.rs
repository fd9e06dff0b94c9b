use serde::Serialize;

/// Expression telling the transformation engine which artifacts to act on.
///
/// Either the wildcard `*` ("all") or a comma-joined ordered sequence of
/// artifact names. Never the empty string: an empty name list maps to the
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection(String);

pub const WILDCARD: &str = "*";

impl Selection {
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    /// Build a selection from discovered artifact names, preserving order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        if names.is_empty() {
            return Self::wildcard();
        }
        Self(
            names
                .iter()
                .map(|n| n.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// A single explicit artifact name.
    pub fn single(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_wildcard() {
        let sel = Selection::from_names::<&str>(&[]);
        assert_eq!(sel.as_str(), "*");
        assert!(sel.is_wildcard());
    }

    #[test]
    fn names_join_in_input_order() {
        let sel = Selection::from_names(&["a", "b", "c"]);
        assert_eq!(sel.as_str(), "a, b, c");
        assert!(!sel.is_wildcard());
    }

    #[test]
    fn order_is_not_sorted() {
        let sel = Selection::from_names(&["orders", "users"]);
        assert_eq!(sel.as_str(), "orders, users");
    }

    #[test]
    fn single_name() {
        assert_eq!(Selection::single("test.csv").as_str(), "test.csv");
    }
}
