//! Route path patterns shared by the maintenance allow-list and the
//! authorization table.

/// A path pattern matched against the raw request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePattern {
    /// The path must equal the pattern.
    Exact(&'static str),
    /// The path equals the pattern or lies below it on a `/` boundary:
    /// `Subtree("/api/auth")` matches `/api/auth/login` but not `/api/authority`.
    Subtree(&'static str),
}

impl RoutePattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(p) => path == *p,
            RoutePattern::Subtree(p) => match path.strip_prefix(p) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}
