use crate::pattern::RoutePattern;

/// Routes that stay reachable for everyone while maintenance is on.
pub const MAINTENANCE_ALLOW_LIST: &[RoutePattern] = &[
    RoutePattern::Exact("/health"),
    RoutePattern::Subtree("/api/auth"),
    RoutePattern::Exact("/api/maintenance/status"),
    RoutePattern::Exact("/api/maintenance/disable"),
    RoutePattern::Exact("/api/contact"),
    RoutePattern::Subtree("/api/public"),
];

/// Fixed list of route patterns exempt from the maintenance block.
#[derive(Debug, Clone)]
pub struct AllowList {
    patterns: Vec<RoutePattern>,
}

impl AllowList {
    pub fn new(patterns: impl Into<Vec<RoutePattern>>) -> Self {
        Self {
            patterns: patterns.into(),
        }
    }

    pub fn permits(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(MAINTENANCE_ALLOW_LIST)
    }
}
