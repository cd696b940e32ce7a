//! Event-name filtering.

use serde::{Deserialize, Serialize};

/// Include and exclude lists of event names.
///
/// Entries ending in `*` match by prefix, so `"egress_*"` covers every
/// egress event and `"*"` covers everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// When non-empty, only these events are delivered.
    pub include_events: Vec<String>,
    /// These events are never delivered.
    pub exclude_events: Vec<String>,
}

impl FilterParams {
    /// Creates params that allow every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers only the given events.
    pub fn include(mut self, events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include_events = events.into_iter().map(Into::into).collect();
        self
    }

    /// Never delivers the given events.
    pub fn exclude(mut self, events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_events = events.into_iter().map(Into::into).collect();
        self
    }
}

/// Decides whether an event is eligible for delivery.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl EventFilter {
    /// Builds a filter from params.
    pub fn new(params: &FilterParams) -> Self {
        Self {
            include: params.include_events.iter().map(|p| Pattern::parse(p)).collect(),
            exclude: params.exclude_events.iter().map(|p| Pattern::parse(p)).collect(),
        }
    }

    /// Checks if an event name passes the filter.
    ///
    /// Excludes win over includes; a non-empty include list denies
    /// everything it does not name.
    pub fn is_allowed(&self, event: &str) -> bool {
        if self.exclude.iter().any(|p| p.matches(event)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| p.matches(event))
    }
}

#[derive(Debug, Clone)]
enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => Pattern::Prefix(prefix.to_string()),
            None => Pattern::Exact(pattern.to_string()),
        }
    }

    fn matches(&self, event: &str) -> bool {
        match self {
            Pattern::Exact(name) => name == event,
            Pattern::Prefix(prefix) => event.starts_with(prefix.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_everything() {
        let filter = EventFilter::default();
        assert!(filter.is_allowed("room_started"));
        assert!(filter.is_allowed("anything"));
    }

    #[test]
    fn test_include_list() {
        let filter =
            EventFilter::new(&FilterParams::new().include(["room_started", "room_finished"]));
        assert!(filter.is_allowed("room_started"));
        assert!(filter.is_allowed("room_finished"));
        assert!(!filter.is_allowed("participant_joined"));
    }

    #[test]
    fn test_exclude_list() {
        let filter = EventFilter::new(&FilterParams::new().exclude(["track_published"]));
        assert!(!filter.is_allowed("track_published"));
        assert!(filter.is_allowed("track_unpublished"));
        assert!(filter.is_allowed("room_started"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = EventFilter::new(
            &FilterParams::new()
                .include(["egress_*"])
                .exclude(["egress_updated"]),
        );
        assert!(filter.is_allowed("egress_started"));
        assert!(filter.is_allowed("egress_ended"));
        assert!(!filter.is_allowed("egress_updated"));
        assert!(!filter.is_allowed("ingress_started"));
    }

    #[test]
    fn test_wildcard() {
        let filter = EventFilter::new(&FilterParams::new().include(["*"]));
        assert!(filter.is_allowed("room_started"));

        let filter = EventFilter::new(&FilterParams::new().exclude(["*"]));
        assert!(!filter.is_allowed("room_started"));
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: FilterParams =
            serde_json::from_str(r#"{"exclude_events": ["track_published"]}"#).unwrap();
        assert!(params.include_events.is_empty());
        assert_eq!(params.exclude_events, vec!["track_published".to_string()]);
    }
}
