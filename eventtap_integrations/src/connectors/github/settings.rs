use eventtap_core::ConnectorConfig;
use std::fmt;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// One `owner/name` repository whose event feed is polled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub owner: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse one `owner/name` segment after trimming it. A segment is accepted
    /// when it holds exactly one slash; the halves are taken as-is, even empty.
    pub fn parse(segment: &str) -> Option<Self> {
        let (owner, name) = segment.trim().split_once('/')?;
        if name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Split a comma-separated `repo_list` into entities, in input order, duplicates kept.
///
/// Malformed segments are dropped without surfacing an error.
pub fn parse_entity_list(repo_list: &str) -> Vec<EntityRef> {
    repo_list
        .split(',')
        .filter_map(EntityRef::parse)
        .collect()
}

/// What a fault on one entity does to the rest of the run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The first fault ends the run for every remaining entity.
    #[default]
    FailFast,
    /// A faulty entity is logged and skipped; the others still sync.
    Isolate,
}

/// Typed view over the connector configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubEventsSettings {
    pub github_token: Option<String>,
    pub repo_list: Option<String>,
    pub api_base: String,
    pub failure_policy: FailurePolicy,
}

impl GithubEventsSettings {
    pub fn from_config(configuration: &ConnectorConfig) -> Self {
        let failure_policy = match configuration.get_trimmed("continue_on_error") {
            Some(v) if v.eq_ignore_ascii_case("true") => FailurePolicy::Isolate,
            _ => FailurePolicy::FailFast,
        };
        Self {
            github_token: configuration.get_trimmed("github_token").map(str::to_string),
            repo_list: configuration.get_trimmed("repo_list").map(str::to_string),
            api_base: configuration
                .get_trimmed("api_base")
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            failure_policy,
        }
    }
}

impl fmt::Debug for GithubEventsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubEventsSettings")
            .field("github_token", &self.github_token.as_ref().map(|_| "***"))
            .field("repo_list", &self.repo_list)
            .field("api_base", &self.api_base)
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_segments_without_separator() {
        let repos = parse_entity_list("octocat/Hello-World, badformat, acme/widgets");
        assert_eq!(
            repos,
            vec![
                EntityRef::new("octocat", "Hello-World"),
                EntityRef::new("acme", "widgets"),
            ]
        );
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let repos = parse_entity_list("b/two,a/one,b/two");
        let rendered: Vec<String> = repos.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["b/two", "a/one", "b/two"]);
    }

    #[test]
    fn splits_any_segment_with_exactly_one_slash() {
        assert_eq!(EntityRef::parse("a/b/c"), None);
        assert_eq!(EntityRef::parse("/b"), Some(EntityRef::new("", "b")));
        assert_eq!(EntityRef::parse("a/"), Some(EntityRef::new("a", "")));
        assert_eq!(EntityRef::parse("  a / b  "), Some(EntityRef::new("a ", " b")));
    }

    #[test]
    fn keeps_segments_with_an_empty_half() {
        assert_eq!(
            parse_entity_list("owner/, /name"),
            vec![EntityRef::new("owner", ""), EntityRef::new("", "name")]
        );
    }

    #[test]
    fn whitespace_only_list_parses_to_nothing() {
        assert!(parse_entity_list("  ,  , ").is_empty());
    }

    #[test]
    fn settings_defaults() {
        let s = GithubEventsSettings::from_config(&ConnectorConfig::new());
        assert_eq!(s.github_token, None);
        assert_eq!(s.repo_list, None);
        assert_eq!(s.api_base, DEFAULT_API_BASE);
        assert_eq!(s.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn settings_read_overrides() {
        let cfg = ConnectorConfig::new()
            .with("github_token", " ghp_secret ")
            .with("repo_list", "a/b")
            .with("api_base", "http://127.0.0.1:9000/")
            .with("continue_on_error", "TRUE");
        let s = GithubEventsSettings::from_config(&cfg);
        assert_eq!(s.github_token.as_deref(), Some("ghp_secret"));
        assert_eq!(s.api_base, "http://127.0.0.1:9000");
        assert_eq!(s.failure_policy, FailurePolicy::Isolate);
        assert!(!format!("{s:?}").contains("ghp_secret"));
    }
}
