use super::model::{BlockRule, RuleKind};

pub const DEFAULT_BLOCKED_DOMAINS: &[&str] = &[
    "facebook.com",
    "www.facebook.com",
    "youtube.com",
    "www.youtube.com",
    "discord.com",
    "www.discord.com",
];

pub const DEFAULT_BLOCKED_APPS: &[&str] = &["Discord"];

/// Domains and app names to block during one session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockList {
    /// Domains redirected to loopback, first occurrence order
    pub domains: Vec<String>,
    /// App names matched against running processes
    pub apps: Vec<String>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw entries, trimming and deduplicating both lists
    pub fn from_entries<D, A>(domains: D, apps: A) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let mut list = Self::new();
        for domain in domains {
            list.add_domain(domain.as_ref());
        }
        for app in apps {
            list.add_app(app.as_ref());
        }
        list
    }

    /// The built-in list used when a profile defines nothing
    pub fn defaults() -> Self {
        Self::from_entries(DEFAULT_BLOCKED_DOMAINS, DEFAULT_BLOCKED_APPS)
    }

    /// Split a profile's rules into domains and apps
    pub fn from_rules(rules: &[BlockRule]) -> Self {
        let mut list = Self::new();
        for rule in rules {
            match rule.kind {
                RuleKind::Domain => list.add_domain(&rule.value),
                RuleKind::App => list.add_app(&rule.value),
            }
        }
        list
    }

    /// Add domain (duplicates and blank entries are ignored)
    pub fn add_domain(&mut self, domain: &str) {
        push_unique(&mut self.domains, domain);
    }

    /// Add app name (duplicates and blank entries are ignored)
    pub fn add_app(&mut self, app: &str) {
        push_unique(&mut self.apps, app);
    }

    pub fn merge(&mut self, other: Self) {
        for domain in other.domains {
            self.add_domain(&domain);
        }
        for app in other.apps {
            self.add_app(&app);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.apps.is_empty()
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() || values.iter().any(|v| v == value) {
        return;
    }
    values.push(value.to_string());
}
