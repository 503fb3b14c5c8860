use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Domain,
    App,
}

/// A block rule attached to a focus profile
///
/// Rules are persisted by the host application; this crate only consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRule {
    pub id: String,
    pub profile_id: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub value: String,
    /// Creation timestamp as stored by the host application
    pub created_at: String,
}

impl BlockRule {
    pub fn domain(id: impl Into<String>, profile_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(id, profile_id, RuleKind::Domain, value)
    }

    pub fn app(id: impl Into<String>, profile_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(id, profile_id, RuleKind::App, value)
    }

    fn new(
        id: impl Into<String>,
        profile_id: impl Into<String>,
        kind: RuleKind,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            profile_id: profile_id.into(),
            kind,
            value: value.into(),
            created_at: String::new(),
        }
    }
}
