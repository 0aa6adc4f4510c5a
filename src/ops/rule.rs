use std::fmt;

use crate::model::{Policy, RuleConfig};

/// Error type for rule directives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("empty {0} directive (expected \"label suffix\")")]
    Empty(Policy),
    #[error("directive '{directive}' has no label (expected \"label suffix\")")]
    MissingLabel { directive: String },
}

/// A labeling rule: apply `label` to tasks picked by `policy` under every item
/// whose name ends with `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub policy: Policy,
    pub label: String,
    pub suffix: String,
}

impl Rule {
    /// Parse a directive of the form `"label words... suffix"`.
    ///
    /// The last word is the suffix; the remaining words are joined with `_`
    /// to form the label name, so `"next action -n"` labels `next_action`.
    pub fn parse(policy: Policy, directive: &str) -> Result<Rule, RuleError> {
        let words: Vec<&str> = directive.split_whitespace().collect();
        let Some((suffix, label_words)) = words.split_last() else {
            return Err(RuleError::Empty(policy));
        };
        if label_words.is_empty() {
            return Err(RuleError::MissingLabel {
                directive: directive.to_string(),
            });
        }
        Ok(Rule {
            policy,
            label: label_words.join("_"),
            suffix: suffix.to_string(),
        })
    }
}

impl TryFrom<&RuleConfig> for Rule {
    type Error = RuleError;

    fn try_from(config: &RuleConfig) -> Result<Self, Self::Error> {
        Rule::parse(config.policy, &config.directive)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @{} {}", self.policy, self.label, self.suffix)
    }
}

/// Parse every directive given for one policy
pub fn parse_all(policy: Policy, directives: &[String]) -> Result<Vec<Rule>, RuleError> {
    directives.iter().map(|d| Rule::parse(policy, d)).collect()
}
