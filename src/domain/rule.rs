//! Indexer matching rules.
//!
//! An indexer function is registered together with a `filter_json` rule such as
//! `{"indexer_rule_kind":"Action","matching_rule":{"rule":"ACTION_ANY","affected_account_id":"*.near","status":"SUCCESS"}}`.
//! Blocks that contain no matching action are never handed to that indexer.

use serde::Deserialize;

use crate::domain::{Action, ActionStatus, Block, Operation};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum IndexerRuleKind {
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexerRule {
    pub indexer_rule_kind: IndexerRuleKind,
    pub matching_rule: MatchingRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "rule", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchingRule {
    ActionAny {
        affected_account_id: String,
        status: StatusFilter,
    },
    ActionFunctionCall {
        affected_account_id: String,
        function: String,
        status: StatusFilter,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusFilter {
    Success,
    Fail,
    Any,
}

impl StatusFilter {
    fn accepts(self, status: ActionStatus) -> bool {
        match self {
            StatusFilter::Any => true,
            StatusFilter::Success => status == ActionStatus::Success,
            StatusFilter::Fail => status == ActionStatus::Failure,
        }
    }
}

impl IndexerRule {
    pub fn from_json(filter_json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(filter_json)
    }

    pub fn matches(&self, block: &Block) -> bool {
        block.actions().iter().any(|action| self.matches_action(action))
    }

    pub fn matches_action(&self, action: &Action) -> bool {
        match &self.matching_rule {
            MatchingRule::ActionAny { affected_account_id, status } => {
                status.accepts(action.status) && affects(affected_account_id, action)
            }
            MatchingRule::ActionFunctionCall { affected_account_id, function, status } => {
                status.accepts(action.status)
                    && affects(affected_account_id, action)
                    && action.operations.iter().any(|op| match op {
                        Operation::FunctionCall(call) => call.method_name.as_deref() == Some(function.as_str()),
                        _ => false,
                    })
            }
        }
    }
}

fn affects(patterns: &str, action: &Action) -> bool {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .any(|p| wildcard_match(p, &action.receiver_id) || wildcard_match(p, &action.signer_id))
}

/// Glob match where `*` stands for any run of characters, including none.
pub fn wildcard_match(pattern: &str, account_id: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = account_id.as_bytes();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = backtrack {
            p = star_p + 1;
            t = star_t + 1;
            backtrack = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockHeader, FunctionCallOperation};

    fn action(signer: &str, receiver: &str, status: ActionStatus, method: Option<&str>) -> Action {
        Action {
            signer_id: signer.to_string(),
            receiver_id: receiver.to_string(),
            receipt_id: "r".to_string(),
            status,
            operations: method
                .map(|m| {
                    vec![Operation::FunctionCall(FunctionCallOperation {
                        method_name: Some(m.to_string()),
                        args: Some("e30=".to_string()),
                        ..Default::default()
                    })]
                })
                .unwrap_or_default(),
        }
    }

    fn block(actions: Vec<Action>) -> Block {
        Block::new(BlockHeader { height: 1, hash: None, timestamp_nanosec: None }, actions, vec![])
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.near", "alice.near"));
        assert!(wildcard_match("*.near", "a.b.near"));
        assert!(!wildcard_match("*.near", "near"));
        assert!(!wildcard_match("*.near", "alice.testnet"));
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("app.*.near", "app.pool.near"));
        assert!(wildcard_match("dev-queryapi.test.near", "dev-queryapi.test.near"));
        assert!(!wildcard_match("dev-queryapi.test.near", "xdev-queryapi.test.near"));
    }

    #[test]
    fn test_parse_registered_filter_json() {
        let rule = IndexerRule::from_json(
            r#"{"indexer_rule_kind":"Action","matching_rule":{"rule":"ACTION_ANY","affected_account_id":"*.near","status":"SUCCESS"}}"#,
        )
        .unwrap();

        assert_eq!(rule.indexer_rule_kind, IndexerRuleKind::Action);
        assert_eq!(
            rule.matching_rule,
            MatchingRule::ActionAny { affected_account_id: "*.near".to_string(), status: StatusFilter::Success }
        );
    }

    #[test]
    fn test_action_any_checks_accounts_and_status() {
        let rule = IndexerRule::from_json(
            r#"{"indexer_rule_kind":"Action","matching_rule":{"rule":"ACTION_ANY","affected_account_id":"token.near, *.pool.near","status":"SUCCESS"}}"#,
        )
        .unwrap();

        assert!(rule.matches(&block(vec![action("alice.testnet", "token.near", ActionStatus::Success, None)])));
        assert!(rule.matches(&block(vec![action("x.pool.near", "bob.testnet", ActionStatus::Success, None)])));
        assert!(!rule.matches(&block(vec![action("alice.testnet", "token.near", ActionStatus::Failure, None)])));
        assert!(!rule.matches(&block(vec![action("alice.testnet", "other.near", ActionStatus::Success, None)])));
        assert!(!rule.matches(&block(vec![])));
    }

    #[test]
    fn test_function_call_rule_requires_method() {
        let rule = IndexerRule::from_json(
            r#"{"indexer_rule_kind":"Action","matching_rule":{"rule":"ACTION_FUNCTION_CALL","affected_account_id":"*","function":"add_user","status":"ANY"}}"#,
        )
        .unwrap();

        assert!(rule.matches(&block(vec![action("a", "b", ActionStatus::Failure, Some("add_user"))])));
        assert!(!rule.matches(&block(vec![action("a", "b", ActionStatus::Success, Some("remove_user"))])));
        assert!(!rule.matches(&block(vec![action("a", "b", ActionStatus::Success, None)])));
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        assert!(IndexerRule::from_json(r#"{"indexer_rule_kind":"Action","matching_rule":{"rule":"EVENT","status":"ANY"}}"#).is_err());
    }
}
