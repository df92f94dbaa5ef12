use super::action::Action;

/// An action whose trigger prefixed a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch<'a> {
    pub action: &'a Action,
    /// Comment text after the trigger, whitespace-trimmed
    pub remainder: String,
}

/// Find every action whose trigger is a literal prefix of the comment
///
/// All matching actions are returned in configuration order. Matching is
/// case-sensitive and the comment is not trimmed before comparison.
pub fn match_actions<'a>(comment: &str, actions: &'a [Action]) -> Vec<TriggerMatch<'a>> {
    actions
        .iter()
        .filter_map(|action| {
            comment
                .strip_prefix(action.trigger.as_str())
                .map(|rest| TriggerMatch {
                    action,
                    remainder: rest.trim().to_string(),
                })
        })
        .collect()
}
