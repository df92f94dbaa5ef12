use serde_json::Value;

use crate::backend::actions::{render, Bindings, ControlAction};

const DEFAULT_MOVE_POSITION: i64 = 1;
const DEFAULT_HISTORY_LIMIT: i64 = 5;

/// A control action with its placeholders rendered and numbers parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    Query { map_key: String },
    AddKey { map_key: String, user: String, prepend: bool },
    ShowQueue,
    CheckQueueOf { user: String },
    ClearQueue,
    SetQueueOpen { open: bool },
    MoveInQueue { from: i64, to: i64 },
    ShuffleQueue,
    History { limit: i64 },
}

impl ControlRequest {
    /// Render every string parameter with the comment bindings
    pub fn build(action: &ControlAction, bindings: &Bindings) -> Self {
        match action {
            ControlAction::Query { map_key } => ControlRequest::Query {
                map_key: render(map_key, bindings),
            },
            ControlAction::AddKey {
                map_key,
                user,
                prepend,
            } => ControlRequest::AddKey {
                map_key: render(map_key, bindings),
                user: render(user, bindings),
                prepend: *prepend,
            },
            ControlAction::ShowQueue => ControlRequest::ShowQueue,
            ControlAction::CheckQueueOf { user } => ControlRequest::CheckQueueOf {
                user: render(user, bindings),
            },
            ControlAction::ClearQueue => ControlRequest::ClearQueue,
            ControlAction::SetQueueOpen { open } => ControlRequest::SetQueueOpen { open: *open },
            ControlAction::MoveInQueue { from, to } => ControlRequest::MoveInQueue {
                from: parse_or(&render(from, bindings), DEFAULT_MOVE_POSITION, "from"),
                to: parse_or(&render(to, bindings), DEFAULT_MOVE_POSITION, "to"),
            },
            ControlAction::ShuffleQueue => ControlRequest::ShuffleQueue,
            ControlAction::History { limit } => ControlRequest::History {
                limit: parse_or(&render(limit, bindings), DEFAULT_HISTORY_LIMIT, "limit"),
            },
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            ControlRequest::Query { .. } => "Query",
            ControlRequest::AddKey { .. } => "AddKey",
            ControlRequest::ShowQueue => "ShowQueue",
            ControlRequest::CheckQueueOf { .. } => "CheckQueueOf",
            ControlRequest::ClearQueue => "ClearQueue",
            ControlRequest::SetQueueOpen { .. } => "SetQueueOpen",
            ControlRequest::MoveInQueue { .. } => "MoveInQueue",
            ControlRequest::ShuffleQueue => "ShuffleQueue",
            ControlRequest::History { .. } => "History",
        }
    }

    /// Endpoint path plus query string, relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            ControlRequest::Query { map_key } => format!("/query/{}", urlencoding::encode(map_key)),
            ControlRequest::AddKey {
                map_key,
                user,
                prepend,
            } => {
                let mut path = format!(
                    "/addKey/{}?user={}",
                    urlencoding::encode(map_key),
                    urlencoding::encode(user)
                );
                if *prepend {
                    path.push_str("&prepend=true");
                }
                path
            }
            ControlRequest::ShowQueue => "/queue".to_string(),
            ControlRequest::CheckQueueOf { user } => {
                format!("/queue/where/{}", urlencoding::encode(user))
            }
            ControlRequest::ClearQueue => "/queue/clear".to_string(),
            ControlRequest::SetQueueOpen { open } => format!("/queue/open/{}", open),
            ControlRequest::MoveInQueue { from, to } => format!("/queue/move/{}/{}", from, to),
            ControlRequest::ShuffleQueue => "/queue/shuffle".to_string(),
            ControlRequest::History { limit } => format!("/history?limit={}", limit),
        }
    }

    /// Chat text for a successful response body
    pub fn success_text(&self, body: &Value) -> String {
        match self {
            ControlRequest::Query { .. } => match (field(body, "Title"), field(body, "Mapper")) {
                (Some(title), Some(mapper)) => format!("Map found: {} by {}", title, mapper),
                _ => "Map not found or error occurred.".to_string(),
            },
            ControlRequest::AddKey { .. } => match field(body, "Title") {
                Some(title) => format!("Added to queue: {}", title),
                None => "Song added to queue.".to_string(),
            },
            ControlRequest::ShowQueue => match items(body, &["Queue", "Items"]).len() {
                0 => "The queue is currently empty.".to_string(),
                n => format!("Queue has {} songs.", n),
            },
            ControlRequest::CheckQueueOf { user } => {
                let count = field(body, "Count")
                    .and_then(|c| c.parse::<u64>().ok())
                    .unwrap_or(0);
                if count == 0 {
                    format!("{} has no songs in queue.", user)
                } else {
                    let spot = field(body, "Spot").unwrap_or_else(|| "?".to_string());
                    format!(
                        "{} has {} songs in queue. Next position: {}",
                        user, count, spot
                    )
                }
            }
            ControlRequest::ClearQueue => "Queue has been cleared.".to_string(),
            ControlRequest::SetQueueOpen { open: true } => "Queue is now open.".to_string(),
            ControlRequest::SetQueueOpen { open: false } => "Queue is now closed.".to_string(),
            ControlRequest::MoveInQueue { from, to } => {
                format!("Moved queue entry from position {} to {}.", from, to)
            }
            ControlRequest::ShuffleQueue => "Queue has been shuffled.".to_string(),
            ControlRequest::History { .. } => {
                match items(body, &["History", "Items"])
                    .first()
                    .and_then(|item| field(item, "Title"))
                {
                    Some(title) => format!("Last played: {}", title),
                    None => "No play history available.".to_string(),
                }
            }
        }
    }

    /// Chat text used when the call fails
    pub fn fallback_text(&self) -> String {
        match self {
            ControlRequest::Query { .. } => "Failed to query map.".to_string(),
            ControlRequest::AddKey { .. } => "Failed to add song to queue.".to_string(),
            ControlRequest::ShowQueue => "Failed to fetch queue.".to_string(),
            ControlRequest::CheckQueueOf { user } => format!("Failed to check queue for {}.", user),
            ControlRequest::ClearQueue => "Failed to clear queue.".to_string(),
            ControlRequest::SetQueueOpen { .. } => "Failed to update queue status.".to_string(),
            ControlRequest::MoveInQueue { .. } => "Failed to move queue entry.".to_string(),
            ControlRequest::ShuffleQueue => "Failed to shuffle queue.".to_string(),
            ControlRequest::History { .. } => "Failed to fetch play history.".to_string(),
        }
    }
}

fn parse_or(value: &str, default: i64, name: &str) -> i64 {
    match value.trim().parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            log::warn!(
                "Control parameter '{}' is not a number ({:?}), using {}",
                name,
                value,
                default
            );
            default
        }
    }
}

/// Read a scalar field, falling back to its lowercase key
fn field(value: &Value, key: &str) -> Option<String> {
    let found = value
        .get(key)
        .or_else(|| value.get(key.to_lowercase().as_str()))?;
    match found {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Item list of a response: a bare array or an array under one of `keys`
fn items<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(array) = value.as_array() {
        return array;
    }
    keys.iter()
        .find_map(|key| {
            value
                .get(*key)
                .or_else(|| value.get(key.to_lowercase().as_str()))
                .and_then(Value::as_array)
        })
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bindings() -> Bindings {
        Bindings::new("abc", "viewer one")
    }

    #[test]
    fn test_add_key_path_is_rendered_and_encoded() {
        let action = ControlAction::AddKey {
            map_key: "{userinput}".to_string(),
            user: "{username}".to_string(),
            prepend: true,
        };
        let request = ControlRequest::build(&action, &bindings());
        assert_eq!(request.path(), "/addKey/abc?user=viewer%20one&prepend=true");
    }

    #[test]
    fn test_move_defaults_on_non_numeric_positions() {
        let action = ControlAction::MoveInQueue {
            from: "{userinput}".to_string(),
            to: "later".to_string(),
        };
        let request = ControlRequest::build(&action, &bindings());
        assert_eq!(request, ControlRequest::MoveInQueue { from: 1, to: 1 });
        assert_eq!(request.path(), "/queue/move/1/1");
    }

    #[test]
    fn test_move_parses_rendered_numbers() {
        let action = ControlAction::MoveInQueue {
            from: "{userinput}".to_string(),
            to: "2".to_string(),
        };
        let request = ControlRequest::build(&action, &Bindings::new(" 4 ", "u"));
        assert_eq!(request.path(), "/queue/move/4/2");
    }

    #[test]
    fn test_history_limit_defaults_to_five() {
        let action = ControlAction::History {
            limit: "{userinput}".to_string(),
        };
        let request = ControlRequest::build(&action, &bindings());
        assert_eq!(request.path(), "/history?limit=5");
    }

    #[test]
    fn test_endpoint_table() {
        let b = bindings();
        let cases = vec![
            (ControlAction::Query { map_key: "25f".into() }, "/query/25f"),
            (ControlAction::ShowQueue, "/queue"),
            (ControlAction::CheckQueueOf { user: "{username}".into() }, "/queue/where/viewer%20one"),
            (ControlAction::ClearQueue, "/queue/clear"),
            (ControlAction::SetQueueOpen { open: false }, "/queue/open/false"),
            (ControlAction::ShuffleQueue, "/queue/shuffle"),
            (ControlAction::History { limit: "3".into() }, "/history?limit=3"),
        ];
        for (action, path) in cases {
            assert_eq!(ControlRequest::build(&action, &b).path(), path);
        }
    }

    #[test]
    fn test_query_text() {
        let request = ControlRequest::Query { map_key: "1".into() };
        assert_eq!(
            request.success_text(&json!({"Title": "Song", "Mapper": "Someone"})),
            "Map found: Song by Someone"
        );
        assert_eq!(
            request.success_text(&json!({"Title": "Song"})),
            "Map not found or error occurred."
        );
    }

    #[test]
    fn test_add_key_text() {
        let request = ControlRequest::AddKey {
            map_key: "1".into(),
            user: "u".into(),
            prepend: false,
        };
        assert_eq!(request.success_text(&json!({"Title": "Song"})), "Added to queue: Song");
        assert_eq!(request.success_text(&Value::Null), "Song added to queue.");
    }

    #[test]
    fn test_queue_text() {
        let request = ControlRequest::ShowQueue;
        assert_eq!(request.success_text(&json!([])), "The queue is currently empty.");
        assert_eq!(request.success_text(&json!([{}, {}])), "Queue has 2 songs.");
        assert_eq!(request.success_text(&json!({"Queue": [{}]})), "Queue has 1 songs.");
    }

    #[test]
    fn test_check_queue_text() {
        let request = ControlRequest::CheckQueueOf { user: "bob".into() };
        assert_eq!(
            request.success_text(&json!({"Count": 2, "Spot": 3})),
            "bob has 2 songs in queue. Next position: 3"
        );
        assert_eq!(request.success_text(&json!({"Count": 0})), "bob has no songs in queue.");
    }

    #[test]
    fn test_history_text() {
        let request = ControlRequest::History { limit: 5 };
        assert_eq!(
            request.success_text(&json!([{"Title": "Last"}, {"Title": "Older"}])),
            "Last played: Last"
        );
        assert_eq!(request.success_text(&json!([])), "No play history available.");
    }

    #[test]
    fn test_fixed_texts() {
        assert_eq!(
            ControlRequest::SetQueueOpen { open: true }.success_text(&Value::Null),
            "Queue is now open."
        );
        assert_eq!(
            ControlRequest::MoveInQueue { from: 2, to: 1 }.success_text(&Value::Null),
            "Moved queue entry from position 2 to 1."
        );
        assert_eq!(
            ControlRequest::ClearQueue.success_text(&Value::Null),
            "Queue has been cleared."
        );
    }
}
