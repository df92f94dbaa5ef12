use crate::backend::control::SubscriptionEvent;
use crate::backend::session::{BridgeEvent, LogLevel, LogLine, SessionState};
use tokio::sync::mpsc::UnboundedReceiver;

/// Print everything the session reports until the sink is dropped
pub async fn handle_bridge_events(mut rx: UnboundedReceiver<BridgeEvent>) {
    while let Some(event) = rx.recv().await {
        let line = render_event(&event);
        if matches!(event, BridgeEvent::Log(LogLine { level: LogLevel::ERROR, .. })) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

fn render_event(event: &BridgeEvent) -> String {
    match event {
        BridgeEvent::Log(line) => line.to_string(),
        BridgeEvent::StateChanged(state) => format!("Session {}", state_label(*state)),
        BridgeEvent::Subscription(event) => subscription_line(event),
    }
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Stopped => "stopped",
        SessionState::Starting => "starting",
        SessionState::Running => "running",
        SessionState::Stopping => "stopping",
    }
}

fn subscription_line(event: &SubscriptionEvent) -> String {
    if event.payload.is_null() {
        format!("Control event: {}", event.event_type)
    } else {
        format!("Control event: {} {}", event.event_type, event.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use serde_json::json;

    #[test]
    fn test_render_log_line() {
        let event = BridgeEvent::Log(LogLine {
            level: LogLevel::WARN,
            timestamp: Local::now(),
            message: "Control event feed closed".to_string(),
        });
        let rendered = render_event(&event);
        assert!(rendered.ends_with("WARN Control event feed closed"));
    }

    #[test]
    fn test_render_state_and_subscription() {
        assert_eq!(
            render_event(&BridgeEvent::StateChanged(SessionState::Running)),
            "Session running"
        );

        let event = SubscriptionEvent {
            event_type: "QueueOpen".to_string(),
            timestamp: json!(null),
            payload: json!(null),
        };
        assert_eq!(
            render_event(&BridgeEvent::Subscription(event)),
            "Control event: QueueOpen"
        );
    }
}
