use std::sync::mpsc::{Receiver, Sender, channel};

use tracing::trace;

// Metadata-type tag carried by a description request. The dialog only opens
// and records the request, delivery happens elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMetadataType {
    ColumnDescription,
}

impl RequestMetadataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMetadataType::ColumnDescription => "column description request",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    pub command: String,
    pub label: String,
    pub target_id: String,
    pub target_type: String,
}

// Fire-and-forget sink for user-action events. The receiving side is owned
// by whoever created the channel; a gone receiver must never fail the
// caller, so send errors are dropped.
#[derive(Clone)]
pub struct ActionLog {
    tx: Option<Sender<ActionEvent>>,
}

impl ActionLog {
    pub fn channel() -> (Self, Receiver<ActionEvent>) {
        let (tx, rx) = channel();
        (ActionLog { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        ActionLog { tx: None }
    }

    pub fn log(&self, event: ActionEvent) {
        trace!(
            command = %event.command,
            target_id = %event.target_id,
            target_type = %event.target_type,
            "action"
        );
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> ActionEvent {
        ActionEvent {
            command: "click".to_string(),
            label: "id varchar".to_string(),
            target_id: "column::id".to_string(),
            target_type: "column stats".to_string(),
        }
    }

    #[test]
    fn log_delivers_over_channel() {
        let (log, rx) = ActionLog::channel();
        log.log(event());
        assert_eq!(rx.try_recv().unwrap(), event());
    }

    #[test]
    fn log_survives_dropped_receiver() {
        let (log, rx) = ActionLog::channel();
        drop(rx);
        log.log(event());
    }

    #[test]
    fn disabled_log_is_a_noop() {
        ActionLog::disabled().log(event());
    }

    #[test]
    fn request_tag_is_fixed() {
        assert_eq!(
            RequestMetadataType::ColumnDescription.as_str(),
            "column description request"
        );
    }
}
