//! Store backend protocol types.
//!
//! Defines the JSON protocol used for communication between datefinder and
//! store backend binaries over stdin/stdout. One request line in, one
//! response line out — except `Watch`, which keeps streaming a response line
//! per snapshot until the backend process is killed.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::EventData;

/// A typed request whose response type is known at compile time.
pub trait StoreCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

/// Commands that store backends must implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    CreateEvent,
    GetEvent,
    ReplaceParticipantDates,
    Watch,
}

/// Request sent from the client to the backend.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from the backend to the client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap()
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap()
    }
}

/// Persist a new event aggregate. The document already contains the creator
/// participant with an empty date set.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    pub event: EventData,
}

impl StoreCommand for CreateEvent {
    type Response = String; // Event id
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Fetch one event aggregate; `None` when it does not exist.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetEvent {
    pub event_id: String,
}

impl StoreCommand for GetEvent {
    type Response = Option<EventData>;
    fn command() -> Command {
        Command::GetEvent
    }
}

/// Replace one participant's entire entry (name and full date set). Never a
/// partial merge; last write observed wins at the storage layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceParticipantDates {
    pub event_id: String,
    pub participant_id: String,
    pub participant_name: String,
    pub dates: BTreeSet<NaiveDate>,
}

impl StoreCommand for ReplaceParticipantDates {
    type Response = ();
    fn command() -> Command {
        Command::ReplaceParticipantDates
    }
}

/// Start a snapshot stream for one event. The backend answers with the
/// current aggregate immediately (`null` if the event does not exist), then
/// with a fresh full snapshot after every observed change.
#[derive(Debug, Serialize, Deserialize)]
pub struct Watch {
    pub event_id: String,
}

impl StoreCommand for Watch {
    type Response = Option<EventData>;
    fn command() -> Command {
        Command::Watch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_round_trip() {
        let request = Request {
            command: Command::GetEvent,
            params: serde_json::json!({ "event_id": "abc" }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("get_event"));

        let back: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(back.command, Command::GetEvent);
    }

    #[test]
    fn test_response_tags_status() {
        let ok = Response::success(42u32);
        assert_eq!(ok, r#"{"status":"success","data":42}"#);

        let err = Response::error("boom");
        assert_eq!(err, r#"{"status":"error","error":"boom"}"#);
    }

    #[test]
    fn test_null_snapshot_deserializes_to_none() {
        let line = r#"{"status":"success","data":null}"#;
        let response: Response<Option<EventData>> = serde_json::from_str(line).unwrap();
        match response {
            Response::Success { data } => assert!(data.is_none()),
            Response::Error { .. } => panic!("expected success"),
        }
    }
}
