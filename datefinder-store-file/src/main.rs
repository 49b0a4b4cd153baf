//! datefinder-store-file - local file-backed store backend for datefinder
//!
//! This binary implements the datefinder store protocol, communicating with
//! the datefinder CLI via JSON over stdin/stdout. Event documents live as
//! plain JSON files under the configured data directory:
//!   ~/.local/share/datefinder/events/{event_id}.json

mod config;
mod store;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use datefinder_core::protocol::{
    Command, CreateEvent, GetEvent, ReplaceParticipantDates, Request, Response, Watch,
};

use crate::config::StoreConfig;
use crate::store::FileStore;

/// How often the watch loop checks the event document for changes.
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    let store = match StoreConfig::load() {
        Ok(config) => FileStore::new(&config.data_path()),
        Err(e) => {
            eprintln!("Failed to load store configuration: {e:#}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {e}");
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = Response::error(&format!("Failed to parse request: {e}"));
                writeln!(stdout, "{response}").unwrap();
                stdout.flush().unwrap();
                continue;
            }
        };

        // Watch streams response lines until the client goes away
        if request.command == Command::Watch {
            handle_watch(&store, &request.params).await;
            break;
        }

        let response = handle_request(&store, request);

        writeln!(stdout, "{response}").unwrap();
        stdout.flush().unwrap();
    }
}

fn handle_request(store: &FileStore, request: Request) -> String {
    match request.command {
        Command::CreateEvent => handle_create_event(store, &request.params),
        Command::GetEvent => handle_get_event(store, &request.params),
        Command::ReplaceParticipantDates => handle_replace_dates(store, &request.params),
        Command::Watch => unreachable!("watch is handled by the streaming path"),
    }
}

fn handle_create_event(store: &FileStore, params: &serde_json::Value) -> String {
    let params: CreateEvent = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {e}")),
    };

    match store.create_event(&params.event) {
        Ok(event_id) => Response::success(event_id),
        Err(e) => Response::error(&format!("{e:#}")),
    }
}

fn handle_get_event(store: &FileStore, params: &serde_json::Value) -> String {
    let params: GetEvent = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {e}")),
    };

    match store.read_event(&params.event_id) {
        Ok(event) => Response::success(event),
        Err(e) => Response::error(&format!("{e:#}")),
    }
}

fn handle_replace_dates(store: &FileStore, params: &serde_json::Value) -> String {
    let params: ReplaceParticipantDates = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {e}")),
    };

    match store.replace_participant_dates(
        &params.event_id,
        &params.participant_id,
        &params.participant_name,
        params.dates,
    ) {
        Ok(()) => Response::success(()),
        Err(e) => Response::error(&format!("{e:#}")),
    }
}

/// Emit the current snapshot immediately, then a fresh one whenever the
/// event document changes, until the client closes the pipe.
async fn handle_watch(store: &FileStore, params: &serde_json::Value) {
    let mut stdout = io::stdout();

    let params: Watch = match serde_json::from_value(params.clone()) {
        Ok(p) => p,
        Err(e) => {
            let response = Response::error(&format!("Invalid params: {e}"));
            let _ = writeln!(stdout, "{response}");
            return;
        }
    };

    let mut last_seen = None;
    let mut interval = tokio::time::interval(WATCH_POLL_INTERVAL);

    loop {
        interval.tick().await;

        let fingerprint = store.fingerprint(&params.event_id);
        if last_seen.as_ref() == Some(&fingerprint) {
            continue;
        }

        // An unreadable document is pushed as null, same as a missing one
        let response = match store.read_event(&params.event_id) {
            Ok(snapshot) => Response::success(snapshot),
            Err(e) => {
                eprintln!("Failed to read event {}: {e:#}", params.event_id);
                Response::success(None::<datefinder_core::event::EventData>)
            }
        };

        // A broken pipe means the subscriber is gone; stop watching
        if writeln!(stdout, "{response}").is_err() || stdout.flush().is_err() {
            return;
        }

        last_seen = Some(fingerprint);
    }
}
