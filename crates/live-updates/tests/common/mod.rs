//! Local WebSocket push server and recording sink.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use live_updates::{ExternalUpdateSink, LiveUpdateConfig};
use record_store_client::Record;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// What the server does with one accepted connection.
pub struct Script {
    pub frames: Vec<String>,
    pub keep_open: bool,
}

impl Script {
    pub fn send_then_close(frames: &[&str]) -> Self {
        Self {
            frames: frames.iter().map(|f| f.to_string()).collect(),
            keep_open: false,
        }
    }

    pub fn send_then_hold(frames: &[&str]) -> Self {
        Self {
            frames: frames.iter().map(|f| f.to_string()).collect(),
            keep_open: true,
        }
    }
}

/// Serve one script per connection, in order, then stop listening.
/// Returns the ws:// URL.
pub async fn serve(scripts: Vec<Script>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        for script in scripts {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let mut ws = accept_async(stream).await.unwrap();
            for frame in script.frames {
                ws.send(Message::text(frame)).await.unwrap();
            }
            if script.keep_open {
                while let Some(Ok(_)) = ws.next().await {}
            } else {
                let _ = ws.close(None).await;
            }
        }
    });

    format!("ws://{addr}")
}

/// A ws:// URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}")
}

pub fn fast_config(url: String) -> LiveUpdateConfig {
    LiveUpdateConfig {
        url,
        reconnect_base_delay_ms: 10,
        reconnect_max_delay_ms: 50,
        max_reconnect_attempts: 3,
    }
}

#[derive(Default)]
pub struct RecordingSink {
    applied: Mutex<Vec<Vec<Record>>>,
}

impl RecordingSink {
    pub fn applied(&self) -> Vec<Vec<Record>> {
        self.applied.lock().unwrap().clone()
    }
}

impl ExternalUpdateSink for RecordingSink {
    fn apply_external_update(&self, records: Vec<Record>) {
        self.applied.lock().unwrap().push(records);
    }
}

pub fn update_frame(records: &[Record]) -> String {
    live_updates::PushMessage::UsersUpdate(records.to_vec())
        .to_json()
        .unwrap()
}

/// Poll until `condition` holds, for up to two seconds.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}
