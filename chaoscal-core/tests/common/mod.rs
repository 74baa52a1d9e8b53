#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chaoscal_core::remote::FeedFetcher;
use chaoscal_core::{ChaosCalError, ChaosCalResult};
use tokio::sync::oneshot;
use url::Url;

/// Log to the test writer; set RUST_LOG to see output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One event block per title, all on 2024-03-15 at 10:00.
pub fn feed(titles: &[&str]) -> String {
    let mut ics = String::from("BEGIN:VCALENDAR\nVERSION:2.0\n");
    for title in titles {
        ics.push_str(&format!(
            "BEGIN:VEVENT\nSUMMARY:{title}\nDTSTART:20240315T100000Z\nEND:VEVENT\n"
        ));
    }
    ics.push_str("END:VCALENDAR\n");
    ics
}

struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    response: ChaosCalResult<String>,
}

/// Answers fetches in call order from a queue of scripted responses.
/// A gated response waits until its sender fires.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn respond(&self, response: ChaosCalResult<String>) {
        self.script.lock().unwrap().push_back(Scripted {
            gate: None,
            response,
        });
    }

    /// Queue a response that is held back until the returned sender fires.
    pub fn respond_gated(&self, response: ChaosCalResult<String>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().unwrap().push_back(Scripted {
            gate: Some(rx),
            response,
        });
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for ScriptedFetcher {
    async fn fetch(&self, _url: &Url) -> ChaosCalResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let Some(scripted) = next else {
            return Err(ChaosCalError::FeedRequest("no scripted response".into()));
        };
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.response
    }
}
