//! Test doubles for the transport and fetch seams.

use crate::broadcast::{Delivery, Outbound};
use crate::fetch::Fetcher;
use crate::{Result, ValonError};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

/// Fetcher that returns a canned result.
pub struct StubFetcher(pub std::result::Result<u16, String>);

impl Fetcher for StubFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, std::result::Result<u16, String>> {
        let result = self.0.clone();
        Box::pin(async move { result })
    }
}

/// Records every delivery. Sessions in `closed` fail like a dropped channel.
#[derive(Default)]
pub struct RecordingOutbound {
    pub closed: Mutex<HashSet<Uuid>>,
    pub delivered: Mutex<Vec<(Uuid, Delivery)>>,
}

impl RecordingOutbound {
    pub fn close(&self, session_id: Uuid) {
        self.closed.lock().unwrap().insert(session_id);
    }

    pub fn deliveries_for(&self, session_id: Uuid) -> Vec<Delivery> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == session_id)
            .map(|(_, d)| d.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

impl Outbound for RecordingOutbound {
    fn deliver(&self, session_id: Uuid, delivery: Delivery) -> Result<()> {
        if self.closed.lock().unwrap().contains(&session_id) {
            return Err(ValonError::ChannelClosed(session_id));
        }
        self.delivered.lock().unwrap().push((session_id, delivery));
        Ok(())
    }
}
