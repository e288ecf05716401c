//! In-memory `Transport` for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Records every request and answers with canned responses in order.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    replies: Mutex<VecDeque<HttpResponse>>,
}

impl RecordingTransport {
    pub fn replying(bodies: &[&str]) -> Self {
        let replies = bodies
            .iter()
            .map(|body| HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.to_string(),
            })
            .collect();
        Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies),
        }
    }

    pub fn with_status(status: u16, body: &str) -> Self {
        let transport = Self::default();
        transport.replies.lock().unwrap().push_back(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        });
        transport
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError("no canned response left".to_string()))
    }
}
