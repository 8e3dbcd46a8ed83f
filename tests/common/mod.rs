//! Range-capable mock HTTP server for integration tests.
//!
//! Serves a single static body. GET with `Range: bytes=X-Y` answers 206 with
//! the slice and a `Content-Range` header; an unsatisfiable range (any range on
//! an empty body) answers 416 with `bytes */<total>`.

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub struct RangeResponder {
    body: Vec<u8>,
}

impl RangeResponder {
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }
}

/// Parses `bytes=X-Y` into an inclusive range.
fn parse_range(value: &str) -> Option<(u64, u64)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let total = self.body.len() as u64;
        let range = request
            .headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_range);

        match range {
            Some((start, end)) if start < total => {
                let end = end.min(total - 1);
                ResponseTemplate::new(206)
                    .insert_header(
                        "Content-Range",
                        format!("bytes {}-{}/{}", start, end, total).as_str(),
                    )
                    .set_body_bytes(self.body[start as usize..=end as usize].to_vec())
            }
            Some(_) => ResponseTemplate::new(416)
                .insert_header("Content-Range", format!("bytes */{}", total).as_str()),
            None => ResponseTemplate::new(200).set_body_bytes(self.body.clone()),
        }
    }
}

/// Starts a mock server serving `body` at every path.
pub async fn start(body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(RangeResponder::new(body))
        .mount(&server)
        .await;
    server
}

/// Deterministic test payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}
