//! Minimal HTTP responder for reader tests: accepts one connection, records
//! the request body and answers with a canned response.

use reqwest::Url;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

enum Reply {
    Raw { status: u16, body: String },
    /// Gets `jsonrpc` and the request's `id` merged in.
    JsonRpc { status: u16, fields: Value },
}

pub struct OneShotServer {
    url: Url,
    request: oneshot::Receiver<RecordedRequest>,
}

#[derive(Debug)]
pub struct RecordedRequest {
    pub headers: String,
    pub body: Value,
}

impl std::ops::Index<&str> for RecordedRequest {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        &self.body[key]
    }
}

impl OneShotServer {
    pub async fn raw(status: u16, body: &str) -> Self {
        Self::start(Reply::Raw {
            status,
            body: body.to_string(),
        })
        .await
    }

    pub async fn json(status: u16, body: Value) -> Self {
        Self::raw(status, &body.to_string()).await
    }

    pub async fn json_rpc(status: u16, fields: Value) -> Self {
        Self::start(Reply::JsonRpc { status, fields }).await
    }

    pub async fn json_rpc_result(status: u16, result: Value) -> Self {
        Self::json_rpc(status, json!({ "result": result })).await
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    pub async fn request(self) -> RecordedRequest {
        self.request.await.expect("server saw no request")
    }

    async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let (headers, raw_body) = read_request(&mut stream).await;
            let body: Value = serde_json::from_slice(&raw_body).unwrap_or(Value::Null);

            let (status, payload) = match reply {
                Reply::Raw { status, body } => (status, body),
                Reply::JsonRpc { status, mut fields } => {
                    fields["jsonrpc"] = json!("2.0");
                    fields["id"] = body.get("id").cloned().unwrap_or(json!(0));
                    (status, fields.to_string())
                }
            };
            let response = format!(
                "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
                payload.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            let _ = tx.send(RecordedRequest { headers, body });
        });

        Self {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            request: rx,
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> (String, Vec<u8>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..end]).to_string();
            let length = content_length(&headers);
            while buf.len() < end + 4 + length {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return (headers, buf[end + 4..].to_vec());
        }
    }
    (String::from_utf8_lossy(&buf).to_string(), Vec::new())
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(headers: &str) -> usize {
    headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// URL of a local port nothing listens on.
pub async fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/")).unwrap()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
