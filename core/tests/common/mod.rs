//! Test servers shared by the integration tests.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Start the mock GoCD server on a random port and return its `/go` base URL.
pub fn spawn_mock_server() -> String {
    let std_listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/go")
}

/// A request as it arrived on the wire.
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Answers exactly one connection with a canned HTTP response, then closes
/// it. Used for wire-level cases the mock server cannot produce, such as a
/// body shorter than its `Content-Length`.
pub struct RawServer {
    pub base_url: String,
    requests: mpsc::Receiver<CapturedRequest>,
}

impl RawServer {
    pub fn respond_with(response: impl Into<Vec<u8>>) -> Self {
        Self::respond_after(Duration::ZERO, response)
    }

    /// Wait `delay` after reading the request before answering.
    pub fn respond_after(delay: Duration, response: impl Into<Vec<u8>>) -> Self {
        Self::serve(delay, response.into(), Duration::ZERO)
    }

    /// Write `response` right away, then keep the connection open for `hold`
    /// without sending anything more.
    pub fn respond_then_stall(response: impl Into<Vec<u8>>, hold: Duration) -> Self {
        Self::serve(Duration::ZERO, response.into(), hold)
    }

    fn serve(delay: Duration, response: Vec<u8>, hold: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream);
            if let Some(request) = read_request(&mut reader) {
                let _ = tx.send(request);
            }
            thread::sleep(delay);
            let mut stream = reader.into_inner();
            // The client may already have given up; write errors are expected then.
            let _ = stream.write_all(&response);
            let _ = stream.flush();
            thread::sleep(hold);
        });

        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
        }
    }

    /// The request the server received.
    pub fn request(&self) -> CapturedRequest {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("server received no request")
    }
}

fn read_request(reader: &mut impl BufRead) -> Option<CapturedRequest> {
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        line.clear();
        reader.read_line(&mut line).ok()?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        let (key, value) = trimmed.split_once(':')?;
        headers.push((key.trim().to_string(), value.trim().to_string()));
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// A complete `200 OK` response with a JSON body and optional extra headers.
pub fn ok_json(body: &str, extra_headers: &[(&str, &str)]) -> String {
    response("200 OK", body, extra_headers)
}

pub fn response(status_line: &str, body: &str, extra_headers: &[(&str, &str)]) -> String {
    let mut out = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (key, value) in extra_headers {
        out.push_str(&format!("{key}: {value}\r\n"));
    }
    out.push_str("\r\n");
    out.push_str(body);
    out
}
