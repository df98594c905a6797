//! Minimal HTTP/1.1 archive stand-in for integration tests.
//!
//! Stores bodies of PUT requests, lists them as an XNAT JSON catalog on
//! `GET <resource>/files?format=json`, serves them back on GET, and supports
//! HEAD and DELETE. One request per connection.

use md5::Md5;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use xnat_core::checksum::digest_reader;

/// What the catalog reports in the `digest` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMode {
    /// The MD5 of the stored body.
    Correct,
    /// A well-formed MD5 that never matches.
    Wrong,
    /// Empty digest, like archive versions that do not record checksums.
    Absent,
}

#[derive(Default)]
struct State {
    files: Vec<(String, Vec<u8>)>,
    log: Vec<String>,
}

pub struct ArchiveServer {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub base_url: String,
    state: Arc<Mutex<State>>,
}

impl ArchiveServer {
    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start(mode: DigestMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State::default()));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state, mode));
            }
        });
        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// Request lines seen so far, as "METHOD target".
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Stored body for a file path as sent on the wire (escaped, without query).
    pub fn stored(&self, path: &str) -> Option<Vec<u8>> {
        let st = self.state.lock().unwrap();
        st.files.iter().find(|(p, _)| p == path).map(|(_, b)| b.clone())
    }
}

fn handle(mut stream: TcpStream, state: &Mutex<State>, mode: DigestMode) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(5)));
    let Some((method, target, body)) = read_request(&mut stream) else {
        return;
    };
    state
        .lock()
        .unwrap()
        .log
        .push(format!("{} {}", method, target));

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), Some(q.to_string())),
        None => (target.clone(), None),
    };

    let mut st = state.lock().unwrap();
    let pos = st.files.iter().position(|(p, _)| *p == path);
    let (status, payload): (&str, Vec<u8>) = match method.as_str() {
        "PUT" => {
            match pos {
                Some(i) => st.files[i].1 = body,
                None => st.files.push((path, body)),
            }
            ("200 OK", Vec::new())
        }
        "GET" if path.ends_with("/files") && query.as_deref() == Some("format=json") => {
            let prefix = format!("{}/", path);
            let rows: Vec<serde_json::Value> = st
                .files
                .iter()
                .filter(|(p, _)| p.starts_with(&prefix))
                .map(|(p, b)| {
                    let name = decode_segment(&p[prefix.len()..]);
                    let digest = match mode {
                        DigestMode::Correct => digest_reader::<Md5, _>(&mut b.as_slice()).unwrap(),
                        DigestMode::Wrong => "ffffffffffffffffffffffffffffffff".to_string(),
                        DigestMode::Absent => String::new(),
                    };
                    serde_json::json!({
                        "Name": name,
                        "Size": b.len().to_string(),
                        "URI": p,
                        "collection": "",
                        "digest": digest,
                    })
                })
                .collect();
            let doc = serde_json::json!({
                "ResultSet": { "totalRecords": rows.len().to_string(), "Result": rows }
            });
            ("200 OK", doc.to_string().into_bytes())
        }
        "GET" => match pos {
            Some(i) => ("200 OK", st.files[i].1.clone()),
            None => ("404 Not Found", Vec::new()),
        },
        "HEAD" => match pos {
            Some(_) => ("200 OK", Vec::new()),
            None => ("404 Not Found", Vec::new()),
        },
        "DELETE" => match pos {
            Some(i) => {
                st.files.remove(i);
                ("200 OK", Vec::new())
            }
            None => ("404 Not Found", Vec::new()),
        },
        _ => ("405 Method Not Allowed", Vec::new()),
    };
    drop(st);

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        payload.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if method != "HEAD" {
        let _ = stream.write_all(&payload);
    }
}

/// Percent-decodes one path segment. A literal `+` stays a plus in paths.
fn decode_segment(segment: &str) -> String {
    let escaped = segment.replace('+', "%2B");
    url::form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}

/// Reads one request: (method, target, body). Body length comes from Content-Length.
fn read_request(stream: &mut TcpStream) -> Option<(String, String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(i) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break i + 4;
        }
    };

    let head = std::str::from_utf8(&data[..header_end]).ok()?.to_string();
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let target = first.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);
    Some((method, target, body))
}
