//! Minimal blocking HTTP/1.1: one request per connection, `Connection: close`.

use std::collections::HashMap;
use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;

use serde_json::Value;

/// Upper bound on accepted request bodies.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a request from a raw target such as `/api/packages?page=2`.
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = parse_path_query(target);
        Self {
            method: method.to_ascii_uppercase(),
            path,
            query,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(status: u16, value: Value) -> Self {
        let body = serde_json::to_vec(&value).unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    pub fn text(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            body: body.into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

pub fn read_http_request(stream: &TcpStream) -> io::Result<Option<HttpRequest>> {
    let mut reader = io::BufReader::new(stream.try_clone()?);
    let Some(line) = read_crlf_line(&mut reader)? else {
        return Ok(None);
    };
    if line.is_empty() {
        return Ok(None);
    }
    let (method, target) = parse_request_line(&line)?;
    let mut request = HttpRequest::new(method, target);
    request.headers = read_headers(&mut reader)?;

    let content_length = match request.headers.get("content-length") {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            invalid_data(format!("invalid content-length header: {raw:?}"))
        })?,
        None => 0,
    };
    if content_length > MAX_BODY_BYTES {
        return Err(invalid_data(format!(
            "request body too large ({content_length} bytes, limit {MAX_BODY_BYTES})"
        )));
    }
    request.body = vec![0_u8; content_length];
    reader.read_exact(&mut request.body)?;
    Ok(Some(request))
}

/// One line without its terminator, or `None` at end of stream.
fn read_crlf_line(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);
    Ok(Some(line))
}

fn parse_request_line(line: &str) -> io::Result<(&str, &str)> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => Ok((method, target)),
        _ => Err(invalid_data(format!("malformed request line: {line:?}"))),
    }
}

/// Header block up to the blank line; names are lowercased.
fn read_headers(reader: &mut impl BufRead) -> io::Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    while let Some(line) = read_crlf_line(reader)? {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    Ok(headers)
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

pub fn write_http_response(stream: &mut impl Write, response: &HttpResponse) -> io::Result<()> {
    let mut out = Vec::with_capacity(response.body.len() + 128);
    write!(
        out,
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {len}\r\n\
         Connection: close\r\n\r\n",
        status = response.status,
        reason = reason_phrase(response.status),
        content_type = response.content_type,
        len = response.body.len(),
    )?;
    out.extend_from_slice(&response.body);
    stream.write_all(&out)?;
    stream.flush()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Splits a request target into a decoded path and decoded query pairs.
pub fn parse_path_query(raw: &str) -> (String, HashMap<String, String>) {
    let (path, query_str) = match raw.split_once('?') {
        Some((p, q)) => (p, q),
        None => (raw, ""),
    };
    let mut query = HashMap::new();
    for pair in query_str.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        query.insert(decode_query_component(k), decode_query_component(v));
    }
    (path.to_string(), query)
}

fn decode_query_component(raw: &str) -> String {
    percent_decode(&raw.replace('+', " "))
}

/// Decodes `%XX` escapes as UTF-8; malformed escapes are kept verbatim.
pub fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b == b'%' {
            let hi = bytes.get(i + 1).and_then(|c| hex_value(*c));
            let lo = bytes.get(i + 2).and_then(|c| hex_value(*c));
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(b);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
