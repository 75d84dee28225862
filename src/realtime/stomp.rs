//! STOMP 1.2 frames.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// One decoded unit from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Frame(Frame),
    Heartbeat,
}

impl Frame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value for `name`; repeated headers keep the first occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn connect(host: &str, heartbeat: (Duration, Duration), extra: &[(String, String)]) -> Self {
        let mut frame = Frame::new("CONNECT")
            .header("accept-version", "1.2,1.1,1.0")
            .header("host", host)
            .header(
                "heart-beat",
                format!("{},{}", heartbeat.0.as_millis(), heartbeat.1.as_millis()),
            );
        for (k, v) in extra {
            frame = frame.header(k, v.clone());
        }
        frame
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new("SUBSCRIBE")
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn unsubscribe(id: &str) -> Self {
        Frame::new("UNSUBSCRIBE").header("id", id)
    }

    pub fn send(destination: &str, body: &str) -> Self {
        Frame::new("SEND")
            .header("destination", destination)
            .header("content-type", "application/json")
            .body(body.as_bytes().to_vec())
    }

    pub fn disconnect(receipt: &str) -> Self {
        Frame::new("DISCONNECT").header("receipt", receipt)
    }

    fn escapes_headers(&self) -> bool {
        self.command != "CONNECT" && self.command != "CONNECTED"
    }

    pub fn encode(&self) -> Vec<u8> {
        let escape = self.escapes_headers();
        let mut out = Vec::with_capacity(64 + self.body.len());
        out.extend_from_slice(self.command.as_bytes());
        out.push(b'\n');

        for (k, v) in &self.headers {
            if escape {
                out.extend_from_slice(escape_header(k).as_bytes());
                out.push(b':');
                out.extend_from_slice(escape_header(v).as_bytes());
            } else {
                out.extend_from_slice(k.as_bytes());
                out.push(b':');
                out.extend_from_slice(v.as_bytes());
            }
            out.push(b'\n');
        }

        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.extend_from_slice(format!("content-length:{}\n", self.body.len()).as_bytes());
        }

        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }

    /// Text form for transports that only carry strings (SockJS).
    pub fn encode_text(&self) -> String {
        String::from_utf8_lossy(&self.encode()).into_owned()
    }
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => return Err(format!("Invalid header escape: \\{}", other.unwrap_or(' '))),
        }
    }
    Ok(out)
}

/// Largest frame the decoder will buffer.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Incremental decoder; frames may be split or batched arbitrarily.
#[derive(Debug)]
pub struct Decoder {
    buf: Vec<u8>,
    limit: usize,
    /// Bytes already searched for the end of the frame head.
    head_scanned: usize,
    /// Bytes already searched for the NUL ending a body without `content-length`.
    body_scanned: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::with_limit(MAX_FRAME_SIZE)
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            head_scanned: 0,
            body_scanned: 0,
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    fn consume(&mut self, n: usize) {
        self.buf.drain(..n);
        self.head_scanned = 0;
        self.body_scanned = 0;
    }

    fn too_large(&self) -> String {
        format!("Frame exceeds {} bytes", self.limit)
    }

    /// Next complete unit, or `Ok(None)` if more bytes are needed.
    pub fn next(&mut self) -> Result<Option<Incoming>, String> {
        match self.buf.first() {
            None => return Ok(None),
            Some(b'\n') => {
                self.consume(1);
                return Ok(Some(Incoming::Heartbeat));
            }
            Some(b'\r') => {
                if self.buf.len() < 2 {
                    return Ok(None);
                }
                if self.buf[1] == b'\n' {
                    self.consume(2);
                    return Ok(Some(Incoming::Heartbeat));
                }
            }
            _ => {}
        }

        // Step back far enough to catch a separator split across pushes.
        let from = self.head_scanned.saturating_sub(3);
        let lf = find(&self.buf[from..], b"\n\n").map(|i| (from + i, 2));
        let crlf = find(&self.buf[from..], b"\r\n\r\n").map(|i| (from + i, 4));
        let Some((head_len, sep_len)) = [lf, crlf].into_iter().flatten().min() else {
            self.head_scanned = self.buf.len();
            if self.buf.len() > self.limit {
                return Err(self.too_large());
            }
            return Ok(None);
        };
        let body_start = head_len + sep_len;

        let head = std::str::from_utf8(&self.buf[..head_len])
            .map_err(|e| format!("Frame head is not UTF-8: {e}"))?;
        let mut lines = head.split('\n').map(|l| l.trim_end_matches('\r'));
        let command = lines
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| "Frame without command".to_string())?
            .to_string();
        let escape = command != "CONNECT" && command != "CONNECTED";

        let mut headers = Vec::new();
        for line in lines {
            let (k, v) = line
                .split_once(':')
                .ok_or_else(|| format!("Malformed header line: {line}"))?;
            if escape {
                headers.push((unescape_header(k)?, unescape_header(v)?));
            } else {
                headers.push((k.to_string(), v.to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .map(|(_, v)| v.trim().parse::<usize>())
            .transpose()
            .map_err(|e| format!("Invalid content-length: {e}"))?;

        let body_end = match content_length {
            Some(len) => {
                if body_start + len + 1 > self.limit {
                    return Err(self.too_large());
                }
                if self.buf.len() < body_start + len + 1 {
                    return Ok(None);
                }
                if self.buf[body_start + len] != 0 {
                    return Err("Frame body not NUL-terminated".to_string());
                }
                body_start + len
            }
            None => {
                let from = self.body_scanned.max(body_start);
                match self.buf[from..].iter().position(|b| *b == 0) {
                    Some(pos) => from + pos,
                    None => {
                        self.body_scanned = self.buf.len();
                        if self.buf.len() > self.limit {
                            return Err(self.too_large());
                        }
                        return Ok(None);
                    }
                }
            }
        };

        let body = self.buf[body_start..body_end].to_vec();
        self.consume(body_end + 1);

        Ok(Some(Incoming::Frame(Frame {
            command,
            headers,
            body,
        })))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Negotiated heart-beat periods as `(send every, expect within)`; `None` disables.
pub fn negotiate_heartbeat(
    client: (Duration, Duration),
    server_header: Option<&str>,
) -> (Option<Duration>, Option<Duration>) {
    let (sx, sy) = server_header
        .and_then(|h| h.split_once(','))
        .and_then(|(a, b)| Some((a.trim().parse::<u64>().ok()?, b.trim().parse::<u64>().ok()?)))
        .unwrap_or((0, 0));
    let (cx, cy) = (client.0.as_millis() as u64, client.1.as_millis() as u64);

    let outgoing = (cx != 0 && sy != 0).then(|| Duration::from_millis(cx.max(sy)));
    let incoming = (sx != 0 && cy != 0).then(|| Duration::from_millis(sx.max(cy)));
    (outgoing, incoming)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Incoming> {
        let mut decoder = Decoder::new();
        decoder.push(bytes);
        let mut out = Vec::new();
        while let Some(item) = decoder.next().unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn encodes_send_with_content_length() {
        let bytes = Frame::send("/app/chat/1", "{\"content\":\"hi\"}").encode();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("SEND\ndestination:/app/chat/1\n"));
        assert!(text.contains("content-length:16\n"));
        assert!(text.ends_with("\n\n{\"content\":\"hi\"}\0"));
    }

    #[test]
    fn header_escaping_round_trips_except_connect() {
        let frame = Frame::new("MESSAGE").header("x-note", "a:b\nc\\d");
        let text = frame.encode_text();
        assert!(text.contains("x-note:a\\cb\\nc\\\\d\n"));
        assert_eq!(decode_all(text.as_bytes()), vec![Incoming::Frame(frame)]);

        let connect = Frame::new("CONNECT").header("passcode", "a:b");
        assert!(connect.encode_text().contains("passcode:a:b\n"));
    }

    #[test]
    fn decodes_split_and_batched_frames() {
        let a = Frame::new("MESSAGE")
            .header("destination", "/topic/notifications/u1")
            .body("{\"id\":1}")
            .encode();
        let b = Frame::new("RECEIPT").header("receipt-id", "r-1").encode();

        let mut decoder = Decoder::new();
        decoder.push(&a[..10]);
        assert_eq!(decoder.next().unwrap(), None);
        decoder.push(&a[10..]);
        decoder.push(b"\n");
        decoder.push(&b);

        let Some(Incoming::Frame(first)) = decoder.next().unwrap() else {
            panic!("expected frame");
        };
        assert_eq!(first.command, "MESSAGE");
        assert_eq!(first.body_text(), "{\"id\":1}");
        assert_eq!(decoder.next().unwrap(), Some(Incoming::Heartbeat));
        let Some(Incoming::Frame(second)) = decoder.next().unwrap() else {
            panic!("expected frame");
        };
        assert_eq!(second.get("receipt-id"), Some("r-1"));
        assert_eq!(decoder.next().unwrap(), None);
    }

    #[test]
    fn content_length_allows_nul_in_body() {
        let mut raw = b"MESSAGE\ncontent-length:3\n\n".to_vec();
        raw.extend_from_slice(&[b'a', 0, b'b', 0]);
        let items = decode_all(&raw);
        let Incoming::Frame(frame) = &items[0] else {
            panic!("expected frame");
        };
        assert_eq!(frame.body, vec![b'a', 0, b'b']);
    }

    #[test]
    fn large_frame_arriving_in_pieces() {
        let body = "x".repeat(50_000);
        let mut raw = b"MESSAGE\ndestination:/topic/a".to_vec();
        raw.extend_from_slice(b"\n\n");
        raw.extend_from_slice(body.as_bytes());
        raw.push(0);

        let mut decoder = Decoder::new();
        let mut decoded = None;
        for chunk in raw.chunks(7) {
            decoder.push(chunk);
            if let Some(item) = decoder.next().unwrap() {
                decoded = Some(item);
            }
        }
        let Some(Incoming::Frame(frame)) = decoded else {
            panic!("expected frame");
        };
        assert_eq!(frame.get("destination"), Some("/topic/a"));
        assert_eq!(frame.body.len(), 50_000);
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let mut decoder = Decoder::with_limit(64);
        decoder.push(b"MESSAGE\ndestination:/topic/a\n\n");
        decoder.push(&[b'x'; 80]);
        assert!(decoder.next().is_err());

        let mut decoder = Decoder::with_limit(64);
        decoder.push(b"MESSAGE\ncontent-length:500\n\nabc");
        assert!(decoder.next().is_err());

        let mut decoder = Decoder::with_limit(64);
        decoder.push(&[b'H'; 100]);
        assert!(decoder.next().is_err());
    }

    #[test]
    fn crlf_heartbeat_and_headers() {
        let items = decode_all(b"\r\nCONNECTED\r\nversion:1.2\r\nheart-beat:0,0\r\n\r\n\0");
        assert_eq!(items[0], Incoming::Heartbeat);
        let Incoming::Frame(frame) = &items[1] else {
            panic!("expected frame");
        };
        assert_eq!(frame.get("version"), Some("1.2"));
    }

    #[test]
    fn heartbeat_negotiation() {
        let client = (Duration::from_millis(4000), Duration::from_millis(4000));
        assert_eq!(
            negotiate_heartbeat(client, Some("10000,0")),
            (None, Some(Duration::from_millis(10000)))
        );
        assert_eq!(
            negotiate_heartbeat(client, Some("1000,1000")),
            (
                Some(Duration::from_millis(4000)),
                Some(Duration::from_millis(4000))
            )
        );
        assert_eq!(negotiate_heartbeat(client, None), (None, None));
        assert_eq!(
            negotiate_heartbeat((Duration::ZERO, Duration::ZERO), Some("5000,5000")),
            (None, None)
        );
    }
}
