//! Incremental server-sent-event line parser.

/// A `data:` line together with the event name in effect when it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Splits a byte stream into SSE fields.
///
/// Chunks may end mid-line; the remainder is kept until the next push. An
/// `event:` line names every event that follows until the next `event:` line;
/// blank lines do not clear it. Every `data:` line becomes one [`SseEvent`].
#[derive(Debug, Default)]
pub struct SseParser {
    pending: Vec<u8>,
    event: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.handle_line(line.trim()) {
                events.push(event);
            }
        }
        events
    }

    fn handle_line(&mut self, line: &str) -> Option<SseEvent> {
        if let Some(name) = line.strip_prefix("event:") {
            self.event = Some(name.trim().to_string());
            None
        } else if let Some(data) = line.strip_prefix("data:") {
            Some(SseEvent {
                event: self.event.clone(),
                data: data.trim().to_string(),
            })
        } else {
            // blank lines, id:, retry: and ":" comments carry nothing we use
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_named_events() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event: attack\ndata: {\"a\":1}\n\nevent: heartbeat\ndata: ping\n\n");
        assert_eq!(
            events,
            vec![
                SseEvent {
                    event: Some("attack".into()),
                    data: "{\"a\":1}".into()
                },
                SseEvent {
                    event: Some("heartbeat".into()),
                    data: "ping".into()
                },
            ]
        );
    }

    #[test]
    fn test_handles_split_chunks_and_crlf() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: att").is_empty());
        assert!(parser.push(b"ack\r\ndata: {\"x\"").is_empty());
        let events = parser.push(b":2}\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("attack"));
        assert_eq!(events[0].data, "{\"x\":2}");
    }

    #[test]
    fn test_event_name_survives_blank_line() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event: attack\ndata: {\"a\":1}\n\ndata: {\"a\":2}\n: comment\nid: 7\n\n");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event.as_deref() == Some("attack")));
        assert_eq!(events[1].data, "{\"a\":2}");
    }

    #[test]
    fn test_data_before_any_event_is_unnamed() {
        let mut parser = SseParser::new();
        let events = parser.push(b"\ndata: orphan\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn test_multiple_data_lines_share_event() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event: attack\ndata: 1\ndata: 2\n");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event.as_deref() == Some("attack")));
    }
}
