//! Minimal server-sent events decoder over any buffered reader.

use std::io::BufRead;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; `None` means the default `message` type.
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    /// True for events delivered to a plain message handler.
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// Iterator of events read from `reader`.
///
/// `data:` lines are joined with newlines, comments (`:`) are skipped, a
/// blank line dispatches. A trailing event not closed by a blank line is
/// dropped at end of input.
pub struct SseReader<R> {
    reader: R,
    line: String,
    pending: SseEvent,
    has_data: bool,
}

impl<R: BufRead> SseReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            pending: SseEvent::default(),
            has_data: false,
        }
    }

    pub fn next_event(&mut self) -> std::io::Result<Option<SseEvent>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                if self.has_data {
                    tracing::debug!("Dropping unterminated event at end of log stream");
                }
                return Ok(None);
            }
            let line = self.line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    return Ok(Some(event));
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "data" => {
                    if self.has_data {
                        self.pending.data.push('\n');
                    }
                    self.pending.data.push_str(value);
                    self.has_data = true;
                }
                "event" => self.pending.event = Some(value.to_string()),
                "id" => self.pending.id = Some(value.to_string()),
                _ => {}
            }
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = std::mem::take(&mut self.pending);
        if !std::mem::replace(&mut self.has_data, false) {
            return None;
        }
        Some(event)
    }
}

impl<R: BufRead> Iterator for SseReader<R> {
    type Item = std::io::Result<SseEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
