use std::time::{Duration, Instant};

/// One keystroke as delivered by a keyboard-emulating RFID reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    /// Modifiers, arrows and anything else without a character
    Other,
}

impl Key {
    /// Maps a raw input byte; CR and LF both end a tag.
    pub fn from_byte(byte: u8) -> Key {
        match byte {
            b'\r' | b'\n' => Key::Enter,
            b if b.is_ascii_graphic() => Key::Char(b as char),
            _ => Key::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReadState {
    Idle,
    Reading { last_key_at: Instant },
}

/// Reassembles keystrokes into tags terminated by Enter.
///
/// A reader types a whole tag in one burst. With an idle timeout set, a partial
/// buffer older than the timeout is dropped before the next key, so stray human
/// typing never merges into the next scan.
#[derive(Debug)]
pub struct TagListener {
    state: ReadState,
    buffer: String,
    idle_timeout: Option<Duration>,
}

impl TagListener {
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self {
            state: ReadState::Idle,
            buffer: String::new(),
            idle_timeout,
        }
    }

    #[cfg(test)]
    pub fn is_reading(&self) -> bool {
        matches!(self.state, ReadState::Reading { .. })
    }

    /// Feeds one key; returns the completed tag when `key` is Enter.
    pub fn on_key(&mut self, key: Key, now: Instant) -> Option<String> {
        if let ReadState::Reading { last_key_at } = self.state {
            let stale = self
                .idle_timeout
                .is_some_and(|timeout| now.saturating_duration_since(last_key_at) > timeout);
            if stale {
                self.reset();
            }
        }

        match key {
            Key::Enter => {
                let tag = std::mem::take(&mut self.buffer);
                self.state = ReadState::Idle;
                (!tag.is_empty()).then_some(tag)
            }
            Key::Char(c) => {
                if self.state == ReadState::Idle {
                    self.buffer.clear();
                }
                self.buffer.push(c);
                self.state = ReadState::Reading { last_key_at: now };
                None
            }
            Key::Other => None,
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = ReadState::Idle;
    }
}
