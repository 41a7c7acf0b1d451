//! Packet framing over the rolling text buffer.
//!
//! The buffer is either IDLE (nothing awaiting a close) or OPEN (a `<DATA>`
//! has been seen and its `</DATA>` has not). Every [`FrameAssembler::feed`]
//! cleans the new text, appends it, pulls out every complete packet and
//! leaves behind only what may still become part of one.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::noise::is_noise;

pub const START_DELIMITER: &str = "<DATA>";
pub const END_DELIMITER: &str = "</DATA>";

pub const DEFAULT_MAX_BUFFER_BYTES: usize = 16 * 1024;

// Non-greedy: the first end delimiter after a start closes it.
static FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<DATA>(.*?)</DATA>").expect("invalid frame pattern"));

// CSI as terminals emit it: ESC [, digit/`;`/`?` parameters, final letter.
// `<` stays out of the parameters so a cut-off escape cannot eat `<DATA>`.
static ANSI_CSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("invalid escape pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Open,
}

#[derive(Debug)]
pub struct FrameAssembler {
    buffer: String,
    state: FrameState,
    max_buffer_bytes: usize,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER_BYTES)
    }
}

impl FrameAssembler {
    pub fn new(max_buffer_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            state: FrameState::Idle,
            max_buffer_bytes,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Appends `text` and returns the trimmed, non-empty contents of every
    /// packet it completes, in stream order.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(&clean(text));
        trace!(buffer = ?self.buffer, "buffer after append");

        let mut packets = Vec::new();
        let mut consumed = 0;
        for m in FRAME.captures_iter(&self.buffer) {
            if let Some(inner) = m.get(1) {
                let packet = inner.as_str().trim();
                if !packet.is_empty() {
                    packets.push(packet.to_owned());
                }
            }
            if let Some(whole) = m.get(0) {
                consumed = whole.end();
            }
        }

        self.buffer.drain(..consumed);
        self.settle_remainder();
        self.enforce_limit();

        packets
    }

    fn settle_remainder(&mut self) {
        if self.buffer.contains(START_DELIMITER) {
            self.state = FrameState::Open;
            return;
        }

        self.state = FrameState::Idle;

        if is_noise(&self.buffer) {
            let cut = self.buffer.len() - dangling_start(&self.buffer).len();
            if cut > 0 {
                debug!(noise = ?&self.buffer[..cut], "discarding noise from buffer");
                self.buffer.drain(..cut);
            }
        }
    }

    fn enforce_limit(&mut self) {
        if self.buffer.len() <= self.max_buffer_bytes {
            return;
        }

        if let Some(start) = self.buffer.rfind(START_DELIMITER) {
            self.buffer.drain(..start);
        }

        if self.buffer.len() > self.max_buffer_bytes {
            warn!(
                len = self.buffer.len(),
                limit = self.max_buffer_bytes,
                "buffer limit exceeded without a closing delimiter, discarding"
            );
            self.buffer.clear();
            self.state = FrameState::Idle;
        }
    }
}

/// Strips ANSI CSI sequences and every control character except tab and
/// the `\n` line separator.
pub fn clean(text: &str) -> String {
    ANSI_CSI
        .replace_all(text, "")
        .chars()
        .filter(|&c| !c.is_control() || c == '\t' || c == '\n')
        .collect()
}

/// The longest proper prefix of the start delimiter that `text` ends with.
fn dangling_start(text: &str) -> &str {
    (1..START_DELIMITER.len())
        .rev()
        .map(|n| &START_DELIMITER[..n])
        .find(|prefix| text.ends_with(prefix))
        .map_or("", |prefix| &text[text.len() - prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_packets_in_order_and_keeps_tail() {
        let mut a = FrameAssembler::default();

        let packets =
            a.feed("noise<DATA>1,2,3,4,5,6;</DATA>more<DATA>7,8,9,10,11,12;</DATA>tail");

        assert_eq!(packets, vec!["1,2,3,4,5,6;", "7,8,9,10,11,12;"]);
        assert_eq!(a.buffer(), "tail");
        assert_eq!(a.state(), FrameState::Idle);
    }

    #[test]
    fn noise_tail_is_discarded() {
        let mut a = FrameAssembler::default();

        let packets = a.feed("<DATA>1,2,3,4,5,6;</DATA>uart:~$ ");

        assert_eq!(packets, vec!["1,2,3,4,5,6;"]);
        assert_eq!(a.buffer(), "");
    }

    #[test]
    fn partial_frame_is_retained_across_feeds() {
        let mut a = FrameAssembler::default();

        assert!(a.feed("<DATA>1,2,3").is_empty());
        assert_eq!(a.state(), FrameState::Open);
        assert_eq!(a.buffer(), "<DATA>1,2,3");

        let packets = a.feed(",4,5,6;</DATA>");

        assert_eq!(packets, vec!["1,2,3,4,5,6;"]);
        assert_eq!(a.state(), FrameState::Idle);
        assert_eq!(a.buffer(), "");
    }

    #[test]
    fn noise_is_idempotently_dropped() {
        let mut a = FrameAssembler::default();
        let noise = "uart:~$ sensor start\n[00:00:01.000] <inf> scd4x: init\nINFO: ready\n";

        for _ in 0..2 {
            assert!(a.feed(noise).is_empty());
            assert_eq!(a.buffer(), "");
            assert_eq!(a.state(), FrameState::Idle);
        }
    }

    #[test]
    fn open_remainder_is_kept_verbatim_even_if_noisy() {
        let mut a = FrameAssembler::default();

        a.feed("error: retry\n<DATA>400,");

        assert_eq!(a.buffer(), "error: retry\n<DATA>400,");
        assert_eq!(a.state(), FrameState::Open);
    }

    #[test]
    fn escape_sequences_inside_delimiters_are_removed() {
        let mut a = FrameAssembler::default();

        let packets = a.feed("<DA\x1b[0mTA>400,22,\x1b[1;32m50,100,8,20;\x00</DATA>");

        assert_eq!(packets, vec!["400,22,50,100,8,20;"]);
    }

    #[test]
    fn truncated_escape_before_frame_keeps_packet() {
        let mut a = FrameAssembler::default();

        let packets = a.feed("uart:~$ \x1b[<DATA>400,22,50,100,8,20;</DATA>\n");

        assert_eq!(packets, vec!["400,22,50,100,8,20;"]);
        assert_eq!(a.buffer(), "");
    }

    #[test]
    fn remainder_starting_with_log_line_is_discarded() {
        let mut a = FrameAssembler::default();

        let packets = a.feed("<DATA>1,2,3,4,5,6;</DATA>[00:01] boot\n400,22\n");

        assert_eq!(packets, vec!["1,2,3,4,5,6;"]);
        assert_eq!(a.buffer(), "");
        assert_eq!(a.state(), FrameState::Idle);
    }

    #[test]
    fn empty_packets_are_skipped() {
        let mut a = FrameAssembler::default();

        assert!(a.feed("<DATA>  </DATA><DATA></DATA>").is_empty());
        assert_eq!(a.buffer(), "");
    }

    #[test]
    fn first_end_closes_the_frame() {
        let mut a = FrameAssembler::default();

        let packets = a.feed("<DATA>a<DATA>b</DATA>c</DATA>");

        assert_eq!(packets, vec!["a<DATA>b"]);
        assert_eq!(a.buffer(), "c</DATA>");
    }

    #[test]
    fn split_start_delimiter_survives_noise_discard() {
        let mut a = FrameAssembler::default();

        a.feed("info: tick <DA");
        assert_eq!(a.buffer(), "<DA");

        let packets = a.feed("TA>1,2,3,4,5,6;</DATA>");
        assert_eq!(packets, vec!["1,2,3,4,5,6;"]);
    }

    #[test]
    fn line_separators_are_kept_between_lines() {
        let mut a = FrameAssembler::default();

        a.feed("<DATA>co2 400\n");
        let packets = a.feed("temp 22\r\n</DATA>");

        assert_eq!(packets, vec!["co2 400\ntemp 22"]);
    }

    #[test]
    fn oversized_open_frame_is_cut_to_last_start() {
        let mut a = FrameAssembler::new(32);

        a.feed("0123456789012345678901234567890123456789<DATA>1,2");

        assert_eq!(a.buffer(), "<DATA>1,2");
        assert_eq!(a.state(), FrameState::Open);
    }

    #[test]
    fn frame_that_never_closes_is_dropped() {
        let mut a = FrameAssembler::new(16);

        a.feed("<DATA>1,2,3,4,5,6,7,8,9,10,11,12");

        assert_eq!(a.buffer(), "");
        assert_eq!(a.state(), FrameState::Idle);
    }

    #[test]
    fn clean_keeps_tab_and_newline() {
        assert_eq!(clean("a\tb\nc\r\x07\x7f\u{85}d"), "a\tb\ncd");
    }
}
