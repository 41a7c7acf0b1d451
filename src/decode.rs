//! Byte-to-text conversion for the serial stream.
//!
//! Strategies are tried in order and the first one that accepts the bytes
//! wins. Latin-1 maps every byte to a character, so the chain always ends
//! there; the lossy UTF-8 step after it is the documented terminal case and
//! is never reached in practice.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Latin1,
    Utf8Lossy,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
            Encoding::Utf8Lossy => "utf-8 (lossy)",
        }
    }

    /// Anything other than plain ASCII means the link delivered bytes the
    /// sensor protocol does not use.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Encoding::Ascii)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: Encoding,
}

type Strategy = fn(&[u8]) -> Option<Cow<'_, str>>;

const CHAIN: &[(Encoding, Strategy)] = &[
    (Encoding::Ascii, decode_ascii),
    (Encoding::Latin1, decode_latin1),
    (Encoding::Utf8Lossy, decode_utf8_lossy),
];

/// Decodes `bytes` and strips trailing record separators (`\r`, `\n`).
pub fn decode(bytes: &[u8]) -> Decoded {
    for (encoding, strategy) in CHAIN {
        if let Some(text) = strategy(bytes) {
            return Decoded {
                text: text.trim_end_matches(['\r', '\n']).to_owned(),
                encoding: *encoding,
            };
        }
    }

    // The chain ends in total strategies; this only guards an edit to CHAIN.
    Decoded {
        text: String::new(),
        encoding: Encoding::Utf8Lossy,
    }
}

fn decode_ascii(bytes: &[u8]) -> Option<Cow<'_, str>> {
    if !bytes.is_ascii() {
        return None;
    }

    std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
}

fn decode_latin1(bytes: &[u8]) -> Option<Cow<'_, str>> {
    Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect()))
}

fn decode_utf8_lossy(bytes: &[u8]) -> Option<Cow<'_, str>> {
    Some(String::from_utf8_lossy(bytes))
}
