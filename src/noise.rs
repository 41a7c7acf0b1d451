use std::sync::LazyLock;

use regex::RegexSet;

// Matched against the lower-cased, trimmed line.
static NOISE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"uart:~?\$",
        r"^\$",
        r"^#",
        r"command not found",
        r"error:",
        r"failed:",
        r"warning:",
        r"debug:",
        r"info:",
        r"^\[.*\]",
        r"^\w+>",
        r"^>",
    ])
    .expect("invalid noise patterns")
});

/// Whether `text` is terminal prompt or log output rather than sensor data.
///
/// Multi-line text is judged as one string, so anchored patterns look at
/// its first line and the others may match anywhere. Empty and
/// whitespace-only text counts as noise.
pub fn is_noise(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return true;
    }

    NOISE_PATTERNS.is_match(&text)
}
