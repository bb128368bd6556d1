use std::collections::BTreeSet;

/// Switchboard dialogue-act labels accepted by default
pub const SWITCHBOARD_LABELS: &[&str] = &[
    "q", "s", "b", "f", "a", "*", "+", "^2", "^c", "^d", "^e", "^g", "^h", "^m", "^q", "^t",
    "aap", "ad", "aa", "am", "ar", "arp", "b", "ba", "bd", "bf", "bk", "br", "by", "cc", "co",
    "fa", "fc", "fe", "fp", "ft", "fw", "fx", "na", "nd", "ng", "nn", "no", "ny", "o", "oo",
    "qh", "qo", "qr", "qrr", "qw", "qy", "sd", "sv",
];

/// Closed, case-sensitive set of dialogue-act labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueActVocab {
    labels: BTreeSet<String>,
}

impl Default for DialogueActVocab {
    fn default() -> Self {
        Self::new(SWITCHBOARD_LABELS.iter().copied())
    }
}

impl DialogueActVocab {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one label per line; blank lines and `#` comments are ignored
    pub fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
