use thiserror::Error;

/// Corpus noise that is expected and skipped quietly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Irregularity {
    /// Empty or near-empty line
    Blank,
    /// Header, rule or other line without the full record shape
    NotARecord,
    /// Utterance text too short to carry any content
    EmptyUtterance,
}

impl std::fmt::Display for Irregularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Irregularity::Blank => "blank line",
            Irregularity::NotARecord => "not a record",
            Irregularity::EmptyUtterance => "empty utterance",
        };
        f.write_str(s)
    }
}

/// Failure to read one transcript line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("irregular line: {0}")]
    Irregular(Irregularity),

    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("speaker tag {0:?} has no '.' separator")]
    MissingSpeakerSeparator(String),

    #[error("conversation number {0:?} is not an integer")]
    InvalidConversationNumber(String),

    #[error("utterance index {0:?} is not of the form uttNNN")]
    InvalidUtteranceIndex(String),

    #[error("line is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

impl LineError {
    /// Whether this is ordinary corpus noise rather than a real parse failure
    pub fn is_irregular(&self) -> bool {
        matches!(self, LineError::Irregular(_))
    }
}
