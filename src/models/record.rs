use std::fmt;

use super::Turn;

/// An utterance by one speaker and the response that immediately follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub utterance_label: String,
    pub utterance: String,
    pub response_label: String,
    pub response: String,
}

impl AlignedPair {
    pub fn new(
        utterance_label: &str,
        utterance: &str,
        response_label: &str,
        response: &str,
    ) -> Self {
        Self {
            utterance_label: utterance_label.to_string(),
            utterance: utterance.to_string(),
            response_label: response_label.to_string(),
            response: response.to_string(),
        }
    }

    /// Pair two normalized rows
    pub fn from_rows(utterance: &NormalizedRow, response: &NormalizedRow) -> Self {
        Self::new(&utterance.label, &utterance.text, &response.label, &response.text)
    }
}

/// Tab-separated, without line terminator
impl fmt::Display for AlignedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.utterance_label,
            self.utterance.trim_end_matches(['\n', '\r']),
            self.response_label,
            self.response.trim_end_matches(['\n', '\r'])
        )
    }
}

/// One `label,text` row of normalized output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub label: String,
    pub text: String,
}

impl NormalizedRow {
    /// Build a row from a finished turn, replacing commas so the row keeps
    /// exactly two fields
    pub fn from_turn(turn: &Turn) -> Self {
        Self {
            label: turn.label.replace(',', " "),
            text: turn.text.replace(',', " "),
        }
    }

    /// Read a row back; `None` unless both fields are present and non-empty
    pub fn parse(line: &str) -> Option<Self> {
        let (label, text) = line.trim_end_matches(['\n', '\r']).split_once(',')?;
        if label.is_empty() || text.is_empty() || text.contains(',') {
            return None;
        }
        Some(Self {
            label: label.to_string(),
            text: text.to_string(),
        })
    }
}

impl fmt::Display for NormalizedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.label, self.text)
    }
}
