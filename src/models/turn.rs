use super::{Speaker, TranscriptLine};

/// The accumulated (label, text) of the turn being built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    pub label: String,
    pub text: String,
}

impl Turn {
    /// Start a turn from an accepted line
    pub fn from_line(line: &TranscriptLine) -> Self {
        Self {
            label: line.label.clone(),
            text: line.text.clone(),
        }
    }

    /// A turn is only written out when neither field is empty
    pub fn is_complete(&self) -> bool {
        !self.label.is_empty() && !self.text.is_empty()
    }

    /// Merge a continuation utterance onto the turn
    pub fn extend(&mut self, text: &str) {
        self.text.push(' ');
        self.text.push_str(text);
    }
}

/// Per-file normalizer state, threaded explicitly through each step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Speaker of the accumulated turn, `None` when unset
    pub last_speaker: Option<Speaker>,
    /// Turn accumulator
    pub turn: Turn,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the speaker and clear the accumulator
    pub fn reset(&mut self) {
        self.last_speaker = None;
        self.turn = Turn::default();
    }

    /// Whether `speaker` continues the turn of the last accepted speaker
    pub fn is_same_speaker(&self, speaker: Speaker) -> bool {
        self.last_speaker == Some(speaker)
    }
}
