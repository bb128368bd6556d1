use crate::error::{Irregularity, LineError};

/// One of the two conversation participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    /// Strict lookup used by the aligner: only "A" and "B" are speakers
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(Speaker::A),
            "B" => Some(Speaker::B),
            _ => None,
        }
    }

    /// Agent lookup used by the normalizer: anything other than "A" is B
    pub fn from_agent(letter: &str) -> Self {
        if letter == "A" { Speaker::A } else { Speaker::B }
    }
}

/// A dialogue-act annotated line from a `.utt` transcript
///
/// Shape: `label  A.12  utt3  text of the utterance`, separated by runs of
/// whitespace, with the text keeping its inner whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    /// Dialogue-act label, e.g. "sv"
    pub label: String,
    /// Who is speaking
    pub speaker: Speaker,
    /// Conversation number from the speaker tag
    pub conversation: i64,
    /// Index of this utterance within the speaker's turn (1-based)
    pub utterance: i64,
    /// Utterance text, trimmed
    pub text: String,
    /// The raw line carried an `@` disfluency marker
    pub disfluent: bool,
}

impl TranscriptLine {
    /// Parse a raw line, line terminator optional
    pub fn parse(raw: &str) -> Result<Self, LineError> {
        let content = raw.trim_end_matches(['\n', '\r']);
        if content.chars().count() < 2 {
            return Err(LineError::Irregular(Irregularity::Blank));
        }
        let content = if content.starts_with(' ') {
            content.trim()
        } else {
            content
        };

        let fields = split_fields(content, 4);
        let [label, speaker_tag, index, text] = fields.as_slice() else {
            return Err(LineError::Irregular(Irregularity::NotARecord));
        };

        if text.chars().count() <= 1 {
            return Err(LineError::Irregular(Irregularity::EmptyUtterance));
        }

        let (agent, conversation) = speaker_tag
            .split_once('.')
            .ok_or_else(|| LineError::MissingSpeakerSeparator(speaker_tag.to_string()))?;
        let conversation: i64 = conversation
            .parse()
            .map_err(|_| LineError::InvalidConversationNumber(conversation.to_string()))?;

        let digits: String = index.chars().skip(3).collect();
        let utterance: i64 = digits
            .parse()
            .map_err(|_| LineError::InvalidUtteranceIndex(index.to_string()))?;

        Ok(Self {
            label: label.to_string(),
            speaker: Speaker::from_agent(agent),
            conversation,
            utterance,
            text: text.to_string(),
            disfluent: raw.contains('@'),
        })
    }

    /// Whether the utterance text opens with a lowercase letter
    pub fn starts_lowercase(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_lowercase)
    }
}

/// A line from a tab-separated aligned transcript: `label\tA.3\ttext`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabbedLine {
    pub label: String,
    /// `None` when the tag names neither A nor B
    pub speaker: Option<Speaker>,
    /// Whatever follows the speaker letter in the tag
    pub sub_label: String,
    /// Missing on two-field lines; only needed once the line joins a pair
    pub text: Option<String>,
}

impl TabbedLine {
    pub fn parse(raw: &str) -> Result<Self, LineError> {
        let content = raw.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = content.split('\t').collect();
        if fields.len() < 2 {
            return Err(LineError::TooFewFields {
                expected: 2,
                found: fields.len(),
            });
        }

        let (letter, sub_label) = fields[1]
            .split_once('.')
            .ok_or_else(|| LineError::MissingSpeakerSeparator(fields[1].to_string()))?;

        Ok(Self {
            label: fields[0].to_string(),
            speaker: Speaker::from_letter(letter),
            sub_label: sub_label.to_string(),
            text: fields.get(2).map(|t| t.to_string()),
        })
    }

    /// The utterance text, required when the line is written into a pair
    pub fn require_text(&self) -> Result<&str, LineError> {
        self.text.as_deref().ok_or(LineError::TooFewFields {
            expected: 3,
            found: 2,
        })
    }
}

/// Split on runs of whitespace into at most `max` trimmed fields; the last
/// field keeps everything that remains.
fn split_fields(s: &str, max: usize) -> Vec<&str> {
    let mut fields = Vec::with_capacity(max);
    let mut rest = s;

    while fields.len() + 1 < max {
        let Some(start) = rest.find(char::is_whitespace) else {
            break;
        };
        fields.push(&rest[..start]);
        let tail = &rest[start..];
        let skip = tail
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(tail.len());
        rest = &tail[skip..];
    }
    fields.push(rest);

    fields.into_iter().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utt_line() {
        let line = TranscriptLine::parse("sv          A.1 utt2: and i think so /\n").unwrap_err();
        // "utt2:" is not a number
        assert_eq!(line, LineError::InvalidUtteranceIndex("utt2:".to_string()));

        let line = TranscriptLine::parse("sv  A.12 utt2  and i   think so\n").unwrap();
        assert_eq!(line.label, "sv");
        assert_eq!(line.speaker, Speaker::A);
        assert_eq!(line.conversation, 12);
        assert_eq!(line.utterance, 2);
        assert_eq!(line.text, "and i   think so");
        assert!(!line.disfluent);
        assert!(line.starts_lowercase());
    }

    #[test]
    fn test_parse_marks_disfluency_from_raw_line() {
        let line = TranscriptLine::parse("b@ B.4 utt1 Uh-huh.").unwrap();
        assert_eq!(line.speaker, Speaker::B);
        assert!(line.disfluent);
        assert!(!line.starts_lowercase());
    }

    #[test]
    fn test_leading_space_is_trimmed() {
        let line = TranscriptLine::parse("  qy A.1 utt1 Do you?").unwrap();
        assert_eq!(line.label, "qy");
        assert_eq!(line.text, "Do you?");
    }

    #[test]
    fn test_irregular_lines() {
        assert_eq!(
            TranscriptLine::parse("\n"),
            Err(LineError::Irregular(Irregularity::Blank))
        );
        assert_eq!(
            TranscriptLine::parse("=================================\n"),
            Err(LineError::Irregular(Irregularity::NotARecord))
        );
        assert_eq!(
            TranscriptLine::parse("FILENAME:\t4325_1632_1519\n"),
            Err(LineError::Irregular(Irregularity::NotARecord))
        );
        assert_eq!(
            TranscriptLine::parse("b A.1 utt1 /"),
            Err(LineError::Irregular(Irregularity::EmptyUtterance))
        );
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(
            TranscriptLine::parse("sv A1 utt1 hello there"),
            Err(LineError::MissingSpeakerSeparator("A1".to_string()))
        );
        assert_eq!(
            TranscriptLine::parse("sv A.x utt1 hello there"),
            Err(LineError::InvalidConversationNumber("x".to_string()))
        );
        assert_eq!(
            TranscriptLine::parse("sv A.1.2 utt1 hello there"),
            Err(LineError::InvalidConversationNumber("1.2".to_string()))
        );
    }

    #[test]
    fn test_signed_numbers_are_accepted() {
        let line = TranscriptLine::parse("sd A.-3 utt-1 odd numbering here").unwrap();
        assert_eq!(line.conversation, -3);
        assert_eq!(line.utterance, -1);

        let line = TranscriptLine::parse("sd B.+4 utt+2 plus signs too").unwrap();
        assert_eq!(line.conversation, 4);
        assert_eq!(line.utterance, 2);
    }

    #[test]
    fn test_non_a_agent_is_b() {
        let line = TranscriptLine::parse("sd C.7 utt1 something here").unwrap();
        assert_eq!(line.speaker, Speaker::B);
    }

    #[test]
    fn test_parse_tabbed_line() {
        let line = TabbedLine::parse("qy\tA.3\tdo you have kids\n").unwrap();
        assert_eq!(line.label, "qy");
        assert_eq!(line.speaker, Some(Speaker::A));
        assert_eq!(line.sub_label, "3");
        assert_eq!(line.text.as_deref(), Some("do you have kids"));
        assert_eq!(line.require_text(), Ok("do you have kids"));

        let line = TabbedLine::parse("sd\tX.3\tnobody").unwrap();
        assert_eq!(line.speaker, None);
    }

    #[test]
    fn test_two_field_tabbed_line_has_no_text() {
        let line = TabbedLine::parse("x\tA.3\n").unwrap();
        assert_eq!(line.speaker, Some(Speaker::A));
        assert_eq!(line.text, None);
        assert_eq!(
            line.require_text(),
            Err(LineError::TooFewFields {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_tabbed_line_errors() {
        assert_eq!(
            TabbedLine::parse("qy A.3 do you have kids"),
            Err(LineError::TooFewFields {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            TabbedLine::parse("qy\tA3\tdo you"),
            Err(LineError::MissingSpeakerSeparator("A3".to_string()))
        );
    }

    #[test]
    fn test_split_fields() {
        assert_eq!(split_fields("a  b\tc d e", 4), vec!["a", "b", "c", "d e"]);
        assert_eq!(split_fields("a b", 4), vec!["a", "b"]);
        assert_eq!(split_fields("a b ", 4), vec!["a", "b", ""]);
    }
}
