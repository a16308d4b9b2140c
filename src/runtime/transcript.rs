use crate::runtime::Choice;
use std::fmt;

/// Who produced a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Bot,
    User,
}

/// One line of a conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.speaker {
            Speaker::Bot => write!(f, "Bot: {}", self.text),
            Speaker::User => write!(f, "You: {}", self.text),
        }
    }
}

/// Formats transcripts and choice lists into human-readable strings
pub struct TranscriptFormatter;

impl TranscriptFormatter {
    /// Format a whole conversation, one speaker-tagged line per entry.
    pub fn format_conversation(entries: &[TranscriptEntry]) -> String {
        let mut result = String::new();
        for entry in entries {
            result.push_str(&entry.to_string());
            result.push('\n');
        }
        result
    }

    /// Format the numbered reply list shown below a menu.
    pub fn format_choices(choices: &[Choice]) -> String {
        let mut result = String::new();
        for (index, choice) in choices.iter().enumerate() {
            result.push_str(&format!("  [{}] {}\n", index + 1, choice.label));
        }
        result
    }
}
