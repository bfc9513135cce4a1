//! Deciding what a user message asks a quiz about.

const QUIZ_TRIGGERS: [&str; 3] = ["quiz", "test", "question"];

// Order matters: the first marker found anywhere in the text wins.
const TOPIC_MARKERS: [&str; 6] = [
    "quiz on",
    "test on",
    "questions on",
    "quiz about",
    "test about",
    "questions about",
];

pub fn should_attempt_quiz(text: &str) -> bool {
    let lowered = text.to_lowercase();
    QUIZ_TRIGGERS.iter().any(|trigger| lowered.contains(trigger))
}

/// Text after the first matching marker phrase, trimmed. Without a marker the
/// whole text is the topic.
pub fn extract_topic(text: &str) -> String {
    // ASCII folding keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();

    for marker in TOPIC_MARKERS {
        if let Some(index) = lowered.find(marker) {
            return text[index + marker.len()..].trim().to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_are_case_insensitive() {
        assert!(should_attempt_quiz("Give me a QUIZ"));
        assert!(should_attempt_quiz("any Questions?"));
        assert!(should_attempt_quiz("a quick test"));
        assert!(!should_attempt_quiz("Photosynthesis"));
    }

    #[test]
    fn topic_follows_marker() {
        assert_eq!(extract_topic("Give me a quiz on Photosynthesis"), "Photosynthesis");
        assert_eq!(extract_topic("QUIZ ON Rome"), "Rome");
        assert_eq!(extract_topic("some questions about   the Moon  "), "the Moon");
    }

    #[test]
    fn no_marker_returns_text_unchanged() {
        assert_eq!(extract_topic("Photosynthesis"), "Photosynthesis");
        assert_eq!(extract_topic("  spaced  "), "  spaced  ");
    }

    #[test]
    fn marker_priority_beats_position() {
        assert_eq!(extract_topic("test about X quiz on Y"), "Y");
        assert_eq!(extract_topic("quiz about X test on Y"), "Y");
        assert_eq!(extract_topic("questions on A test on B"), "B");
    }

    #[test]
    fn marker_at_end_gives_empty_topic() {
        assert_eq!(extract_topic("make me a quiz on"), "");
    }

    #[test]
    fn non_ascii_topics_survive_slicing() {
        assert_eq!(extract_topic("İstanbul quiz about Ünïcödé"), "Ünïcödé");
    }
}
