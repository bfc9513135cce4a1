pub mod client;

use std::fmt::Write as _;

use thiserror::Error;

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Why a quiz could not be produced. The display text is what ends up in the
/// error turn shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("Error fetching quiz: {0}")]
    Transport(String),
    #[error("Error parsing quiz data: {0}")]
    MalformedResponse(String),
}

/// Body of a successful `/getQuiz` response, exactly as the service sends it.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct QuizPayload {
    pub quiz: Vec<QuestionPayload>,
}

impl QuizPayload {
    pub fn from_json(body: &str) -> Result<Self, QuizError> {
        serde_json::from_str(body).map_err(|e| QuizError::MalformedResponse(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct QuestionPayload {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: [String; 4],
    pub correct_answer: String,
}

impl TryFrom<&QuestionPayload> for QuizQuestion {
    type Error = QuizError;

    fn try_from(payload: &QuestionPayload) -> Result<Self, Self::Error> {
        let options: [String; 4] = payload.options.clone().try_into().map_err(|o: Vec<String>| {
            QuizError::MalformedResponse(format!(
                "question \"{}\" has {} options, expected 4",
                payload.question,
                o.len()
            ))
        })?;
        let correct_answer = payload.correct_answer.clone().ok_or_else(|| {
            QuizError::MalformedResponse(format!(
                "question \"{}\" has no correct_answer",
                payload.question
            ))
        })?;

        Ok(Self {
            question: payload.question.clone(),
            options,
            correct_answer,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self { questions }
    }

    /// Validates every question of the payload; the first bad one fails the
    /// whole quiz.
    pub fn from_payload(questions: &[QuestionPayload]) -> Result<Self, QuizError> {
        let questions = questions
            .iter()
            .map(QuizQuestion::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(questions))
    }

    pub fn render(&self, topic: &str) -> String {
        let mut text = format!("Here's your quiz on {}:\n\n", topic);

        for (number, question) in self.questions.iter().enumerate() {
            // Writing into a String cannot fail
            let _ = writeln!(text, "**QUESTION {}:** {}", number + 1, question.question);
            for (label, option) in OPTION_LABELS.iter().zip(&question.options) {
                let _ = writeln!(text, "**OPTION {}:** {}", label, option);
            }
            let _ = write!(text, "**ANS:** {}\n\n", question.correct_answer);
        }

        text
    }
}

pub fn format_quiz_as_text(topic: &str, questions: &[QuestionPayload]) -> Result<String, QuizError> {
    Ok(Quiz::from_payload(questions)?.render(topic))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, options: &[&str], answer: Option<&str>) -> QuestionPayload {
        QuestionPayload {
            question: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: answer.map(str::to_string),
        }
    }

    #[test]
    fn renders_header_and_labelled_questions() {
        let questions = vec![
            question(
                "Who founded Rome?",
                &["Romulus", "Caesar", "Nero", "Augustus"],
                Some("Romulus"),
            ),
            question("Capital of Italy?", &["Milan", "Rome", "Turin", "Naples"], Some("Rome")),
        ];

        let text = format_quiz_as_text("Rome", &questions).unwrap();

        assert_eq!(
            text,
            "Here's your quiz on Rome:\n\n\
             **QUESTION 1:** Who founded Rome?\n\
             **OPTION A:** Romulus\n\
             **OPTION B:** Caesar\n\
             **OPTION C:** Nero\n\
             **OPTION D:** Augustus\n\
             **ANS:** Romulus\n\n\
             **QUESTION 2:** Capital of Italy?\n\
             **OPTION A:** Milan\n\
             **OPTION B:** Rome\n\
             **OPTION C:** Turin\n\
             **OPTION D:** Naples\n\
             **ANS:** Rome\n\n"
        );
    }

    #[test]
    fn empty_quiz_is_just_the_header() {
        assert_eq!(
            format_quiz_as_text("Nothing", &[]).unwrap(),
            "Here's your quiz on Nothing:\n\n"
        );
    }

    #[test]
    fn wrong_option_count_is_malformed() {
        let three = vec![question("Q", &["a", "b", "c"], Some("a"))];
        let five = vec![question("Q", &["a", "b", "c", "d", "e"], Some("a"))];

        for questions in [three, five] {
            let err = format_quiz_as_text("T", &questions).unwrap_err();
            assert!(matches!(err, QuizError::MalformedResponse(_)), "{err:?}");
        }
    }

    #[test]
    fn missing_correct_answer_is_malformed() {
        let questions = vec![question("Q", &["a", "b", "c", "d"], None)];
        let err = format_quiz_as_text("T", &questions).unwrap_err();
        assert!(err.to_string().starts_with("Error parsing quiz data: "));
        assert!(err.to_string().contains("correct_answer"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let questions = vec![question("Q", &["a", "b", "c", "d"], Some("b"))];
        assert_eq!(
            format_quiz_as_text("T", &questions).unwrap(),
            format_quiz_as_text("T", &questions).unwrap()
        );
    }

    #[test]
    fn parses_service_json() {
        let body = r#"{"quiz":[{"question":"2+2?","options":["1","2","3","4"],"correct_answer":"4"}]}"#;
        let payload = QuizPayload::from_json(body).unwrap();
        assert_eq!(payload.quiz.len(), 1);
        assert_eq!(payload.quiz[0].correct_answer.as_deref(), Some("4"));
    }

    #[test]
    fn json_without_quiz_field_is_malformed() {
        let err = QuizPayload::from_json(r#"{"questions":[]}"#).unwrap_err();
        assert!(matches!(err, QuizError::MalformedResponse(_)));
        assert!(QuizPayload::from_json("<html>").is_err());
    }
}
