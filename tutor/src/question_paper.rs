use crate::models::ResponseLanguage;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const QUESTION_SETTER_PERSONA: &str = "You are a maths tutor and you have to make some questions. \
If another question paper is uploaded then make questions on same topic.";

pub const MAX_QUESTIONS: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Medium => f.write_str("Medium"),
            Difficulty::Hard => f.write_str("Hard"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    FillInTheBlanks,
    ShortAnswer,
    TrueFalse,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestionKind::MultipleChoice => "Multiple Choice Questions",
            QuestionKind::FillInTheBlanks => "Fill in the Blanks",
            QuestionKind::ShortAnswer => "Short Answer Type",
            QuestionKind::TrueFalse => "True and False",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("question count must be between 1 and 50, got {0}")]
pub struct InvalidQuestionCount(pub u32);

/// Parameters for generating an exam paper from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPaperRequest {
    pub count: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub language: ResponseLanguage,
}

impl QuestionPaperRequest {
    pub fn validate(&self) -> Result<(), InvalidQuestionCount> {
        if (1..=MAX_QUESTIONS).contains(&self.count) {
            Ok(())
        } else {
            Err(InvalidQuestionCount(self.count))
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Generate {} questions to ask students in examinations in {} of {} with difficulty {} \
from the content of this document and list their answers after listing all the questions.",
            self.count, self.language, self.kind, self.difficulty
        )
    }
}
