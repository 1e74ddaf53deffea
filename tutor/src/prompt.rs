use crate::models::{ChatMessage, ResponseLanguage, Speaker, Transcript};
use std::fmt;
use std::str::FromStr;

/// Where the grounding document goes in an outbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroundingStrategy {
    /// Folded into the single system message.
    #[default]
    InlineSystem,
    /// Sent as a leading user message; the system message keeps only the persona.
    PrefaceUser,
}

impl fmt::Display for GroundingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundingStrategy::InlineSystem => f.write_str("inline-system"),
            GroundingStrategy::PrefaceUser => f.write_str("preface-user"),
        }
    }
}

impl FromStr for GroundingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "inline-system" => Ok(GroundingStrategy::InlineSystem),
            "preface-user" => Ok(GroundingStrategy::PrefaceUser),
            other => Err(format!("unknown grounding strategy '{other}'")),
        }
    }
}

/// The tutor instruction that opens every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// `{language}` is replaced with the response language.
    pub template: String,
    pub latex: bool,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            template: "You are a math tutor which replies in {language}.".to_string(),
            latex: false,
        }
    }
}

impl Persona {
    pub fn with_latex(mut self) -> Self {
        self.latex = true;
        self
    }

    pub fn fixed(instruction: impl Into<String>) -> Self {
        Self { template: instruction.into(), latex: false }
    }

    pub fn instruction(&self, language: ResponseLanguage) -> String {
        let mut instruction = self.template.replace("{language}", &language.to_string());
        if self.latex {
            instruction.push_str(" Give responses in latex.");
        }
        instruction
    }
}

pub fn inline_grounding(instruction: &str, grounding: &str) -> String {
    format!(
        "{instruction}\n\nUse the following document as authoritative context when answering:\n\n{grounding}"
    )
}

pub fn preface_grounding(grounding: &str) -> String {
    format!("The following is a document: {grounding}")
}

/// Assembles `[system, (document preface)?, ...transcript]`.
///
/// The system message is built fresh here and never stored. The whole
/// transcript is re-sent, along with the grounding text, on every call.
pub fn build_messages(
    persona: &Persona,
    strategy: GroundingStrategy,
    language: ResponseLanguage,
    grounding: Option<&str>,
    transcript: &Transcript,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(transcript.len() + 2);
    let instruction = persona.instruction(language);

    match (grounding, strategy) {
        (None, _) => messages.push(system(instruction)),
        (Some(text), GroundingStrategy::InlineSystem) => {
            messages.push(system(inline_grounding(&instruction, text)));
        }
        (Some(text), GroundingStrategy::PrefaceUser) => {
            messages.push(system(instruction));
            messages.push(ChatMessage {
                role: Speaker::User,
                content: preface_grounding(text),
            });
        }
    }

    messages.extend(transcript.turns().iter().map(ChatMessage::from));
    messages
}

fn system(content: String) -> ChatMessage {
    ChatMessage { role: Speaker::System, content }
}
