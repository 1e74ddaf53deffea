use pdf_tutor::ResponseLanguage;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct AskPayload {
    pub question: String,
}

#[derive(Deserialize, Default)]
pub struct NewSessionPayload {
    #[serde(default)]
    pub language: ResponseLanguage,
}

#[derive(Deserialize)]
pub struct LanguagePayload {
    pub language: ResponseLanguage,
}

#[derive(Deserialize)]
pub struct ChapterListQuery {
    #[serde(default)]
    pub language: ResponseLanguage,
}

#[derive(Deserialize)]
pub struct ChapterPayload {
    pub chapter: u32,
}

#[derive(Deserialize)]
pub struct ExportPayload {
    pub text: String,
}
