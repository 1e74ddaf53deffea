use serde::Deserialize;

#[derive(Deserialize)]
pub struct DocumentUrlRequest {
    pub pdf_url: String,
}
