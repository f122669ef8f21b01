use serde_json::Value;
use tracing::debug;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Translation service responded with {0}.")]
    Status(reqwest::StatusCode),
    #[error("Translation service returned something unexpected.")]
    Malformed,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

pub struct Translator<'a> {
    client: &'a reqwest::Client,
    base: &'a Url,
}

impl<'a> Translator<'a> {
    pub fn new(client: &'a reqwest::Client, base: &'a Url) -> Self {
        Self { client, base }
    }

    /// Translates `text` into the language with code `target`, detecting the source language.
    pub async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let url = self.base.join("translate_a/single")?;
        debug!(target_lang = target, "requesting translation");
        let resp = self
            .client
            .get(url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TranslateError::Status(resp.status()));
        }

        let body: Value = resp.json().await.map_err(|_| TranslateError::Malformed)?;
        extract_translation(&body).ok_or(TranslateError::Malformed)
    }
}

/// Joins the translated segments of a `[[["translated", "original", ...], ...], ...]` response.
fn extract_translation(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0)?.as_str())
        .collect();
    (!translated.is_empty()).then_some(translated)
}
