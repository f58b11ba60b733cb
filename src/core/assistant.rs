//! Generative AI assistant.
//!
//! Questions the keyword rules cannot answer are sent to Gemini together with a snapshot of
//! the catalog.

use crate::config::{GeminiSettings, Settings};
use crate::core::catalog::{Catalog, Product, format_rupiah};
use crate::core::traits::TextGenerator;
use async_trait::async_trait;
use di::{inject, injectable};
use log::{debug, error};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PROMPT_TEMPLATE: &str = r#"
Anda adalah **DuraBot**, asisten AI untuk toko material bangunan "DuraBata".
Jawab dengan ramah, informatif, dan singkat (maksimal 100 kata).

**Aturan:**
- Untuk pertanyaan tentang produk, gunakan data produk yang tersedia
- Jika tidak tahu, jangan mengarang jawaban
- Fokus pada material bangunan
- Gunakan emoji untuk membuat jawaban lebih menarik
- Format jawaban dengan rapi menggunakan markdown sederhana

**Pertanyaan User:** "{{ question }}"

{% if products %}
**Data Produk Toko:**
{% for p in products %}
- {{ p.name }}: Rp {{ p.price }} | Stok: {{ p.stock }}{% if p.discount is not none %} | Diskon: {{ p.discount }}{% endif %}{% if p.category %} | Kategori: {{ p.category }}{% endif %}

{% endfor %}
{% else %}
**Catatan:** Data produk saat ini tidak tersedia.
{% endif %}

**Jawablah dengan format yang rapi dan mudah dibaca:**
"#;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] minijinja::Error),

    #[error("request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini responded with {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Gemini returned no text")]
    EmptyResponse,
}

fn product_as_jinja_value(product: &Product) -> minijinja::Value {
    minijinja::context! {
        name => product.name,
        price => format_rupiah(product.price),
        stock => product.stock,
        discount => product.old_price.map(|_| {
            product.badge.as_ref().map(|b| b.label.clone()).unwrap_or_default()
        }),
        category => product.category,
    }
}

/// Builds the prompt sent to the model for a free-form question.
pub fn render_prompt(question: &str, catalog: &Catalog) -> Result<String, AssistantError> {
    let mut env = minijinja::Environment::new();
    env.set_trim_blocks(true);
    env.add_template("prompt", PROMPT_TEMPLATE)?;

    let products: Vec<minijinja::Value> =
        catalog.all().iter().map(product_as_jinja_value).collect();

    let prompt = env.get_template("prompt")?.render(minijinja::context! {
        question => question,
        products => products,
    })?;

    Ok(prompt)
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        (!text.trim().is_empty()).then_some(text)
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

#[injectable(TextGenerator)]
impl GeminiClient {
    #[inject]
    pub fn create() -> GeminiClient {
        GeminiClient::new(Settings::from_env().gemini)
    }
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> GeminiClient {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|e| {
                error!("failed to configure HTTP client, using defaults: {e}");
                reqwest::Client::new()
            });

        GeminiClient { http, settings }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(AssistantError::MissingApiKey)?;

        debug!("sending {} byte prompt to {}", prompt.len(), self.settings.model);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&GenerateContentRequest {
                contents: [Content {
                    parts: [Part { text: prompt }],
                }],
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status { status, body });
        }

        response
            .json::<GenerateContentResponse>()
            .await?
            .into_text()
            .ok_or(AssistantError::EmptyResponse)
    }
}
