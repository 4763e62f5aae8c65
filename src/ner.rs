//! Named-entity recognition collaborator.

use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The entity classes the redactor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Person,
    LocationOrOrg,
    Other,
}

impl EntityLabel {
    /// Maps spaCy/CoNLL style labels onto the redactor's classes.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "PERSON" | "PER" => EntityLabel::Person,
            "GPE" | "LOC" | "LOCATION" | "ORG" | "ORGANIZATION" => EntityLabel::LocationOrOrg,
            _ => EntityLabel::Other,
        }
    }
}

/// An entity found in the recognised text. `start`/`end` are character
/// offsets into that text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

pub trait EntityRecognizer: Send + Sync {
    fn entities(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>>;
}

#[derive(Serialize)]
struct NerRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NerEntity {
    text: String,
    label: String,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    end: usize,
}

impl From<NerEntity> for EntitySpan {
    fn from(entity: NerEntity) -> Self {
        EntitySpan {
            label: EntityLabel::from_tag(&entity.label),
            text: entity.text,
            start: entity.start,
            end: entity.end,
        }
    }
}

/// Client for an external NER service that accepts `{"text": ...}` and
/// answers with `[{"text", "label", "start", "end"}, ...]`.
///
/// Blocking; must not be called from inside an async task.
pub struct HttpEntityRecognizer {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpEntityRecognizer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build NER HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl EntityRecognizer for HttpEntityRecognizer {
    fn entities(&self, text: &str) -> anyhow::Result<Vec<EntitySpan>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.url)
            .json(&NerRequest { text })
            .send()
            .with_context(|| format!("NER request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("NER service returned {}", status);
        }

        let entities: Vec<NerEntity> = response
            .json()
            .context("NER service returned malformed JSON")?;
        debug!(count = entities.len(), "Received entities");

        Ok(parse_entities(entities))
    }
}

fn parse_entities(entities: Vec<NerEntity>) -> Vec<EntitySpan> {
    entities.into_iter().map(EntitySpan::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mapping() {
        assert_eq!(EntityLabel::from_tag("PERSON"), EntityLabel::Person);
        assert_eq!(EntityLabel::from_tag("per"), EntityLabel::Person);
        assert_eq!(EntityLabel::from_tag("GPE"), EntityLabel::LocationOrOrg);
        assert_eq!(EntityLabel::from_tag("ORG"), EntityLabel::LocationOrOrg);
        assert_eq!(EntityLabel::from_tag("LOC"), EntityLabel::LocationOrOrg);
        assert_eq!(EntityLabel::from_tag("DATE"), EntityLabel::Other);
    }

    #[test]
    fn service_payload_is_parsed() {
        let body = r#"[
            {"text": "Jane Doe", "label": "PERSON", "start": 5, "end": 13},
            {"text": "Bhopal", "label": "GPE", "start": 20, "end": 26},
            {"text": "2024", "label": "DATE"}
        ]"#;
        let raw: Vec<NerEntity> = serde_json::from_str(body).unwrap();
        let spans = parse_entities(raw);

        assert_eq!(spans.len(), 3);
        assert_eq!(
            spans[0],
            EntitySpan {
                text: "Jane Doe".to_string(),
                label: EntityLabel::Person,
                start: 5,
                end: 13,
            }
        );
        assert_eq!(spans[1].label, EntityLabel::LocationOrOrg);
        assert_eq!(spans[2].label, EntityLabel::Other);
    }

    #[test]
    fn blank_text_skips_the_service() {
        // Unroutable URL: a request would fail, so success means no call was made.
        let ner = HttpEntityRecognizer::new("http://127.0.0.1:9/ner", Duration::from_millis(50))
            .unwrap();
        assert!(ner.entities("  \n").unwrap().is_empty());
    }
}
