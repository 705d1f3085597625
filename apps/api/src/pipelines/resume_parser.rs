//! Resume parsing — extracts a structured profile from an uploaded resume.
//!
//! The document arrives as a self-describing data URI and is passed opaquely
//! to the attachment channel; this pipeline never decodes it. Pre-filled name
//! and mobile number take precedence over document-extracted values. The
//! precedence rule is stated in the prompt AND enforced deterministically
//! after generation, so a model that ignores the instruction cannot override
//! what the caller typed in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm_client::GenerationClient;
use crate::pipelines::{decode_output, prompts, Pipeline, PipelineError};
use crate::schema::{FieldKind, FieldSpec, Schema};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResumeInput {
    /// `data:<mimetype>;base64,<encoded_data>`
    pub resume_data_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedProfile {
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub headline: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
}

fn input_schema() -> Schema {
    Schema::define(
        "ParseResumeInput",
        vec![
            FieldSpec::required(
                "resumeDataUri",
                FieldKind::String,
                "A resume file as a data URI with a MIME type and Base64 \
                 encoding. Expected format: 'data:<mimetype>;base64,<encoded_data>'.",
            ),
            FieldSpec::optional(
                "fullName",
                FieldKind::String,
                "The full name of the user, if provided separately.",
            ),
            FieldSpec::optional(
                "mobileNumber",
                FieldKind::String,
                "The mobile number of the user, if provided separately.",
            ),
        ],
    )
}

fn output_schema() -> Schema {
    Schema::define(
        "ParsedProfile",
        vec![
            FieldSpec::required("fullName", FieldKind::String, "The user's full name."),
            FieldSpec::required("email", FieldKind::String, "The user's primary email address."),
            FieldSpec::optional("phone", FieldKind::String, "The user's primary phone number."),
            FieldSpec::required(
                "headline",
                FieldKind::String,
                "A professional headline summarizing the user's role \
                 (e.g., 'Senior Software Engineer').",
            ),
            FieldSpec::required(
                "skills",
                FieldKind::Array(Box::new(FieldKind::String)),
                "A list of the user's professional skills.",
            ),
            FieldSpec::required(
                "experience",
                FieldKind::String,
                "A summary of the user's work experience with job titles, \
                 companies, and dates.",
            ),
            FieldSpec::required(
                "education",
                FieldKind::String,
                "A summary of the user's educational background, including \
                 degrees and institutions.",
            ),
        ],
    )
}

pub fn pipeline(generation_timeout: Duration) -> Pipeline {
    Pipeline::new(
        "resume-parser",
        input_schema(),
        prompts::resume_parser_template(),
        output_schema(),
        generation_timeout,
    )
}

/// Runs the resume pipeline, then enforces pre-filled precedence.
pub async fn parse_resume(
    pipeline: &Pipeline,
    client: &dyn GenerationClient,
    input: &ParseResumeInput,
) -> Result<ParsedProfile, PipelineError> {
    let input_value = serde_json::to_value(input).expect("ParseResumeInput serializes to JSON");
    let output_value = pipeline.run(client, &input_value).await?;
    let mut profile: ParsedProfile = decode_output("ParsedProfile", output_value)?;

    // Pre-filled values win over whatever the model read from the document.
    if let Some(name) = nonblank(&input.full_name) {
        profile.full_name = name;
    }
    if let Some(number) = nonblank(&input.mobile_number) {
        profile.phone = Some(number);
    }

    Ok(profile)
}

fn nonblank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::testing::CannedClient;
    use serde_json::json;

    const PDF_URI: &str = "data:application/pdf;base64,JVBERi0xLjQ=";

    fn document_profile(name: &str) -> serde_json::Value {
        json!({
            "fullName": name,
            "email": "jane@example.com",
            "phone": "+1 555 9999",
            "headline": "Senior Software Engineer",
            "skills": ["Rust", "SQL"],
            "experience": "Acme Corp, 2019-2024: built billing systems.",
            "education": "BSc CS, State University"
        })
    }

    #[tokio::test]
    async fn test_prefilled_name_wins_over_document_extracted_name() {
        // The document (and a misbehaving model) says "John Smith"; the
        // caller pre-filled "Jane Doe", which must win.
        let client = CannedClient::new(document_profile("John Smith"));
        let pipeline = pipeline(Duration::from_secs(5));

        let input = ParseResumeInput {
            resume_data_uri: PDF_URI.to_string(),
            full_name: Some("Jane Doe".to_string()),
            mobile_number: None,
        };
        let profile = parse_resume(&pipeline, &client, &input).await.unwrap();
        assert_eq!(profile.full_name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_prefilled_mobile_number_overrides_document_phone() {
        let client = CannedClient::new(document_profile("Jane Doe"));
        let pipeline = pipeline(Duration::from_secs(5));

        let input = ParseResumeInput {
            resume_data_uri: PDF_URI.to_string(),
            full_name: None,
            mobile_number: Some("+1 555 0100".to_string()),
        };
        let profile = parse_resume(&pipeline, &client, &input).await.unwrap();
        assert_eq!(profile.phone.as_deref(), Some("+1 555 0100"));
    }

    #[tokio::test]
    async fn test_without_prefill_document_values_pass_through() {
        let client = CannedClient::new(document_profile("John Smith"));
        let pipeline = pipeline(Duration::from_secs(5));

        let input = ParseResumeInput {
            resume_data_uri: PDF_URI.to_string(),
            full_name: None,
            mobile_number: None,
        };
        let profile = parse_resume(&pipeline, &client, &input).await.unwrap();
        assert_eq!(profile.full_name, "John Smith");
        assert_eq!(profile.phone.as_deref(), Some("+1 555 9999"));
        assert_eq!(profile.skills, vec!["Rust", "SQL"]);
    }

    #[tokio::test]
    async fn test_blank_prefill_does_not_override() {
        let client = CannedClient::new(document_profile("John Smith"));
        let pipeline = pipeline(Duration::from_secs(5));

        let input = ParseResumeInput {
            resume_data_uri: PDF_URI.to_string(),
            full_name: Some("   ".to_string()),
            mobile_number: None,
        };
        let profile = parse_resume(&pipeline, &client, &input).await.unwrap();
        assert_eq!(profile.full_name, "John Smith");
    }

    #[tokio::test]
    async fn test_document_travels_on_the_attachment_channel() {
        let client = CannedClient::new(document_profile("Jane Doe"));
        let pipeline = pipeline(Duration::from_secs(5));

        let input = ParseResumeInput {
            resume_data_uri: PDF_URI.to_string(),
            full_name: Some("Jane Doe".to_string()),
            mobile_number: None,
        };
        parse_resume(&pipeline, &client, &input).await.unwrap();

        let prompt = client.last_prompt.lock().unwrap().clone().unwrap();
        let attachment = prompt.attachment.expect("document must be attached");
        assert_eq!(attachment.media_type, "application/pdf");
        assert!(!prompt.text.contains("base64"));
        assert!(prompt.text.contains("Pre-filled Full Name: Jane Doe"));
    }

    #[tokio::test]
    async fn test_malformed_data_uri_is_invalid_input_not_internal() {
        let client = CannedClient::new(document_profile("Jane Doe"));
        let pipeline = pipeline(Duration::from_secs(5));

        let input = ParseResumeInput {
            resume_data_uri: "not a data uri".to_string(),
            full_name: None,
            mobile_number: None,
        };
        let err = parse_resume(&pipeline, &client, &input).await.unwrap_err();
        match err {
            PipelineError::InvalidInput(e) => {
                assert_eq!(e.field, "resumeDataUri");
                assert!(e.expected.contains("data URI"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_resume_document_never_reaches_the_model() {
        let client = CannedClient::new(document_profile("Jane Doe"));
        let pipeline = pipeline(Duration::from_secs(5));

        let err = pipeline
            .run(&client, &json!({"fullName": "Jane Doe"}))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_profile_serializes_camel_case_and_omits_missing_phone() {
        let profile = ParsedProfile {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            headline: "Engineer".to_string(),
            skills: vec!["Rust".to_string()],
            experience: "Acme".to_string(),
            education: "BSc".to_string(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["fullName"], "Jane Doe");
        assert!(json.get("phone").is_none());
        assert!(json.get("full_name").is_none());
    }

    #[test]
    fn test_input_serializes_resume_data_uri_field_name() {
        let input = ParseResumeInput {
            resume_data_uri: PDF_URI.to_string(),
            full_name: None,
            mobile_number: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["resumeDataUri"], PDF_URI);
        assert!(json.get("fullName").is_none());
    }
}
