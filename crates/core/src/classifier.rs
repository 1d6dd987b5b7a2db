use crate::models::TriageResult;
use crate::prompts::{self, Prompts};
use anyhow::Context;
use providers::{ChatRequest, LlmProvider};
use tracing::debug;

/// Classifies one support message into decision, urgency and missing fields.
///
/// One structured-output call, no retry. Replies outside the closed
/// enumerations are errors.
pub async fn classify(
    message: &str,
    llm: &dyn LlmProvider,
    prompts: &Prompts,
) -> anyhow::Result<TriageResult> {
    let req = ChatRequest::new(prompts.triage_system.clone(), message)
        .with_schema(prompts::triage_schema());
    let raw = llm.complete(&req).await.context("triage call failed")?;
    debug!(reply = %raw, "triage reply");
    parse_triage(&raw)
}

pub fn parse_triage(raw: &str) -> anyhow::Result<TriageResult> {
    let body = strip_code_fence(raw);
    serde_json::from_str(body).with_context(|| format!("malformed triage output: {}", raw.trim()))
}

/// Models sometimes wrap JSON in a Markdown fence even in JSON mode.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decision, Urgency};
    use providers::ProviderError;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<String, String>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Scripted {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for Scripted {
        async fn complete(&self, req: &ChatRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(req.clone());
            self.reply.clone().map_err(ProviderError::RequestFailed)
        }
    }

    #[tokio::test]
    async fn exception_request_opens_ticket() {
        let llm = Scripted::ok(
            r#"{"decision":"ABRIR_CHAMADO","urgency":"ALTA","missing_fields":[]}"#,
        );
        let out = classify(
            "I want an exception to work remote 5 days",
            &llm,
            &Prompts::default(),
        )
        .await
        .unwrap();

        assert_eq!(out.decision, Decision::AbrirChamado);
        assert_eq!(out.urgency, Urgency::Alta);

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user, "I want an exception to work remote 5 days");
        assert!(seen[0].system.contains("ABRIR_CHAMADO"));
        assert!(seen[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn vague_message_asks_for_info() {
        let llm = Scripted::ok(
            "```json\n{\"decision\":\"PEDIR_INFO\",\"urgency\":\"MEDIA\",\"missing_fields\":[\"topic\"]}\n```",
        );
        let out = classify("I need help", &llm, &Prompts::default())
            .await
            .unwrap();
        assert_eq!(out.decision, Decision::PedirInfo);
        assert_eq!(out.urgency, Urgency::Media);
        assert_eq!(out.missing_fields, vec!["topic".to_string()]);
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let llm = Scripted {
            reply: Err("timeout".into()),
            seen: Mutex::new(Vec::new()),
        };
        let err = classify("hi", &llm, &Prompts::default())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("timeout"));
    }

    #[test]
    fn values_outside_enumerations_are_rejected() {
        assert!(parse_triage(r#"{"decision":"ESCALATE","urgency":"ALTA"}"#).is_err());
        assert!(parse_triage(r#"{"decision":"PEDIR_INFO","urgency":"URGENT"}"#).is_err());
        assert!(parse_triage("not json").is_err());
    }

    #[test]
    fn fence_without_language_tag_is_stripped() {
        let out = parse_triage("```\n{\"decision\":\"AUTO_RESOLVER\",\"urgency\":\"BAIXA\"}\n```")
            .unwrap();
        assert_eq!(out.decision, Decision::AutoResolver);
    }
}
