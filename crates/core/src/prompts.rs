//! Fixed system instructions for triage and policy answering.

use crate::config::AssistantConfig;
use crate::models::{Decision, Urgency, SENTINEL};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct Prompts {
    pub triage_system: String,
    pub rag_system: String,
}

impl Prompts {
    pub fn new(assistant: &AssistantConfig) -> Self {
        Self {
            triage_system: triage_instruction(&assistant.company),
            rag_system: rag_instruction(&assistant.company),
        }
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self::new(&AssistantConfig::default())
    }
}

fn triage_instruction(company: &str) -> String {
    format!(
        "You are a Service Desk triage agent for the internal policies of {company}. \
Given the user's message, return ONLY a JSON object with:\n\
{{\n  \"decision\": \"AUTO_RESOLVER\" | \"PEDIR_INFO\" | \"ABRIR_CHAMADO\",\n  \
\"urgency\": \"BAIXA\" | \"MEDIA\" | \"ALTA\",\n  \"missing_fields\": [\"...\"]\n}}\n\
Rules:\n\
- **AUTO_RESOLVER**: clear questions about rules or procedures described in the policies \
(e.g. \"Can I get my home-office internet reimbursed?\", \"How does the meal policy work on business trips?\"). \
Urgency is usually BAIXA.\n\
- **PEDIR_INFO**: vague messages, or messages missing the information needed to identify the topic or context \
(e.g. \"I need help with a policy\", \"I have a general question\"). Urgency is MEDIA.\n\
- **ABRIR_CHAMADO**: requests for an exception, release, approval or special access, or when the user explicitly \
asks for a ticket to be opened (e.g. \"I want an exception to work remote 5 days.\", \
\"I request release for external attachments.\", \"Please open a ticket with HR.\"). Urgency is usually ALTA.\n\
Analyse the message and decide the most appropriate action."
    )
}

fn rag_instruction(company: &str) -> String {
    format!(
        "You are the Internal Policies Assistant (HR/IT) of {company}. \
Answer ONLY based on the provided context. \
If the context is not enough, answer only '{SENTINEL}'."
    )
}

/// User turn of the policy question: the question followed by the retrieved text.
pub fn rag_user_message(question: &str, context: &str) -> String {
    format!("Question: {question}\n\nContext:\n{context}")
}

/// JSON schema the triage reply is constrained to.
pub fn triage_schema() -> serde_json::Value {
    let decisions: Vec<&str> = Decision::ALL.iter().map(Decision::as_str).collect();
    let urgencies: Vec<&str> = Urgency::ALL.iter().map(Urgency::as_str).collect();
    json!({
        "type": "object",
        "properties": {
            "decision": { "type": "string", "enum": decisions },
            "urgency": { "type": "string", "enum": urgencies },
            "missing_fields": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Fields or information missing from the user's message."
            }
        },
        "required": ["decision", "urgency", "missing_fields"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_name_the_company_and_sentinel() {
        let prompts = Prompts::new(&AssistantConfig {
            company: "Acme".into(),
        });
        assert!(prompts.triage_system.contains("Acme"));
        assert!(prompts.rag_system.contains("Acme"));
        assert!(prompts.rag_system.contains("'I don't know'"));
        for d in Decision::ALL {
            assert!(prompts.triage_system.contains(d.as_str()));
        }
    }

    #[test]
    fn schema_lists_every_enum_value() {
        let schema = triage_schema();
        assert_eq!(
            schema["properties"]["decision"]["enum"],
            json!(["AUTO_RESOLVER", "PEDIR_INFO", "ABRIR_CHAMADO"])
        );
        assert_eq!(
            schema["properties"]["urgency"]["enum"],
            json!(["BAIXA", "MEDIA", "ALTA"])
        );
    }

    #[test]
    fn user_message_puts_question_before_context() {
        let msg = rag_user_message("Q?", "ctx");
        assert_eq!(msg, "Question: Q?\n\nContext:\nctx");
    }
}
