use helpdesk_core::indexer::IndexReport;
use helpdesk_core::models::{AnswerResult, TriageResult};
use helpdesk_core::pipeline::{Reporter, RunMode, RunSummary};
use serde_json::json;
use std::io::Write;

/// Writes run results either as readable lines or as pretty JSON.
pub struct Console<W: Write> {
    out: W,
    json: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn summary(&mut self, summary: &RunSummary) -> std::io::Result<()> {
        if self.json {
            return self.pretty(&json!({ "status": "ok", "summary": summary }));
        }
        writeln!(
            self.out,
            "done: triaged {} ({} failed), answered {} ({} failed)",
            summary.triaged, summary.triage_failures, summary.answered, summary.answer_failures
        )
    }

    fn pretty(&mut self, value: &serde_json::Value) -> std::io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        writeln!(self.out, "{text}")
    }
}

impl<W: Write> Reporter for Console<W> {
    fn phase(&mut self, phase: RunMode) -> std::io::Result<()> {
        if self.json {
            return Ok(());
        }
        match phase {
            RunMode::Triage => writeln!(self.out, "\n--- Triage ---"),
            RunMode::Rag => writeln!(self.out, "\n--- Policy questions ---"),
            RunMode::All => Ok(()),
        }
    }

    fn triage(
        &mut self,
        message: &str,
        result: &anyhow::Result<TriageResult>,
    ) -> std::io::Result<()> {
        if self.json {
            return self.pretty(&match result {
                Ok(r) => json!({ "question": message, "result": r }),
                Err(e) => json!({ "question": message, "error": format!("{e:#}") }),
            });
        }
        writeln!(self.out, "Question: '{message}'")?;
        match result {
            Ok(r) => {
                let line = serde_json::to_string(r).map_err(std::io::Error::other)?;
                writeln!(self.out, " -> Result: {line}")?;
            }
            Err(e) => writeln!(self.out, " -> Error: {e:#}")?,
        }
        writeln!(self.out)
    }

    fn index_built(&mut self, report: &IndexReport) -> std::io::Result<()> {
        if self.json {
            return self.pretty(&json!({ "index": report }));
        }
        writeln!(
            self.out,
            "index: {} PDFs found, {} loaded, {} failed to load; {} chunks, {} embedded, {} failed",
            report.files_found,
            report.files_loaded,
            report.files_failed,
            report.chunks,
            report.embedded,
            report.failed
        )
    }

    fn rag_disabled(&mut self) -> std::io::Result<()> {
        if self.json {
            return self.pretty(&json!({ "rag": "disabled" }));
        }
        writeln!(
            self.out,
            "No documents could be indexed. Policy answering is disabled."
        )
    }

    fn answer(
        &mut self,
        question: &str,
        result: &anyhow::Result<AnswerResult>,
    ) -> std::io::Result<()> {
        if self.json {
            return self.pretty(&match result {
                Ok(a) => {
                    let citations: Vec<_> = a
                        .citations
                        .iter()
                        .map(|c| {
                            json!({
                                "path": c.source.path,
                                "page": c.source.page,
                                "text": c.text,
                            })
                        })
                        .collect();
                    json!({
                        "question": question,
                        "answer": a.answer,
                        "context_found": a.context_found,
                        "citations": citations,
                    })
                }
                Err(e) => json!({ "question": question, "error": format!("{e:#}") }),
            });
        }
        writeln!(self.out, "Question: '{question}'")?;
        match result {
            Ok(a) => {
                writeln!(self.out, " -> Answer: {}", a.answer)?;
                if !a.citations.is_empty() {
                    writeln!(self.out, "Citations found: {}", a.citations.len())?;
                }
                writeln!(self.out, "\n---")
            }
            Err(e) => {
                writeln!(self.out, " -> Error: {e:#}")?;
                writeln!(self.out)
            }
        }
    }
}
