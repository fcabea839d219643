use crate::completion::{CompletionClient, OutputMode};
use crate::prompts::PromptStore;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

/// Hard cap on input size. Longer inputs are rejected without issuing a
/// single completion call.
pub const MAX_LOG_LENGTH: usize = 100_000;

/// Inputs longer than this (but under the hard cap) are condensed by one
/// preliminary completion call before the analysis steps run.
pub const LOG_LENGTH_THRESHOLD: usize = 8_000;

/// Upper bound on completion calls per `analyze` invocation: one optional
/// condensation call plus the four analysis steps. The pipeline is shaped
/// around this bound; it must hold for every input.
pub const MAX_COMPLETION_CALLS: usize = 5;

pub const SYSTEM_PRE_SUMMARY: &str =
    "You are an expert log analyst that summarizes key information.";
pub const SYSTEM_SUMMARY: &str = "You are an expert log analyst.";
pub const SYSTEM_ROOT_CAUSE: &str =
    "You are a root cause analysis expert. Respond in the requested JSON format.";
pub const SYSTEM_IMPACT_SCOPE: &str =
    "You are a system architect assessing business and technical impact.";
pub const SYSTEM_ACTIONS: &str =
    "You are a senior engineer providing actionable recommendations. Respond in the requested JSON format.";

const INSUFFICIENT_INFORMATION: &str = "Insufficient information";

/// Structured outcome of one analysis run.
///
/// Every field is populated once `analyze` returns: either with genuine
/// model output or with text describing why that field could not be
/// produced. Consumers never need to branch on a field being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub root_causes: Vec<String>,
    pub evidence: Vec<String>,
    pub impact_scope: String,
    pub recommended_actions: Vec<String>,
}

impl AnalysisResult {
    fn rejected(actual_length: usize) -> Self {
        let notice = format!(
            "Analysis rejected: input exceeds the {} character limit.",
            MAX_LOG_LENGTH
        );
        Self {
            summary: format!(
                "Log input is {} characters long, exceeding the maximum supported length of {} characters; analysis was not attempted.",
                actual_length, MAX_LOG_LENGTH
            ),
            root_causes: vec![notice.clone()],
            evidence: vec![notice.clone()],
            impact_scope: notice,
            recommended_actions: vec![format!(
                "Reduce the log to at most {} characters and try again.",
                MAX_LOG_LENGTH
            )],
        }
    }

    fn aborted(error: &anyhow::Error) -> Self {
        let notice = "Analysis aborted: the condensation step failed.".to_string();
        Self {
            summary: format!(
                "The condensation step failed before analysis could start: {:#}",
                error
            ),
            root_causes: vec![notice.clone()],
            evidence: vec![notice.clone()],
            impact_scope: notice.clone(),
            recommended_actions: vec![notice],
        }
    }
}

/// Runs the fixed analysis chain against a completion client.
///
/// `analyze` is total: guardrail rejections, condensation failures, and
/// per-step failures all surface as text inside the result, never as an
/// error. Steps run sequentially and each failure is confined to the
/// fields that step owns.
pub struct Pipeline {
    client: Box<dyn CompletionClient>,
    prompts: PromptStore,
}

impl Pipeline {
    pub fn new(client: Box<dyn CompletionClient>, prompts: PromptStore) -> Self {
        Self { client, prompts }
    }

    pub async fn analyze(&self, raw_text: &str) -> AnalysisResult {
        let length = raw_text.chars().count();
        if length > MAX_LOG_LENGTH {
            warn!(
                "Rejecting log input of {} characters (limit: {})",
                length, MAX_LOG_LENGTH
            );
            return AnalysisResult::rejected(length);
        }

        let log_context = if length > LOG_LENGTH_THRESHOLD {
            info!(
                "Log input is long ({} characters), condensing before analysis",
                length
            );
            match self
                .run_step("pre_summary", SYSTEM_PRE_SUMMARY, OutputMode::Text, raw_text)
                .await
            {
                Ok(condensed) => condensed,
                Err(e) => {
                    error!("Condensation step failed, aborting analysis: {:#}", e);
                    return AnalysisResult::aborted(&e);
                }
            }
        } else {
            raw_text.to_string()
        };

        // The four analysis steps share the frozen context. A failed step
        // only poisons its own fields; the chain keeps going.

        let summary = match self
            .run_step("summary", SYSTEM_SUMMARY, OutputMode::Text, &log_context)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!("Summary step failed: {:#}", e);
                format!("Error: the summary step failed - {:#}", e)
            }
        };

        let (root_causes, evidence) = match self
            .run_structured("root_cause", SYSTEM_ROOT_CAUSE, &log_context)
            .await
        {
            Ok(object) => (
                string_seq(&object, "root_causes"),
                string_seq(&object, "evidence"),
            ),
            Err(e) => {
                error!("Root cause step failed: {:#}", e);
                (
                    vec![format!("Error: the root cause step failed - {:#}", e)],
                    vec!["Evidence could not be extracted because the step failed.".to_string()],
                )
            }
        };

        let impact_scope = match self
            .run_step(
                "impact_scope",
                SYSTEM_IMPACT_SCOPE,
                OutputMode::Text,
                &log_context,
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!("Impact scope step failed: {:#}", e);
                format!("Error: the impact scope step failed - {:#}", e)
            }
        };

        let recommended_actions = match self
            .run_structured("actions", SYSTEM_ACTIONS, &log_context)
            .await
        {
            Ok(object) => string_seq(&object, "recommended_actions"),
            Err(e) => {
                error!("Action recommendation step failed: {:#}", e);
                vec![format!(
                    "Error: the action recommendation step failed - {:#}",
                    e
                )]
            }
        };

        AnalysisResult {
            summary,
            root_causes,
            evidence,
            impact_scope,
            recommended_actions,
        }
    }

    async fn run_step(
        &self,
        template: &str,
        system: &str,
        mode: OutputMode,
        context: &str,
    ) -> Result<String> {
        let user = self.prompts.render(template, context)?;
        let output = self.client.complete(system, &user, mode).await?;
        Ok(output)
    }

    async fn run_structured(
        &self,
        template: &str,
        system: &str,
        context: &str,
    ) -> Result<serde_json::Map<String, Value>> {
        let body = self
            .run_step(template, system, OutputMode::JsonObject, context)
            .await?;
        parse_json_object(&body)
    }
}

fn parse_json_object(body: &str) -> Result<serde_json::Map<String, Value>> {
    let value: Value = serde_json::from_str(body)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!(
            "structured response is not a JSON object: {}",
            other
        )),
    }
}

/// Extract a string sequence from a structured response. A missing or
/// malformed key yields the single-element default; a present-but-empty
/// array is kept empty (the renderer has its own fallback wording).
fn string_seq(object: &serde_json::Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key).and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        None => vec![INSUFFICIENT_INFORMATION.to_string()],
    }
}
