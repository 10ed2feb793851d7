use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::query::context::is_empty_context;
use crate::session::ProjectSession;

/// The kind of action a plan step asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    CreateFile,
    ModifyFile,
    DeleteFile,
    RunCommand,
    /// Free-form guidance with no direct action.
    Note,
}

/// One step of a generated plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub description: String,
    /// File path or command the step acts on, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// An ordered list of typed steps returned by a generation backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Parse a plan from generator output.
    ///
    /// Accepts a bare JSON object, a bare array of steps, or either wrapped in a
    /// fenced code block with surrounding prose.
    pub fn from_text(text: &str) -> Result<Self> {
        let body = fenced_body(text).unwrap_or(text).trim();
        if body.starts_with('[') {
            let steps: Vec<PlanStep> =
                serde_json::from_str(body).context("plan step array is not valid JSON")?;
            return Ok(Self { steps });
        }
        let start = body
            .find('{')
            .ok_or_else(|| anyhow!("no JSON object in generator output"))?;
        let object = &body[start..];
        let end = object
            .rfind('}')
            .ok_or_else(|| anyhow!("unterminated JSON object in generator output"))?;
        serde_json::from_str(&object[..=end]).context("plan object is not valid JSON")
    }
}

/// Contents of the first ``` fenced block in `text`, without the info string.
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// A text-generation backend that turns an instruction document into a plan.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, instruction: &str) -> Result<Plan>;
}

/// Build the instruction document sent to the generator.
///
/// The context block is omitted when retrieval found nothing, so the generator
/// is not told about an empty excerpt list.
pub fn build_instruction(context: &str, prompt: &str) -> String {
    let mut doc = String::from(
        "You are planning changes to a software project. Respond with a JSON object \
         {\"steps\": [...]} where each step has \"type\" (create_file, modify_file, \
         delete_file, run_command, note), \"description\", and an optional \"target\".\n",
    );
    if !is_empty_context(context) {
        doc.push('\n');
        doc.push_str(context.trim_end());
        doc.push('\n');
    }
    doc.push_str("\nRequest:\n");
    doc.push_str(prompt.trim());
    doc.push('\n');
    doc
}

/// Retrieval + instruction building + generation for one prompt.
pub struct PlanningPipeline<G> {
    session: Arc<ProjectSession>,
    generator: G,
}

impl<G: PlanGenerator> PlanningPipeline<G> {
    pub fn new(session: Arc<ProjectSession>, generator: G) -> Self {
        Self { session, generator }
    }

    /// The instruction document for `prompt`, without calling the generator.
    pub async fn instruction_for(&self, prompt: &str) -> String {
        let context = self.session.context_for_prompt(prompt).await;
        build_instruction(&context, prompt)
    }

    /// Assemble context for `prompt` and ask the generator for a plan.
    pub async fn plan(&self, prompt: &str) -> Result<Plan> {
        let instruction = self.instruction_for(prompt).await;
        debug!(bytes = instruction.len(), "sending instruction to generator");
        let plan = self
            .generator
            .generate(&instruction)
            .await
            .context("plan generation failed")?;
        info!(steps = plan.steps.len(), "plan generated");
        Ok(plan)
    }
}
