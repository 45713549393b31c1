//! The four single-shot formula flows: generate, explain, optimize,
//! diagnose. Each builds one fixed system prompt, makes one LLM call,
//! and parses the loosely structured reply with a dedicated line-prefix
//! parser. Gateway errors surface unchanged; nothing here retries.

use std::sync::Arc;

use sheetwise_core::domain::{
    DiagnoseErrorResponse, ExplainFormulaResponse, FormulaResponse, OptimizeFormulaResponse,
};
use sheetwise_core::AssistError;

use crate::llm::{ChatClient, ChatMessage, CompletionOptions};

const GENERATE_PROMPT: &str = "You are an AI assistant that generates Excel formulas from natural language descriptions. Provide only the formula, without any additional text or explanation. If you cannot generate a formula, respond with 'Error: Could not generate formula.'";

const EXPLAIN_PROMPT: &str = "You are an AI assistant that explains Excel formulas in a clear and concise manner. Provide only the explanation, without any additional text or introduction.";

const OPTIMIZE_PROMPT: &str = "You are an AI assistant that optimizes Excel formulas. Provide the optimized formula and a brief explanation of the optimization. Format your response as: Optimized Formula: [formula]\nExplanation: [explanation].";

const DIAGNOSE_PROMPT: &str = "You are an AI assistant that diagnoses errors in Excel formulas and suggests fixes. Provide the error type, explanation, and suggested fix. Format your response as: Error Type: [type]\nExplanation: [explanation]\nSuggested Fix: [fix].";

pub struct FormulaFlows {
    client: Arc<dyn ChatClient>,
}

impl FormulaFlows {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    /// Natural language in, bare formula out. A reply the model itself
    /// marks with `error:` fails as [`AssistError::Generation`] carrying
    /// the exact text.
    pub async fn generate(&self, text: &str) -> Result<FormulaResponse, AssistError> {
        let reply = self.ask(GENERATE_PROMPT, text).await?;
        let formula = reply.trim();

        if formula.to_lowercase().starts_with("error:") {
            return Err(AssistError::Generation(formula.to_string()));
        }

        Ok(FormulaResponse { formula: formula.to_string() })
    }

    /// The trimmed reply is the explanation verbatim; no parsing.
    pub async fn explain(&self, formula: &str) -> Result<ExplainFormulaResponse, AssistError> {
        let reply =
            self.ask(EXPLAIN_PROMPT, &format!("Explain the Excel formula: {formula}")).await?;
        Ok(ExplainFormulaResponse { explanation: reply.trim().to_string() })
    }

    pub async fn optimize(&self, formula: &str) -> Result<OptimizeFormulaResponse, AssistError> {
        let reply =
            self.ask(OPTIMIZE_PROMPT, &format!("Optimize the Excel formula: {formula}")).await?;
        let (suggested_formula, explanation) = parse_optimized_reply(&reply)?;

        Ok(OptimizeFormulaResponse {
            original_formula: formula.to_string(),
            suggested_formula,
            explanation,
        })
    }

    pub async fn diagnose(&self, formula: &str) -> Result<DiagnoseErrorResponse, AssistError> {
        let reply = self
            .ask(DIAGNOSE_PROMPT, &format!("Diagnose the error in this Excel formula: {formula}"))
            .await?;
        let (error_type, explanation, suggested_fix) = parse_diagnosis_reply(&reply)?;

        Ok(DiagnoseErrorResponse { error_type, explanation, suggested_fix })
    }

    async fn ask(&self, system_prompt: &str, user_content: &str) -> Result<String, AssistError> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user_content)];
        self.client.complete(&messages, &CompletionOptions::default()).await
    }
}

/// Scan reply lines for the `Optimized Formula:` / `Explanation:`
/// prefixes the prompt demanded. Both must be present and non-empty.
fn parse_optimized_reply(content: &str) -> Result<(String, String), AssistError> {
    let mut optimized_formula = String::new();
    let mut explanation = String::new();

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Optimized Formula:") {
            optimized_formula = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Explanation:") {
            explanation = rest.trim().to_string();
        }
    }

    if optimized_formula.is_empty() || explanation.is_empty() {
        return Err(AssistError::ResponseFormat(
            "optimization reply is missing the `Optimized Formula:` or `Explanation:` line"
                .to_string(),
        ));
    }

    Ok((optimized_formula, explanation))
}

/// Same line-prefix scan for the three diagnosis fields.
fn parse_diagnosis_reply(content: &str) -> Result<(String, String, String), AssistError> {
    let mut error_type = String::new();
    let mut explanation = String::new();
    let mut suggested_fix = String::new();

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Error Type:") {
            error_type = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Explanation:") {
            explanation = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Suggested Fix:") {
            suggested_fix = rest.trim().to_string();
        }
    }

    if error_type.is_empty() || explanation.is_empty() || suggested_fix.is_empty() {
        return Err(AssistError::ResponseFormat(
            "diagnosis reply is missing one of the `Error Type:`, `Explanation:`, or `Suggested Fix:` lines"
                .to_string(),
        ));
    }

    Ok((error_type, explanation, suggested_fix))
}
