use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One inbound chat turn. `context` is free-form client state (selected
/// range, sheet name) that is carried but never interpreted server-side.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

/// The canned spreadsheet automation actions the composer can emit.
/// Serialized snake_case on the wire; the taskpane client switches on
/// these tags.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    VoucherEntry,
    ReconciliationAnalysis,
    DataCleaning,
    FinancialReports,
    SetFormula,
    ReadRange,
    CreateChart,
    SheetInfo,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoucherEntry => "voucher_entry",
            Self::ReconciliationAnalysis => "reconciliation_analysis",
            Self::DataCleaning => "data_cleaning",
            Self::FinancialReports => "financial_reports",
            Self::SetFormula => "set_formula",
            Self::ReadRange => "read_range",
            Self::CreateChart => "create_chart",
            Self::SheetInfo => "sheet_info",
        }
    }
}

/// A single canned automation action handed to the client for execution.
///
/// `js_code` is always one of the fixed templates in [`crate::snippets`],
/// parameterized only by simple substitutions (a detected formula
/// string). It is never derived from LLM output.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ExcelOperation {
    pub operation_type: OperationType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_code: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Chat reply envelope. Field names (`response`, `excel_operations`)
/// match the taskpane client contract. Failure is expressed as
/// `success: false` plus `error`, never as a non-200 response.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub excel_operations: Vec<ExcelOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NlToFormulaRequest {
    pub text: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct FormulaResponse {
    pub formula: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExplainFormulaRequest {
    pub formula: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ExplainFormulaResponse {
    pub explanation: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OptimizeFormulaRequest {
    pub formula: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct OptimizeFormulaResponse {
    pub original_formula: String,
    pub suggested_formula: String,
    pub explanation: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DiagnoseErrorRequest {
    pub formula: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct DiagnoseErrorResponse {
    pub error_type: String,
    pub explanation: String,
    pub suggested_fix: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChatRequest, ChatResponse, ExcelOperation, OperationType};

    #[test]
    fn operation_type_serializes_snake_case() {
        let tag = serde_json::to_value(OperationType::ReconciliationAnalysis).expect("serialize");
        assert_eq!(tag, json!("reconciliation_analysis"));
    }

    #[test]
    fn chat_request_tolerates_missing_optional_fields() {
        let request: ChatRequest =
            serde_json::from_value(json!({ "message": "帮我做一个对账表" })).expect("deserialize");
        assert!(request.conversation_id.is_none());
        assert!(request.context.is_none());
    }

    #[test]
    fn chat_response_omits_absent_error_field() {
        let response = ChatResponse {
            success: true,
            response: "好的".to_string(),
            excel_operations: vec![ExcelOperation {
                operation_type: OperationType::SheetInfo,
                description: "查看工作表信息".to_string(),
                js_code: None,
                parameters: serde_json::Map::new(),
            }],
            conversation_id: Some("conv_1".to_string()),
            error: None,
        };

        let encoded = serde_json::to_value(&response).expect("serialize");
        assert!(encoded.get("error").is_none());
        assert_eq!(encoded["excel_operations"][0]["operation_type"], json!("sheet_info"));
    }
}
