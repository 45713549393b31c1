pub mod config;
pub mod domain;
pub mod errors;
pub mod snippets;

pub use domain::{
    ChatRequest, ChatResponse, DiagnoseErrorRequest, DiagnoseErrorResponse, ExcelOperation,
    ExplainFormulaRequest, ExplainFormulaResponse, FormulaResponse, NlToFormulaRequest,
    OperationType, OptimizeFormulaRequest, OptimizeFormulaResponse,
};
pub use errors::AssistError;
