//! Keyword-rule dispatch over the user's raw message.
//!
//! The composer never inspects the LLM reply: the conversational text
//! and the operation list are produced independently and merely
//! returned together. Rules in the table overlap freely (one message
//! can trigger several), while the small-talk short-circuit and the
//! sheet-info fallback are mutually exclusive with the table.

use serde_json::{json, Map, Value};
use sheetwise_core::domain::{ExcelOperation, OperationType};
use sheetwise_core::snippets;

/// Messages this short or shorter that contain a small-talk keyword
/// produce no operations at all.
const SMALL_TALK_MAX_CHARS: usize = 10;

const SMALL_TALK_KEYWORDS: &[&str] = &[
    "你好", "您好", "早上好", "晚上好", "hi", "hello", "hey", "谢谢", "thanks", "thank you",
    "你是谁", "who are you", "帮助", "help", "再见", "拜拜", "bye",
];

const VOUCHER_KEYWORDS: &[&str] = &["凭证", "记账", "会计分录", "voucher"];

const RECONCILIATION_KEYWORDS: &[&str] = &["对账", "核对", "reconcil"];

const DATA_CLEANING_KEYWORDS: &[&str] =
    &["清洗", "清理", "去重", "空行", "格式规范", "data cleaning", "clean"];

const FINANCIAL_REPORT_KEYWORDS: &[&str] = &[
    "三大报表",
    "资产负债表",
    "利润表",
    "现金流量表",
    "财务报表",
    "financial statement",
    "balance sheet",
    "income statement",
    "cash flow",
];

const FORMULA_KEYWORDS: &[&str] = &["求和", "公式", "计算", "sum", "formula", "calculate"];

const READ_KEYWORDS: &[&str] =
    &["读取", "查看", "显示", "分析", "read", "view", "display", "analyze"];

const CHART_KEYWORDS: &[&str] =
    &["图表", "柱状图", "饼图", "折线图", "可视化", "chart", "visualiz"];

/// Broader spreadsheet vocabulary that justifies the generic fallback
/// when no specific rule fired.
const EXCEL_CONTEXT_KEYWORDS: &[&str] =
    &["单元格", "工作表", "表格", "电子表格", "excel", "sheet", "cell", "范围", "数据"];

struct KeywordRule {
    keywords: &'static [&'static str],
    build: fn(&str) -> ExcelOperation,
}

/// Evaluation order is the table order; it is also the order of the
/// returned operations.
const RULES: &[KeywordRule] = &[
    KeywordRule { keywords: VOUCHER_KEYWORDS, build: voucher_operation },
    KeywordRule { keywords: RECONCILIATION_KEYWORDS, build: reconciliation_operation },
    KeywordRule { keywords: DATA_CLEANING_KEYWORDS, build: data_cleaning_operation },
    KeywordRule { keywords: FINANCIAL_REPORT_KEYWORDS, build: financial_reports_operation },
    KeywordRule { keywords: FORMULA_KEYWORDS, build: formula_operation },
    KeywordRule { keywords: READ_KEYWORDS, build: read_range_operation },
    KeywordRule { keywords: CHART_KEYWORDS, build: chart_operation },
];

/// Scan `user_message` against the rule table and return the matching
/// operation descriptors in table order. Pure and stateless: identical
/// input always yields identical output.
pub fn compose(user_message: &str) -> Vec<ExcelOperation> {
    let normalized = user_message.to_lowercase();
    let trimmed = normalized.trim();

    if trimmed.chars().count() <= SMALL_TALK_MAX_CHARS
        && contains_any(trimmed, SMALL_TALK_KEYWORDS)
    {
        return Vec::new();
    }

    let mut operations: Vec<ExcelOperation> = RULES
        .iter()
        .filter(|rule| contains_any(&normalized, rule.keywords))
        .map(|rule| (rule.build)(&normalized))
        .collect();

    if operations.is_empty() && contains_any(&normalized, EXCEL_CONTEXT_KEYWORDS) {
        operations.push(sheet_info_operation());
    }

    operations
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn voucher_operation(_message: &str) -> ExcelOperation {
    ExcelOperation {
        operation_type: OperationType::VoucherEntry,
        description: "创建会计凭证录入模板".to_string(),
        js_code: Some(snippets::VOUCHER_TEMPLATE.to_string()),
        parameters: object(json!({ "header_range": "A1:F1" })),
    }
}

fn reconciliation_operation(_message: &str) -> ExcelOperation {
    ExcelOperation {
        operation_type: OperationType::ReconciliationAnalysis,
        description: "生成两表对账分析模板".to_string(),
        js_code: Some(snippets::RECONCILIATION_TEMPLATE.to_string()),
        parameters: object(json!({ "diff_column": "G" })),
    }
}

fn data_cleaning_operation(_message: &str) -> ExcelOperation {
    ExcelOperation {
        operation_type: OperationType::DataCleaning,
        description: "清洗数据：删除空行并规范列格式".to_string(),
        js_code: Some(snippets::DATA_CLEANING_TEMPLATE.to_string()),
        parameters: Map::new(),
    }
}

fn financial_reports_operation(_message: &str) -> ExcelOperation {
    ExcelOperation {
        operation_type: OperationType::FinancialReports,
        description: "生成资产负债表、利润表和现金流量表模板".to_string(),
        js_code: Some(snippets::FINANCIAL_REPORTS_TEMPLATE.to_string()),
        parameters: object(json!({ "sheets": ["资产负债表", "利润表", "现金流量表"] })),
    }
}

fn formula_operation(message: &str) -> ExcelOperation {
    // Two canned formulas only; real synthesis goes through the
    // generate-formula flow.
    let formula =
        if message.contains("求和") || message.contains("sum") { "=SUM(A1:A10)" } else { "=A1+B1" };

    ExcelOperation {
        operation_type: OperationType::SetFormula,
        description: "生成Excel公式".to_string(),
        js_code: Some(snippets::set_formula(formula)),
        parameters: object(json!({ "formula": formula, "target_cell": "C1" })),
    }
}

fn read_range_operation(_message: &str) -> ExcelOperation {
    ExcelOperation {
        operation_type: OperationType::ReadRange,
        description: "读取数据范围".to_string(),
        js_code: Some(snippets::READ_RANGE.to_string()),
        parameters: object(json!({ "range": "A1:A10" })),
    }
}

fn chart_operation(_message: &str) -> ExcelOperation {
    ExcelOperation {
        operation_type: OperationType::CreateChart,
        description: "创建柱状图".to_string(),
        js_code: Some(snippets::CREATE_CHART.to_string()),
        parameters: object(json!({
            "chart_type": "column",
            "data_range": "A1:B10",
            "title": "数据图表"
        })),
    }
}

fn sheet_info_operation() -> ExcelOperation {
    ExcelOperation {
        operation_type: OperationType::SheetInfo,
        description: "查看当前工作表信息".to_string(),
        js_code: Some(snippets::SHEET_INFO.to_string()),
        parameters: Map::new(),
    }
}
