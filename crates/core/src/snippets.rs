//! Fixed Office.js snippet templates handed to the taskpane client.
//!
//! These are the only executable payloads the backend ever returns. The
//! LLM is asked for conversational text, formulas, and explanations,
//! never for code; operation snippets come exclusively from this table,
//! with at most a detected formula string substituted in.

pub const READ_RANGE: &str = r#"Excel.run(async (context) => {
    const sheet = context.workbook.worksheets.getActiveWorksheet();
    const range = sheet.getRange("A1:A10");
    range.load("values");
    await context.sync();
    console.log("数据已读取:", range.values);
});"#;

pub const CREATE_CHART: &str = r#"Excel.run(async (context) => {
    const sheet = context.workbook.worksheets.getActiveWorksheet();
    const dataRange = sheet.getRange("A1:B10");
    const chart = sheet.charts.add(Excel.ChartType.columnClustered, dataRange);
    chart.title.text = "数据图表";
    chart.legend.position = Excel.ChartLegendPosition.right;
    await context.sync();
    console.log("图表创建成功");
});"#;

pub const VOUCHER_TEMPLATE: &str = r##"Excel.run(async (context) => {
    const sheet = context.workbook.worksheets.getActiveWorksheet();
    const headers = [["日期", "凭证号", "摘要", "借方科目", "贷方科目", "金额"]];
    const headerRange = sheet.getRange("A1:F1");
    headerRange.values = headers;
    headerRange.format.font.bold = true;
    headerRange.format.fill.color = "#D9E1F2";
    sheet.getRange("A1:F100").format.autofitColumns();
    await context.sync();
    console.log("凭证录入模板已创建");
});"##;

pub const RECONCILIATION_TEMPLATE: &str = r#"Excel.run(async (context) => {
    const sheet = context.workbook.worksheets.getActiveWorksheet();
    sheet.getRange("A1").values = [["账面数据"]];
    sheet.getRange("D1").values = [["对方数据"]];
    sheet.getRange("G1").values = [["差异"]];
    sheet.getRange("G2").formulas = [["=IF(B2=E2,\"一致\",B2-E2)"]];
    sheet.getRange("G2").copyFrom("G2");
    await context.sync();
    console.log("对账模板已创建");
});"#;

pub const DATA_CLEANING_TEMPLATE: &str = r#"Excel.run(async (context) => {
    const sheet = context.workbook.worksheets.getActiveWorksheet();
    const used = sheet.getUsedRange();
    used.load("values, rowCount");
    await context.sync();
    const rows = used.values.filter(row => row.some(cell => cell !== "" && cell !== null));
    const target = sheet.getRangeByIndexes(0, 0, rows.length, rows[0].length);
    target.values = rows;
    target.format.horizontalAlignment = Excel.HorizontalAlignment.left;
    target.numberFormat = rows.map(row => row.map(() => "General"));
    await context.sync();
    console.log("数据清洗完成: 空行已删除, 列格式已规范");
});"#;

pub const FINANCIAL_REPORTS_TEMPLATE: &str = r#"Excel.run(async (context) => {
    const names = ["资产负债表", "利润表", "现金流量表"];
    for (const name of names) {
        let sheet = context.workbook.worksheets.getItemOrNullObject(name);
        await context.sync();
        if (sheet.isNullObject) {
            sheet = context.workbook.worksheets.add(name);
        }
        sheet.getRange("A1").values = [[name]];
        sheet.getRange("A1").format.font.bold = true;
    }
    await context.sync();
    console.log("三大报表框架已生成");
});"#;

pub const SHEET_INFO: &str = r#"Excel.run(async (context) => {
    const sheet = context.workbook.worksheets.getActiveWorksheet();
    sheet.load("name");
    await context.sync();
    console.log("当前工作表:", sheet.name);
});"#;

/// The one parameterized template: inserts `formula` into C1.
pub fn set_formula(formula: &str) -> String {
    format!(
        r#"Excel.run(async (context) => {{
    const sheet = context.workbook.worksheets.getActiveWorksheet();
    const range = sheet.getRange("C1");
    range.formulas = [["{formula}"]];
    await context.sync();
    console.log("公式已生成: {formula}");
}});"#
    )
}

#[cfg(test)]
mod tests {
    use super::set_formula;

    #[test]
    fn set_formula_substitutes_the_detected_formula() {
        let snippet = set_formula("=SUM(A1:A10)");
        assert!(snippet.contains(r#"range.formulas = [["=SUM(A1:A10)"]]"#));
        assert!(snippet.starts_with("Excel.run"));
    }
}
