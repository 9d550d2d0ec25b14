use super::rows::Report;

pub fn render_json(report: &Report) -> serde_json::Value {
    serde_json::json!({
        "format": "json",
        "schema": report.schema,
        "width": report.width(),
        "header": report.header,
        "rows": report.rows,
        "sections": report.sections,
    })
}
