use crate::config::ReportConfig;
use crate::model::Explain;

use super::render::PlanTreeRenderer;
use super::rows::{Align, Cell, ColumnSchema, Report, Row, RowKind, Section};

/// Builds a [`Report`] from a parsed EXPLAIN. Pure: equal input, equal output.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    renderer: PlanTreeRenderer,
}

impl ReportAssembler {
    pub fn new(config: &ReportConfig) -> Self {
        Self { renderer: PlanTreeRenderer::new(config) }
    }

    pub fn build(&self, explain: &Explain) -> Report {
        // Only the first plan's root decides the columns for the whole report.
        let schema = explain
            .plans
            .first()
            .map(|p| ColumnSchema::for_node(&p.top_node))
            .unwrap_or(ColumnSchema::Estimated);

        let rows = explain
            .plans
            .iter()
            .flat_map(|p| self.renderer.render_node_with(&p.top_node, 0, schema))
            .collect();

        Report { schema, header: header_rows(schema), rows, sections: sections(explain) }
    }
}

fn header_rows(schema: ColumnSchema) -> Vec<Row> {
    let mut groups = vec![
        Cell::heading("", 1, Align::Left),
        Cell::heading("Object", 2, Align::Center),
        Cell::heading("Cost", 4, Align::Center),
        Cell::heading("Estimated", 1, Align::Center),
    ];
    let mut names = vec![Cell::heading("Query Plan:", 1, Align::Left)];
    names.extend(
        ["Name", "Type", "Startup", "Node", "Prct", "Total", "Rows"]
            .iter()
            .map(|n| Cell::heading(n, 1, Align::Right)),
    );
    if schema.is_analyzed() {
        groups.push(Cell::heading("Row Stats", 5, Align::Center));
        groups.push(Cell::heading("Time Ms", 5, Align::Center));
        names.extend(
            ["Actual", "Avg", "Max", "Seg", "Workers", "First", "Node", "Prct", "End", "Offset"]
                .iter()
                .map(|n| Cell::heading(n, 1, Align::Right)),
        );
    }
    vec![Row::new(RowKind::Header, groups), Row::new(RowKind::Header, names)]
}

fn sections(explain: &Explain) -> Vec<Section> {
    let mut out = Vec::new();
    if !explain.warnings.is_empty() {
        out.push(Section::Warnings(explain.warnings.clone()));
    }
    if !explain.slice_stats.is_empty() {
        out.push(Section::SliceStatistics(explain.slice_stats.clone()));
    }
    if explain.memory_used > 0 {
        out.push(Section::StatementStatistics {
            memory_used: explain.memory_used,
            memory_wanted: (explain.memory_wanted > 0).then_some(explain.memory_wanted),
        });
    }
    if !explain.settings.is_empty() {
        out.push(Section::Settings(explain.settings.clone()));
    }
    if !explain.optimizer_status.is_empty() {
        out.push(Section::OptimizerStatus(explain.optimizer_status.clone()));
    }
    if explain.runtime > 0.0 {
        out.push(Section::TotalRuntime(explain.runtime));
    }
    out
}
