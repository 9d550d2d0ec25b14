//! Plan tree to display rows.
//!
//! Rows are emitted pre-order: a node, then its child nodes, then for each
//! sub-plan a header row followed by the sub-plan's tree. Every row covers the
//! full width of the schema it was rendered with.

use crate::config::ReportConfig;
use crate::model::{Node, SubPlan};

use super::rows::{Cell, ColumnSchema, Description, Row, RowKind};

#[derive(Debug, Clone)]
pub struct PlanTreeRenderer {
    config: ReportConfig,
}

impl PlanTreeRenderer {
    pub fn new(config: &ReportConfig) -> Self {
        Self { config: *config }
    }

    pub fn indent_px(&self, depth: u32) -> u32 {
        depth
            .saturating_mul(self.config.indent_unit)
            .saturating_mul(self.config.indent_multiplier)
    }

    /// Render `node` and its descendants using the node's own schema.
    pub fn render_node(&self, node: &Node, depth: u32) -> Vec<Row> {
        self.render_node_with(node, depth, ColumnSchema::for_node(node))
    }

    /// Render `node` and its descendants with a schema fixed by the caller.
    pub fn render_node_with(&self, node: &Node, depth: u32, schema: ColumnSchema) -> Vec<Row> {
        let mut rows = Vec::with_capacity(node.node_count() + node.sub_plan_count());
        self.emit_node(node, depth, schema, &mut rows);
        rows
    }

    fn emit_node(&self, node: &Node, depth: u32, schema: ColumnSchema, out: &mut Vec<Row>) {
        let depth = depth + 1;
        out.push(self.node_row(node, depth, schema));
        for child in &node.sub_nodes {
            self.emit_node(child, depth, schema, out);
        }
        for plan in &node.sub_plans {
            self.emit_sub_plan(plan, depth, schema, out);
        }
    }

    fn emit_sub_plan(&self, plan: &SubPlan, depth: u32, schema: ColumnSchema, out: &mut Vec<Row>) {
        let depth = depth + 1;
        out.push(Row::sub_plan(self.indent_px(depth), &plan.name, schema));
        self.emit_node(&plan.top_node, depth, schema, out);
    }

    fn node_row(&self, node: &Node, depth: u32, schema: ColumnSchema) -> Row {
        let mut cells = Vec::with_capacity(schema.width());
        cells.push(Cell::Description(Description {
            indent_px: self.indent_px(depth),
            slice: node.slice,
            summary: summary_line(node),
            lines: node.extra_info.iter().skip(1).map(|l| l.trim().to_string()).collect(),
            warnings: node.warnings.clone(),
        }));
        cells.extend(core_cells(node));
        if schema.is_analyzed() {
            if node.is_analyzed {
                cells.extend(row_stat_cells(node));
                cells.extend(timing_cells(node));
            } else {
                cells.extend(std::iter::repeat_with(|| Cell::Placeholder).take(10));
            }
        }
        Row::new(RowKind::Node, cells)
    }
}

pub fn summary_line(node: &Node) -> String {
    format!(
        "-> {} (cost={:.2}..{:.2} rows={} width={})",
        node.operator, node.startup_cost, node.total_cost, node.rows, node.width
    )
}

fn core_cells(node: &Node) -> [Cell; 7] {
    [
        Cell::Text(node.object.clone()),
        Cell::Text(node.object_type.clone()),
        Cell::Number(node.startup_cost),
        Cell::Number(node.node_cost),
        Cell::Percent(node.prct_cost),
        Cell::Number(node.total_cost),
        Cell::Count(node.rows),
    ]
}

/// Actual, Avg, Max, Seg, Workers.
fn row_stat_cells(node: &Node) -> [Cell; 5] {
    match node.actual_rows {
        Some(actual) => [
            Cell::Number(actual),
            Cell::Placeholder,
            Cell::Placeholder,
            Cell::Text(node.max_seg.clone()),
            Cell::Placeholder,
        ],
        None => [
            Cell::Placeholder,
            Cell::Number(node.avg_rows),
            Cell::Number(node.max_rows),
            Cell::Text(node.max_seg.clone()),
            Cell::Count(node.workers),
        ],
    }
}

fn timing_cells(node: &Node) -> [Cell; 5] {
    [
        Cell::Number(node.ms_first),
        Cell::Number(node.ms_node),
        Cell::Percent(node.ms_prct),
        Cell::Number(node.ms_end),
        Cell::Number(node.ms_offset),
    ]
}
