use serde::Serialize;

use crate::model::{Node, Setting, Warning};

/// Column layout of a report, fixed once per report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSchema {
    /// Description, object (2), cost (4) and estimated rows.
    Estimated,
    /// Estimated columns plus row statistics (5) and timings (5).
    Analyzed,
}

impl ColumnSchema {
    pub const ESTIMATED_WIDTH: usize = 8;
    pub const ANALYZED_WIDTH: usize = 18;

    pub fn for_node(node: &Node) -> Self {
        if node.is_analyzed { ColumnSchema::Analyzed } else { ColumnSchema::Estimated }
    }

    pub fn width(self) -> usize {
        match self {
            ColumnSchema::Estimated => Self::ESTIMATED_WIDTH,
            ColumnSchema::Analyzed => Self::ANALYZED_WIDTH,
        }
    }

    pub fn is_analyzed(self) -> bool {
        matches!(self, ColumnSchema::Analyzed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align { Left, Center, Right }

/// First cell of a node row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Description {
    pub indent_px: u32,
    pub slice: Option<u32>,
    pub summary: String,
    pub lines: Vec<String>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Heading { text: String, span: usize, align: Align },
    Description(Description),
    /// Sub-plan name at the start of a sub-plan header row.
    Label { indent_px: u32, text: String },
    Text(String),
    /// Rendered without decimals.
    Number(f64),
    Count(i64),
    Percent(f64),
    /// Value not available for this node.
    Placeholder,
    Blank { span: usize },
}

impl Cell {
    /// Number of table columns the cell covers.
    pub fn span(&self) -> usize {
        match self {
            Cell::Heading { span, .. } | Cell::Blank { span } => *span,
            _ => 1,
        }
    }

    pub(crate) fn heading(text: &str, span: usize, align: Align) -> Self {
        Cell::Heading { text: text.to_string(), span, align }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Header,
    Node,
    SubPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub kind: RowKind,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(kind: RowKind, cells: Vec<Cell>) -> Self {
        Self { kind, cells }
    }

    /// Header row for a nested plan: the name, then one blank cell spanning
    /// the rest of the schema.
    pub fn sub_plan(indent_px: u32, name: &str, schema: ColumnSchema) -> Self {
        Self::new(
            RowKind::SubPlan,
            vec![
                Cell::Label { indent_px, text: name.to_string() },
                Cell::Blank { span: schema.width() - 1 },
            ],
        )
    }

    /// Columns covered by the row, counting spans.
    pub fn width(&self) -> usize {
        self.cells.iter().map(Cell::span).sum()
    }

    pub fn description(&self) -> Option<&Description> {
        match self.cells.first() {
            Some(Cell::Description(d)) => Some(d),
            _ => None,
        }
    }

    pub fn indent_px(&self) -> Option<u32> {
        match self.cells.first() {
            Some(Cell::Description(d)) => Some(d.indent_px),
            Some(Cell::Label { indent_px, .. }) => Some(*indent_px),
            _ => None,
        }
    }
}

/// Summary block printed after the plan table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Section {
    Warnings(Vec<Warning>),
    SliceStatistics(Vec<String>),
    StatementStatistics { memory_used: i64, memory_wanted: Option<i64> },
    Settings(Vec<Setting>),
    OptimizerStatus(String),
    TotalRuntime(f64),
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Warnings(_) => "Warnings:",
            Section::SliceStatistics(_) => "Slice statistics:",
            Section::StatementStatistics { .. } => "Statement statistics:",
            Section::Settings(_) => "Settings:",
            Section::OptimizerStatus(_) => "Optimizer status:",
            Section::TotalRuntime(_) => "Total runtime:",
        }
    }
}

/// Fully assembled, format-neutral plan report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub schema: ColumnSchema,
    pub header: Vec<Row>,
    pub rows: Vec<Row>,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn width(&self) -> usize {
        self.schema.width()
    }

    /// Header rows followed by body rows.
    pub fn all_rows(&self) -> impl Iterator<Item = &Row> {
        self.header.iter().chain(self.rows.iter())
    }
}
