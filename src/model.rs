//! Plan model consumed by the report renderer.
//!
//! The parser builds it, the checks annotate it, and the renderer only reads
//! it. Each node owns its child nodes and sub-plans; there are no back
//! references. Where the text format uses `-1` for "not reported" the model
//! uses `Option`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub operator: String,
    pub object: String,
    pub object_type: String,
    /// Parallel execution slice, `None` when the node carries no slice.
    pub slice: Option<u32>,
    pub startup_cost: f64,
    pub total_cost: f64,
    /// Cost of this node alone, total minus the children's totals.
    pub node_cost: f64,
    pub prct_cost: f64,
    pub rows: i64,
    pub width: i64,
    pub is_analyzed: bool,
    /// Rows reported for this node directly; `None` when only per-worker
    /// averages/maxima are known.
    pub actual_rows: Option<f64>,
    pub avg_rows: f64,
    pub max_rows: f64,
    pub max_seg: String,
    pub workers: i64,
    pub ms_first: f64,
    pub ms_node: f64,
    pub ms_prct: f64,
    pub ms_end: f64,
    pub ms_offset: f64,
    /// Raw lines belonging to the node. The first is the node's own line.
    pub extra_info: Vec<String>,
    pub warnings: Vec<Warning>,
    pub sub_nodes: Vec<Node>,
    pub sub_plans: Vec<SubPlan>,
}

impl Node {
    pub fn new(operator: impl Into<String>) -> Self {
        let operator = operator.into();
        Self { extra_info: vec![operator.clone()], operator, ..Default::default() }
    }

    pub fn with_cost(mut self, startup: f64, total: f64, rows: i64, width: i64) -> Self {
        self.startup_cost = startup;
        self.total_cost = total;
        self.rows = rows;
        self.width = width;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.sub_nodes.push(child);
        self
    }

    pub fn with_sub_plan(mut self, name: impl Into<String>, top_node: Node) -> Self {
        self.sub_plans.push(SubPlan::new(name, top_node));
        self
    }

    /// Number of nodes in this subtree, sub-plan roots included.
    pub fn node_count(&self) -> usize {
        1 + self.sub_nodes.iter().map(Node::node_count).sum::<usize>()
            + self.sub_plans.iter().map(|p| p.top_node.node_count()).sum::<usize>()
    }

    /// Number of sub-plans anywhere in this subtree.
    pub fn sub_plan_count(&self) -> usize {
        self.sub_nodes.iter().map(Node::sub_plan_count).sum::<usize>()
            + self.sub_plans.iter().map(|p| 1 + p.top_node.sub_plan_count()).sum::<usize>()
    }

    /// Pre-order walk over this node and every descendant.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in &mut self.sub_nodes {
            child.walk_mut(f);
        }
        for plan in &mut self.sub_plans {
            plan.top_node.walk_mut(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPlan {
    pub name: String,
    pub top_node: Node,
}

impl SubPlan {
    pub fn new(name: impl Into<String>, top_node: Node) -> Self {
        Self { name: name.into(), top_node }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub cause: String,
    pub resolution: String,
}

impl Warning {
    pub fn new(cause: impl Into<String>, resolution: impl Into<String>) -> Self {
        Self { cause: cause.into(), resolution: resolution.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

/// A whole EXPLAIN output: one or more top-level plans plus trailer data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explain {
    pub plans: Vec<SubPlan>,
    pub warnings: Vec<Warning>,
    pub slice_stats: Vec<String>,
    pub settings: Vec<Setting>,
    /// Kilobytes; 0 when not reported.
    pub memory_used: i64,
    pub memory_wanted: i64,
    pub optimizer_status: String,
    /// Milliseconds; 0 when not reported.
    pub runtime: f64,
}

impl Explain {
    pub fn from_plans(plans: Vec<SubPlan>) -> Self {
        Self { plans, ..Default::default() }
    }

    pub fn setting(&self, name: &str) -> Option<&str> {
        self.settings.iter().find(|s| s.name.eq_ignore_ascii_case(name)).map(|s| s.value.as_str())
    }
}
