//! Plan quality checks.
//!
//! Node checks look at one plan node, explain checks at the whole output.
//! Each hit becomes a [`Warning`] on the node or on the explain. The registry
//! is also listed on the landing page.

use serde::Serialize;

use crate::model::{Explain, Node, Warning};

/// Broadcasting more rows than this to every segment is flagged.
pub const BROADCAST_ROW_LIMIT: i64 = 100_000;
/// Max rows on one segment above this multiple of the average is skew.
pub const SKEW_FACTOR: f64 = 2.0;
/// Skew on fewer rows than this is not worth reporting.
pub const SKEW_MIN_ROWS: f64 = 1_000.0;

pub struct NodeCheck {
    pub name: &'static str,
    pub description: &'static str,
    pub scope: &'static [&'static str],
    pub created_at: &'static str,
    pub exec: fn(&Node) -> Option<Warning>,
}

pub struct ExplainCheck {
    pub name: &'static str,
    pub description: &'static str,
    pub scope: &'static [&'static str],
    pub created_at: &'static str,
    pub exec: fn(&Explain) -> Option<Warning>,
}

/// Listing entry for the landing page.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub scope: &'static [&'static str],
    pub created_at: &'static str,
}

pub static NODE_CHECKS: &[NodeCheck] = &[
    NodeCheck {
        name: "nested_loop",
        description: "Nested Loop joins",
        scope: &["legacy", "orca"],
        created_at: "2016-05-23",
        exec: check_nested_loop,
    },
    NodeCheck {
        name: "broadcast_motion",
        description: "Broadcast Motion of a large number of rows",
        scope: &["legacy", "orca"],
        created_at: "2016-05-23",
        exec: check_broadcast_motion,
    },
    NodeCheck {
        name: "one_row_estimate",
        description: "Table scans estimating a single row (missing statistics)",
        scope: &["legacy", "orca"],
        created_at: "2016-05-24",
        exec: check_one_row_estimate,
    },
    NodeCheck {
        name: "data_skew",
        description: "Rows unevenly spread across segments (EXPLAIN ANALYZE only)",
        scope: &["legacy", "orca"],
        created_at: "2016-05-27",
        exec: check_data_skew,
    },
    NodeCheck {
        name: "spill",
        description: "Operators spilling to workfiles (EXPLAIN ANALYZE only)",
        scope: &["legacy", "orca"],
        created_at: "2016-06-01",
        exec: check_spill,
    },
];

pub static EXPLAIN_CHECKS: &[ExplainCheck] = &[
    ExplainCheck {
        name: "legacy_optimizer",
        description: "Plan produced by the legacy query optimizer",
        scope: &["legacy"],
        created_at: "2016-05-24",
        exec: check_legacy_optimizer,
    },
    ExplainCheck {
        name: "enable_nestloop",
        description: "enable_nestloop switched on",
        scope: &["legacy"],
        created_at: "2016-05-24",
        exec: check_enable_nestloop,
    },
];

pub fn catalog() -> Vec<CheckInfo> {
    NODE_CHECKS
        .iter()
        .map(|c| CheckInfo { name: c.name, description: c.description, scope: c.scope, created_at: c.created_at })
        .chain(EXPLAIN_CHECKS.iter().map(|c| CheckInfo {
            name: c.name,
            description: c.description,
            scope: c.scope,
            created_at: c.created_at,
        }))
        .collect()
}

/// Run every registered check, appending warnings to the nodes and the explain.
pub fn apply_checks(explain: &mut Explain) {
    for plan in &mut explain.plans {
        plan.top_node.walk_mut(&mut |node: &mut Node| {
            let hits: Vec<Warning> = NODE_CHECKS.iter().filter_map(|c| (c.exec)(node)).collect();
            node.warnings.extend(hits);
        });
    }
    let whole: &Explain = explain;
    let hits: Vec<Warning> = EXPLAIN_CHECKS.iter().filter_map(|c| (c.exec)(whole)).collect();
    explain.warnings.extend(hits);
}

fn check_nested_loop(node: &Node) -> Option<Warning> {
    node.operator.contains("Nested Loop").then(|| {
        Warning::new("Nested Loop", "Review the query for a missing join condition or a non-equi join")
    })
}

fn check_broadcast_motion(node: &Node) -> Option<Warning> {
    (node.operator.contains("Broadcast Motion") && node.rows > BROADCAST_ROW_LIMIT).then(|| {
        Warning::new(
            format!("Broadcast Motion of {} rows", node.rows),
            "Check the tables are analyzed and consider redistributing on the join key",
        )
    })
}

fn check_one_row_estimate(node: &Node) -> Option<Warning> {
    let table_scan = node.object_type == "TABLE" && node.operator.contains("Scan");
    (table_scan && node.rows == 1).then(|| {
        Warning::new(
            format!("Estimated 1 row for {}", node.object),
            format!("Run ANALYZE on {}", node.object),
        )
    })
}

fn check_data_skew(node: &Node) -> Option<Warning> {
    if !node.is_analyzed || node.actual_rows.is_some() || node.workers < 2 || node.avg_rows <= 0.0 {
        return None;
    }
    (node.max_rows >= SKEW_MIN_ROWS && node.max_rows > node.avg_rows * SKEW_FACTOR).then(|| {
        Warning::new(
            format!("Data skew: max {:.0} rows on {} vs avg {:.0}", node.max_rows, node.max_seg, node.avg_rows),
            "Review the distribution key of the underlying tables",
        )
    })
}

fn check_spill(node: &Node) -> Option<Warning> {
    let spilled = node.extra_info.iter().skip(1).any(|l| {
        let l = l.to_ascii_lowercase();
        l.contains("spilling") || l.contains("work_mem wanted")
    });
    spilled.then(|| Warning::new("Operator spilled to disk", "Increase statement_mem or reduce the rows reaching this operator"))
}

fn check_legacy_optimizer(explain: &Explain) -> Option<Warning> {
    explain.optimizer_status.to_ascii_lowercase().contains("legacy").then(|| {
        Warning::new("Legacy query optimizer used", "Set optimizer=on to plan with ORCA")
    })
}

fn check_enable_nestloop(explain: &Explain) -> Option<Warning> {
    explain
        .setting("enable_nestloop")
        .filter(|v| v.eq_ignore_ascii_case("on"))
        .map(|_| Warning::new("enable_nestloop is on", "Set enable_nestloop=off unless nested loops are required"))
}
