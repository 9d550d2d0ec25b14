//!
//! EXPLAIN text parser
//! -------------------
//! Turns Greenplum or PostgreSQL EXPLAIN / EXPLAIN ANALYZE text output into an
//! [`Explain`]. Node lines carry `(cost=a..b rows=n width=w)`, children are
//! found by indentation, `SubPlan` / `InitPlan` lines open nested plans, and
//! everything else indented under a node becomes that node's extra info.
//! Trailer sections (slice statistics, statement statistics, settings,
//! optimizer status, runtime) are collected into the explain itself.
//!
//! After the tree is built the derived figures (own cost, own time and their
//! percentages) are computed and the quality checks run.

use std::iter::Peekable;
use std::vec::IntoIter;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::checks;
use crate::error::{PlanError, PlanResult};
use crate::model::{Explain, Node, Setting, SubPlan};

static NODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<op>.+?)\s+\(cost=(?P<startup>[0-9.]+)\.\.(?P<total>[0-9.]+)\s+rows=(?P<rows>\d+)\s+width=(?P<width>\d+)\)(?P<rest>.*)$")
        .expect("node regex")
});
static ACTUAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(actual time=(?P<first>[0-9.]+)\.\.(?P<end>[0-9.]+)\s+rows=(?P<rows>\d+)\s+loops=\d+\)").expect("actual regex")
});
static SLICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(slice(?P<slice>\d+)(?:;[^)]*)?\)").expect("slice regex"));
static OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<kind>.*?)\s+on\s+(?P<object>\S+)").expect("object regex"));
static SUBPLAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:SubPlan|InitPlan)\b").expect("subplan regex"));
static ROWS_AVG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Rows out:\s+Avg\s+(?P<avg>[0-9.]+)\s+rows\s+x\s+(?P<workers>\d+)\s+workers.*?Max\s+(?P<max>[0-9.]+)\s+rows(?:\s+\((?P<seg>seg-?\d+)\))?")
        .expect("rows avg regex")
});
static ROWS_ONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Rows out:\s+(?P<rows>[0-9.]+)\s+rows(?:\s+\((?P<seg>seg-?\d+)\))?").expect("rows regex")
});
static FIRST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?P<ms>[0-9.]+) ms to first row").expect("first regex"));
static END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?P<ms>[0-9.]+) ms to end").expect("end regex"));
static OFFSET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"start offset by (?P<ms>[0-9.]+) ms").expect("offset regex"));
static MEMORY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Memory (?P<kind>used|wanted):\s+(?P<kb>\d+)").expect("memory regex"));
static RUNTIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:total runtime|execution time):\s+(?P<ms>[0-9.]+)\s*ms").expect("runtime regex")
});
static ROW_COUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(\d+ rows?\)$").expect("row count regex"));

/// Parse EXPLAIN text and run the quality checks over the result.
pub fn parse_explain(text: &str) -> PlanResult<Explain> {
    if text.trim().is_empty() {
        return Err(PlanError::parse("Plan text is empty"));
    }
    let mut reader = Reader::default();
    for raw in text.lines() {
        reader.read_line(raw)?;
    }
    let Reader { items, mut explain, .. } = reader;
    if items.is_empty() {
        return Err(PlanError::parse("No plan nodes found in plan text"));
    }
    explain.plans = build_plans(items)?;
    derive_figures(&mut explain);
    checks::apply_checks(&mut explain);
    debug!(plans = explain.plans.len(), warnings = explain.warnings.len(), "parsed explain");
    Ok(explain)
}

enum Item {
    Node { indent: usize, node: Node },
    SubPlan { indent: usize, name: String },
}

impl Item {
    fn indent(&self) -> usize {
        match self {
            Item::Node { indent, .. } | Item::SubPlan { indent, .. } => *indent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Plan,
    SliceStats,
    StatementStats,
    Settings,
    Ignore,
}

#[derive(Default)]
struct Reader {
    items: Vec<Item>,
    explain: Explain,
    mode: Mode,
    root_indent: Option<usize>,
}

impl Reader {
    fn read_line(&mut self, raw: &str) -> PlanResult<()> {
        let Some(line) = clean_line(raw) else { return Ok(()) };
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();

        let arrow = trimmed.starts_with("->");
        let node_text = trimmed.trim_start_matches("->").trim_start();
        if NODE_RE.is_match(node_text) {
            let accept = match self.root_indent {
                None => true,
                Some(root) => arrow || indent <= root,
            };
            if accept {
                if self.root_indent.is_none() {
                    self.root_indent = Some(indent);
                }
                let node = parse_node_line(trimmed)?;
                self.items.push(Item::Node { indent, node });
                self.mode = Mode::Plan;
                return Ok(());
            }
        }

        if self.read_trailer(trimmed) {
            return Ok(());
        }

        match self.mode {
            Mode::Plan => {
                if self.items.is_empty() {
                    // preamble before the first node
                } else if SUBPLAN_RE.is_match(trimmed) {
                    self.items.push(Item::SubPlan { indent, name: trimmed.to_string() });
                } else if let Some(node) = self.last_node() {
                    node.extra_info.push(trimmed.to_string());
                }
            }
            Mode::SliceStats => self.explain.slice_stats.push(trimmed.to_string()),
            Mode::StatementStats => {
                if let Some(c) = MEMORY_RE.captures(trimmed) {
                    let kb = c["kb"].parse::<i64>().unwrap_or(0);
                    match &c["kind"] {
                        "used" => self.explain.memory_used = kb,
                        _ => self.explain.memory_wanted = kb,
                    }
                }
            }
            Mode::Settings => parse_settings(trimmed, &mut self.explain.settings),
            Mode::Ignore => {}
        }
        Ok(())
    }

    /// Section headers after the plan tree. Returns true when consumed.
    fn read_trailer(&mut self, trimmed: &str) -> bool {
        if let Some(rest) = trimmed.strip_prefix("Slice statistics:") {
            self.mode = Mode::SliceStats;
            if !rest.trim().is_empty() {
                self.explain.slice_stats.push(rest.trim().to_string());
            }
        } else if trimmed.starts_with("Statement statistics:") {
            self.mode = Mode::StatementStats;
        } else if let Some(rest) = trimmed.strip_prefix("Settings:") {
            self.mode = Mode::Settings;
            parse_settings(rest, &mut self.explain.settings);
        } else if let Some(rest) = trimmed.strip_prefix("Optimizer status:").or_else(|| trimmed.strip_prefix("Optimizer:")) {
            self.mode = Mode::Ignore;
            self.explain.optimizer_status = rest.trim().to_string();
        } else if let Some(c) = RUNTIME_RE.captures(trimmed) {
            self.mode = Mode::Ignore;
            self.explain.runtime = c["ms"].parse::<f64>().unwrap_or(0.0);
        } else if starts_with_ignore_case(trimmed, "Planning time:") || trimmed == "JIT:" {
            self.mode = Mode::Ignore;
        } else {
            return false;
        }
        true
    }

    fn last_node(&mut self) -> Option<&mut Node> {
        self.items.iter_mut().rev().find_map(|item| match item {
            Item::Node { node, .. } => Some(node),
            Item::SubPlan { .. } => None,
        })
    }
}

/// Drop psql decorations; `None` for lines that carry no plan content.
fn clean_line(raw: &str) -> Option<&str> {
    let mut line = raw.trim_end();
    if let Some(stripped) = line.strip_suffix('+') {
        line = stripped.trim_end();
    }
    let trimmed = line.trim();
    if trimmed.is_empty()
        || trimmed == "QUERY PLAN"
        || trimmed.chars().all(|c| c == '-' || c == '+')
        || ROW_COUNT_RE.is_match(trimmed)
    {
        return None;
    }
    Some(line)
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.is_char_boundary(prefix.len()) && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn parse_settings(text: &str, out: &mut Vec<Setting>) {
    for part in text.split([';', ',']) {
        if let Some((name, value)) = part.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                out.push(Setting { name: name.to_string(), value: value.trim().to_string() });
            }
        }
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, what: &str, line: &str) -> PlanResult<T> {
    text.parse::<T>()
        .map_err(|_| PlanError::parse(format!("Malformed {} '{}' in line: {}", what, text, line)))
}

fn parse_node_line(line: &str) -> PlanResult<Node> {
    let text = line.trim_start_matches("->").trim();
    let caps = NODE_RE
        .captures(text)
        .ok_or_else(|| PlanError::parse(format!("Unable to parse plan node: {}", text)))?;

    let mut operator = caps["op"].trim().to_string();
    let mut slice = None;
    if let Some(s) = SLICE_RE.captures(&operator) {
        slice = s["slice"].parse::<u32>().ok();
        operator = SLICE_RE.replace(&operator, "").trim().to_string();
    }

    let mut node = Node::new(operator).with_cost(
        parse_number(&caps["startup"], "startup cost", line)?,
        parse_number(&caps["total"], "total cost", line)?,
        parse_number(&caps["rows"], "row estimate", line)?,
        parse_number(&caps["width"], "width", line)?,
    );
    node.slice = slice;
    node.extra_info = vec![line.trim().to_string()];

    let rest = &caps["rest"];
    if let Some(a) = ACTUAL_RE.captures(rest) {
        node.is_analyzed = true;
        node.actual_rows = Some(parse_number(&a["rows"], "actual rows", line)?);
        node.ms_first = parse_number(&a["first"], "actual time", line)?;
        node.ms_end = parse_number(&a["end"], "actual time", line)?;
    } else if rest.contains("(never executed)") {
        node.is_analyzed = true;
        node.actual_rows = Some(0.0);
    }

    let (object, object_type) = derive_object(&node.operator);
    node.object = object;
    node.object_type = object_type;
    Ok(node)
}

fn derive_object(operator: &str) -> (String, String) {
    let Some(c) = OBJECT_RE.captures(operator) else {
        return (String::new(), String::new());
    };
    let kind = &c["kind"];
    let object_type = if kind.contains("Function Scan") {
        "FUNCTION"
    } else if kind.contains("CTE Scan") {
        "CTE"
    } else if kind.contains("Subquery Scan") {
        "SUBQUERY"
    } else if kind.contains("Index Scan") || kind.contains("Index Only Scan") {
        "INDEX"
    } else {
        "TABLE"
    };
    (c["object"].trim_matches('"').to_string(), object_type.to_string())
}

fn build_plans(items: Vec<Item>) -> PlanResult<Vec<SubPlan>> {
    let mut iter = items.into_iter().peekable();
    let mut plans = Vec::new();
    while let Some(item) = iter.next() {
        match item {
            Item::Node { indent, node } => {
                let top = build_node(indent, node, &mut iter)?;
                plans.push(SubPlan::new(format!("Plan {}", plans.len() + 1), top));
            }
            Item::SubPlan { indent, name } => {
                let top = sub_plan_root(indent, &name, &mut iter)?;
                plans.push(SubPlan::new(name, top));
            }
        }
    }
    Ok(plans)
}

/// Attach every following item indented deeper than `indent` to `node`.
fn build_node(indent: usize, mut node: Node, iter: &mut Peekable<IntoIter<Item>>) -> PlanResult<Node> {
    while iter.peek().is_some_and(|next| next.indent() > indent) {
        match iter.next() {
            Some(Item::Node { indent: child_indent, node: child }) => {
                node.sub_nodes.push(build_node(child_indent, child, iter)?);
            }
            Some(Item::SubPlan { indent: header_indent, name }) => {
                let top = sub_plan_root(header_indent, &name, iter)?;
                node.sub_plans.push(SubPlan::new(name, top));
            }
            None => break,
        }
    }
    Ok(node)
}

fn sub_plan_root(header_indent: usize, name: &str, iter: &mut Peekable<IntoIter<Item>>) -> PlanResult<Node> {
    match iter.next_if(|next| matches!(next, Item::Node { indent, .. } if *indent > header_indent)) {
        Some(Item::Node { indent, node }) => build_node(indent, node, iter),
        _ => Err(PlanError::parse(format!("{} has no plan node", name))),
    }
}

fn derive_figures(explain: &mut Explain) {
    for plan in &mut explain.plans {
        plan.top_node.walk_mut(&mut |node: &mut Node| apply_row_stats(node));
    }

    let reference_ms = if explain.runtime > 0.0 {
        explain.runtime
    } else {
        explain.plans.iter().map(|p| p.top_node.ms_end).fold(0.0, f64::max)
    };

    for plan in &mut explain.plans {
        let root_total = plan.top_node.total_cost;
        plan.top_node.walk_mut(&mut |node: &mut Node| {
            let child_cost: f64 = node.sub_nodes.iter().map(|c| c.total_cost).sum();
            node.node_cost = (node.total_cost - child_cost).max(0.0);
            node.prct_cost = if root_total > 0.0 { node.node_cost / root_total * 100.0 } else { 0.0 };

            if node.is_analyzed {
                let child_ms: f64 = node.sub_nodes.iter().map(|c| c.ms_end).sum();
                node.ms_node = (node.ms_end - child_ms).max(0.0);
                node.ms_prct = if reference_ms > 0.0 { node.ms_node / reference_ms * 100.0 } else { 0.0 };
            }
        });
    }
}

/// Read Greenplum `Rows out:` lines from the node's extra info.
fn apply_row_stats(node: &mut Node) {
    let Some(line) = node.extra_info.iter().skip(1).find(|l| l.starts_with("Rows out:")).cloned() else {
        return;
    };
    node.is_analyzed = true;
    if let Some(c) = ROWS_AVG_RE.captures(&line) {
        node.actual_rows = None;
        node.avg_rows = c["avg"].parse().unwrap_or(0.0);
        node.workers = c["workers"].parse().unwrap_or(0);
        node.max_rows = c["max"].parse().unwrap_or(0.0);
        node.max_seg = c.name("seg").map(|m| m.as_str().to_string()).unwrap_or_default();
    } else if let Some(c) = ROWS_ONE_RE.captures(&line) {
        node.actual_rows = c["rows"].parse().ok();
        node.max_seg = c.name("seg").map(|m| m.as_str().to_string()).unwrap_or_default();
    }
    node.ms_end = capture_ms(&END_RE, &line).unwrap_or(0.0);
    node.ms_first = capture_ms(&FIRST_RE, &line).unwrap_or(node.ms_end);
    node.ms_offset = capture_ms(&OFFSET_RE, &line).unwrap_or(0.0);
}

fn capture_ms(re: &Regex, line: &str) -> Option<f64> {
    re.captures(line).and_then(|c| c["ms"].parse::<f64>().ok())
}
