use super::*;
use crate::config::ReportConfig;
use crate::model::{Explain, Node, Setting, SubPlan, Warning};

fn renderer() -> PlanTreeRenderer {
    PlanTreeRenderer::new(&ReportConfig::default())
}

fn seq_scan() -> Node {
    let mut n = Node::new("Seq Scan on foo").with_cost(0.0, 10.0, 100, 4);
    n.object = "foo".into();
    n.object_type = "TABLE".into();
    n.node_cost = 10.0;
    n.prct_cost = 100.0;
    n
}

fn analyzed(mut n: Node, actual: Option<f64>) -> Node {
    n.is_analyzed = true;
    n.actual_rows = actual;
    n.avg_rows = 12.0;
    n.max_rows = 20.0;
    n.max_seg = "seg1".into();
    n.workers = 4;
    n.ms_first = 1.0;
    n.ms_node = 2.0;
    n.ms_prct = 50.0;
    n.ms_end = 3.0;
    n.ms_offset = 0.25;
    n
}

fn value_cells(row: &Row) -> Vec<String> {
    row.cells.iter().skip(1).map(render_html::format_value).collect()
}

/// Hash Join with two scans, one carrying a SubPlan that itself has a child.
fn sample_tree() -> Node {
    let inner = Node::new("Index Scan using bar_pkey on bar")
        .with_cost(0.0, 8.0, 1, 4)
        .with_child(Node::new("Result").with_cost(0.0, 0.01, 1, 0));
    Node::new("Hash Join")
        .with_cost(1.0, 40.0, 100, 8)
        .with_child(seq_scan())
        .with_child(
            Node::new("Hash")
                .with_cost(1.0, 20.0, 10, 4)
                .with_child(Node::new("Seq Scan on baz").with_cost(0.0, 20.0, 10, 4)),
        )
        .with_sub_plan("SubPlan 1", inner)
}

#[test]
fn single_estimated_node() {
    let rows = renderer().render_node(&seq_scan(), 0);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.kind, RowKind::Node);
    assert_eq!(row.cells.len(), 8);
    assert_eq!(row.width(), ColumnSchema::ESTIMATED_WIDTH);
    let d = row.description().unwrap();
    assert_eq!(d.slice, None);
    assert_eq!(d.summary, "-> Seq Scan on foo (cost=0.00..10.00 rows=100 width=4)");
    assert!(d.lines.is_empty());
    assert_eq!(value_cells(row), vec!["foo", "TABLE", "0", "10", "100%", "10", "100"]);
}

#[test]
fn analyzed_node_with_actual_rows() {
    let rows = renderer().render_node(&analyzed(seq_scan(), Some(50.0)), 0);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cells.len(), ColumnSchema::ANALYZED_WIDTH);
    assert_eq!(
        value_cells(&rows[0])[7..],
        ["50", "-", "-", "seg1", "-", "1", "2", "50%", "3", "0"]
    );
}

#[test]
fn analyzed_node_with_worker_stats() {
    let rows = renderer().render_node(&analyzed(seq_scan(), None), 0);
    assert_eq!(rows[0].cells.len(), ColumnSchema::ANALYZED_WIDTH);
    assert_eq!(
        value_cells(&rows[0])[7..],
        ["-", "12", "20", "seg1", "4", "1", "2", "50%", "3", "0"]
    );
}

#[test]
fn row_count_is_nodes_plus_sub_plans() {
    let tree = sample_tree();
    let rows = renderer().render_node(&tree, 0);
    assert_eq!(tree.node_count(), 6);
    assert_eq!(tree.sub_plan_count(), 1);
    assert_eq!(rows.len(), 7);
    let kinds: Vec<RowKind> = rows.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![RowKind::Node, RowKind::Node, RowKind::Node, RowKind::Node, RowKind::SubPlan, RowKind::Node, RowKind::Node]
    );
}

#[test]
fn children_follow_parent_in_pre_order() {
    let rows = renderer().render_node(&sample_tree(), 0);
    let summaries: Vec<String> = rows
        .iter()
        .map(|r| match r.description() {
            Some(d) => d.summary.split(" (cost").next().unwrap_or_default().to_string(),
            None => "<sub>".to_string(),
        })
        .collect();
    assert_eq!(
        summaries,
        vec![
            "-> Hash Join",
            "-> Seq Scan on foo",
            "-> Hash",
            "-> Seq Scan on baz",
            "<sub>",
            "-> Index Scan using bar_pkey on bar",
            "-> Result",
        ]
    );
}

#[test]
fn indentation_grows_with_depth() {
    let rows = renderer().render_node(&sample_tree(), 0);
    let indents: Vec<u32> = rows.iter().map(|r| r.indent_px().unwrap()).collect();
    // root, child, child, grandchild, sub-plan header, sub-plan root, its child
    assert_eq!(indents, vec![40, 80, 80, 120, 80, 120, 160]);

    let cfg = ReportConfig { indent_unit: 2, indent_multiplier: 5 };
    let rows = PlanTreeRenderer::new(&cfg).render_node(&seq_scan(), 2);
    assert_eq!(rows[0].indent_px(), Some(30));
}

#[test]
fn huge_indent_factors_saturate() {
    let cfg = ReportConfig { indent_unit: u32::MAX, indent_multiplier: u32::MAX };
    let rows = PlanTreeRenderer::new(&cfg).render_node(&sample_tree(), 0);
    assert!(rows.iter().all(|r| r.indent_px() == Some(u32::MAX)));
}

#[test]
fn sub_plan_header_spans_remaining_columns() {
    let rows = renderer().render_node(&sample_tree(), 0);
    let header = &rows[4];
    assert_eq!(header.cells.len(), 2);
    assert!(matches!(&header.cells[0], Cell::Label { text, .. } if text == "SubPlan 1"));
    assert_eq!(header.cells[1], Cell::Blank { span: 7 });
    assert_eq!(header.width(), 8);

    let rows = renderer().render_node_with(&sample_tree(), 0, ColumnSchema::Analyzed);
    assert_eq!(rows[4].cells[1], Cell::Blank { span: 17 });
    assert!(rows.iter().all(|r| r.width() == ColumnSchema::ANALYZED_WIDTH));
}

#[test]
fn slice_badge_only_when_slice_present() {
    let mut n = seq_scan();
    let rows = renderer().render_node(&n, 0);
    assert_eq!(rows[0].description().unwrap().slice, None);
    assert!(!render_html(&ReportAssembler::new(&ReportConfig::default()).build(&Explain::from_plans(vec![SubPlan::new("Plan", n.clone())]))).contains("Slice"));

    n.slice = Some(0);
    let report = ReportAssembler::new(&ReportConfig::default()).build(&Explain::from_plans(vec![SubPlan::new("Plan", n.clone())]));
    assert_eq!(report.rows[0].description().unwrap().slice, Some(0));
    assert!(render_html(&report).contains("Slice 0</span>"));

    n.slice = Some(3);
    let report = ReportAssembler::new(&ReportConfig::default()).build(&Explain::from_plans(vec![SubPlan::new("Plan", n)]));
    assert!(render_html(&report).contains("Slice 3</span>"));
}

#[test]
fn first_extra_line_is_dropped_and_warnings_listed() {
    let mut n = seq_scan();
    n.extra_info = vec![
        "->  Seq Scan on foo  (cost=0.00..10.00 rows=100 width=4)".into(),
        "      Filter: (a = 1)  ".into(),
    ];
    n.warnings.push(Warning::new("Nested Loop", "Check join condition"));
    let rows = renderer().render_node(&n, 0);
    let d = rows[0].description().unwrap();
    assert_eq!(d.lines, vec!["Filter: (a = 1)"]);
    assert_eq!(d.warnings.len(), 1);
}

#[test]
fn report_schema_follows_first_plan_root() {
    let estimated_root = sample_tree();
    let analyzed_root = analyzed(seq_scan(), Some(1.0));

    let asm = ReportAssembler::new(&ReportConfig::default());
    let report = asm.build(&Explain::from_plans(vec![
        SubPlan::new("Plan 1", estimated_root.clone()),
        SubPlan::new("Plan 2", analyzed_root.clone()),
    ]));
    assert_eq!(report.schema, ColumnSchema::Estimated);
    assert!(report.all_rows().all(|r| r.width() == 8));

    let report = asm.build(&Explain::from_plans(vec![
        SubPlan::new("Plan 1", analyzed_root),
        SubPlan::new("Plan 2", estimated_root),
    ]));
    assert_eq!(report.schema, ColumnSchema::Analyzed);
    assert!(report.all_rows().all(|r| r.width() == 18));
    // the un-analyzed tree is padded with placeholders
    assert!(report.rows[1].cells[8..].iter().all(|c| *c == Cell::Placeholder));
}

#[test]
fn two_top_level_plans_render_in_order() {
    let asm = ReportAssembler::new(&ReportConfig::default());
    let report = asm.build(&Explain::from_plans(vec![
        SubPlan::new("Plan 1", sample_tree()),
        SubPlan::new("Plan 2", seq_scan()),
    ]));
    assert_eq!(report.header.len(), 2);
    assert_eq!(report.rows.len(), 7 + 1);
    assert_eq!(report.rows[0].description().unwrap().indent_px, 40);
    assert_eq!(report.rows[7].description().unwrap().summary, "-> Seq Scan on foo (cost=0.00..10.00 rows=100 width=4)");
    assert_eq!(report.rows[7].description().unwrap().indent_px, 40);
}

#[test]
fn header_rows_match_column_order() {
    let asm = ReportAssembler::new(&ReportConfig::default());
    let report = asm.build(&Explain::from_plans(vec![SubPlan::new("Plan", analyzed(seq_scan(), None))]));
    let names: Vec<&str> = report.header[1]
        .cells
        .iter()
        .map(|c| match c {
            Cell::Heading { text, .. } => text.as_str(),
            _ => "",
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "Query Plan:", "Name", "Type", "Startup", "Node", "Prct", "Total", "Rows",
            "Actual", "Avg", "Max", "Seg", "Workers", "First", "Node", "Prct", "End", "Offset",
        ]
    );
    assert_eq!(report.header[0].width(), 18);
    assert_eq!(report.header[0].cells.len(), 6);
}

#[test]
fn sections_in_fixed_order_and_empty_ones_omitted() {
    let asm = ReportAssembler::new(&ReportConfig::default());
    let mut explain = Explain::from_plans(vec![SubPlan::new("Plan", seq_scan())]);
    assert!(asm.build(&explain).sections.is_empty());

    explain.runtime = 12.4;
    explain.optimizer_status = "legacy query optimizer".into();
    explain.settings = vec![
        Setting { name: "optimizer".into(), value: "off".into() },
        Setting { name: "enable_nestloop".into(), value: "on".into() },
    ];
    explain.memory_used = 128000;
    explain.slice_stats = vec!["(slice0) Executor memory: 318K bytes.".into()];
    explain.warnings = vec![Warning::new("Legacy optimizer", "Enable ORCA")];
    let report = asm.build(&explain);
    let titles: Vec<&str> = report.sections.iter().map(Section::title).collect();
    assert_eq!(
        titles,
        vec!["Warnings:", "Slice statistics:", "Statement statistics:", "Settings:", "Optimizer status:", "Total runtime:"]
    );
    assert_eq!(report.sections[2], Section::StatementStatistics { memory_used: 128000, memory_wanted: None });

    let html = render_html(&report);
    let settings_at = html.find("\toptimizer = off\n").unwrap();
    assert!(settings_at < html.find("\tenable_nestloop = on\n").unwrap());
    assert!(html.contains("\t12 ms\n"));
    assert!(!html.contains("Memory wanted"));
}

#[test]
fn assembly_is_deterministic() {
    let asm = ReportAssembler::new(&ReportConfig::default());
    let mut explain = Explain::from_plans(vec![SubPlan::new("Plan", sample_tree())]);
    explain.runtime = 3.0;
    let a = render_html(&asm.build(&explain));
    let b = render_html(&asm.build(&explain));
    assert_eq!(a, b);
    assert_eq!(render_json(&asm.build(&explain)), render_json(&asm.build(&explain)));
}

#[test]
fn html_escapes_plan_text() {
    let mut n = seq_scan();
    n.operator = "Seq Scan on \"<script>\"".into();
    n.extra_info.push("Filter: (a < 'x&y')".into());
    let report = ReportAssembler::new(&ReportConfig::default()).build(&Explain::from_plans(vec![SubPlan::new("Plan", n)]));
    let html = render_html(&report);
    assert!(!html.contains("<script>"));
    assert!(html.contains("&quot;&lt;script&gt;&quot;"));
    assert!(html.contains("Filter: (a &lt; &#39;x&amp;y&#39;)"));
}

#[test]
fn html_sub_plan_row_uses_colspan() {
    let report = ReportAssembler::new(&ReportConfig::default()).build(&Explain::from_plans(vec![SubPlan::new("Plan", sample_tree())]));
    let html = render_html(&report);
    assert!(html.contains("<td style=\"padding-left:80px;\"><strong>SubPlan 1</strong></td><td colspan=\"7\"></td>"));
    assert!(html.contains("<th colspan=\"4\" class=\"text-center\">Cost</th>"));
    assert_eq!(html.matches("<tr>").count(), 2 + 7);
}

#[test]
fn json_report_carries_schema_and_rows() {
    let report = ReportAssembler::new(&ReportConfig::default()).build(&Explain::from_plans(vec![SubPlan::new("Plan", sample_tree())]));
    let v = render_json(&report);
    assert_eq!(v["schema"], "estimated");
    assert_eq!(v["width"], 8);
    assert_eq!(v["rows"].as_array().unwrap().len(), 7);
    assert_eq!(v["rows"][4]["kind"], "sub_plan");
    assert_eq!(v["rows"][0]["cells"][0]["kind"], "description");
}
