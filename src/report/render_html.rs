use std::fmt::Write as _;

use super::rows::{Align, Cell, Description, Report, Row, RowKind, Section};

pub fn render_html(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(r#"<table class="table table-condensed table-striped table-bordered">"#);
    for row in report.all_rows() {
        push_row(&mut out, row);
    }
    out.push_str("</table>");
    for section in &report.sections {
        push_section(&mut out, section);
    }
    out
}

fn push_row(out: &mut String, row: &Row) {
    out.push_str("<tr>");
    for cell in &row.cells {
        push_cell(out, cell, row.kind);
    }
    out.push_str("</tr>\n");
}

fn push_cell(out: &mut String, cell: &Cell, kind: RowKind) {
    match cell {
        Cell::Heading { text, span, align } => {
            out.push_str("<th");
            if *span > 1 {
                let _ = write!(out, " colspan=\"{}\"", span);
            }
            match align {
                Align::Left => {}
                Align::Center => out.push_str(" class=\"text-center\""),
                Align::Right => out.push_str(" class=\"text-right\""),
            }
            let _ = write!(out, ">{}</th>", escape_html(text));
        }
        Cell::Description(d) => push_description(out, d),
        Cell::Label { indent_px, text } => {
            let _ = write!(out, "<td style=\"padding-left:{}px;\"><strong>{}</strong></td>", indent_px, escape_html(text));
        }
        Cell::Blank { span } => {
            let _ = write!(out, "<td colspan=\"{}\"></td>", span);
        }
        value => {
            let tag = if kind == RowKind::Header { "th" } else { "td" };
            let _ = write!(out, "<{tag} class=\"text-right\">{}</{tag}>", format_value(value));
        }
    }
}

fn push_description(out: &mut String, d: &Description) {
    let _ = write!(out, "<td style=\"padding-left:{}px\">", d.indent_px);
    if let Some(slice) = d.slice {
        let _ = write!(out, "<span class=\"badge bg-success\">Slice {}</span><br>", slice);
    }
    let _ = writeln!(out, "<strong>{}</strong>", escape_html(&d.summary));
    for line in &d.lines {
        let _ = writeln!(out, "   {}", escape_html(line));
    }
    for w in &d.warnings {
        let _ = write!(
            out,
            "   <span class=\"badge bg-danger\">WARNING: {} | {}</span><br>",
            escape_html(&w.cause),
            escape_html(&w.resolution)
        );
    }
    out.push_str("</td>");
}

fn push_section(out: &mut String, section: &Section) {
    let _ = writeln!(out, "<strong>{}</strong>", section.title());
    match section {
        Section::Warnings(warnings) => {
            for w in warnings {
                let _ = write!(
                    out,
                    "\t<span class=\"badge bg-danger\">{} | {}</span><br>",
                    escape_html(&w.cause),
                    escape_html(&w.resolution)
                );
            }
        }
        Section::SliceStatistics(stats) => {
            for stat in stats {
                let _ = writeln!(out, "\t{}", escape_html(stat));
            }
        }
        Section::StatementStatistics { memory_used, memory_wanted } => {
            let _ = writeln!(out, "\tMemory used: {}", memory_used);
            if let Some(wanted) = memory_wanted {
                let _ = writeln!(out, "\tMemory wanted: {}", wanted);
            }
        }
        Section::Settings(settings) => {
            for s in settings {
                let _ = writeln!(out, "\t{} = {}", escape_html(&s.name), escape_html(&s.value));
            }
        }
        Section::OptimizerStatus(status) => {
            let _ = writeln!(out, "\t{}", escape_html(status));
        }
        Section::TotalRuntime(ms) => {
            let _ = writeln!(out, "\t{} ms", whole(*ms));
        }
    }
}

/// Escaped display form of a value cell.
pub fn format_value(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => escape_html(s),
        Cell::Number(v) => whole(*v),
        Cell::Count(v) => v.to_string(),
        Cell::Percent(v) => format!("{}%", whole(*v)),
        Cell::Placeholder => "-".to_string(),
        _ => String::new(),
    }
}

fn whole(v: f64) -> String {
    let s = format!("{:.0}", v);
    // -0.4 and friends print as "-0"
    if s == "-0" { "0".to_string() } else { s }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
