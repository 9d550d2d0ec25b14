//! HTML page shells around the rendered report.

use crate::checks::CheckInfo;
use crate::report::render_html::escape_html;

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Plan Checker</title>
<link rel="stylesheet" href="https://maxcdn.bootstrapcdn.com/bootstrap/3.3.6/css/bootstrap.min.css">
<style>
td.nowrap { white-space: nowrap; }
td pre { white-space: pre-wrap; border: 0; background: none; padding: 0; margin: 0; }
.optimizer-legacy { background-color: #8a6d3b; }
.optimizer-orca { background-color: #31708f; }
</style>
</head>
<body>
<div class="container-fluid">
<h2><a href="/">Plan Checker</a></h2>
"#;

const FOOT: &str = "</div>\n</body>\n</html>\n";

const SAVE_SCRIPT: &str = r#"<script>
function savePlan() {
  var body = new URLSearchParams({action: "save", plantext: planTextBase64});
  fetch("/plan/", {method: "POST", body: body})
    .then(function (r) { return r.json(); })
    .then(function (res) {
      if (res.status == "success") {
        var link = document.getElementById("planRefLink");
        link.textContent = res.ref;
        link.href = "/plan/" + res.ref;
        document.getElementById("planRef").style.display = "";
        document.getElementById("planSave").style.display = "none";
      } else {
        alert(res.msg);
      }
    });
}
</script>
"#;

pub fn index_page(checks: &[CheckInfo]) -> String {
    let mut html = String::from(HEAD);
    html.push_str(
        r#"<form method="post" action="/plan/" enctype="multipart/form-data">
<input type="hidden" name="action" value="parse">
<div class="form-group">
<label for="plantext">Paste EXPLAIN or EXPLAIN ANALYZE output</label>
<textarea class="form-control" id="plantext" name="plantext" rows="16" style="font-family: monospace"></textarea>
</div>
<div class="form-group">
<label for="uploadfile">or upload a file</label>
<input type="file" id="uploadfile" name="uploadfile">
</div>
<button type="submit" class="btn btn-primary">Check plan</button>
</form>
<h3>Checks</h3>
"#,
    );
    html.push_str(&checklist_html(checks));
    html.push_str(FOOT);
    html
}

fn checklist_html(checks: &[CheckInfo]) -> String {
    let mut html = String::from("<table class=\"table table-bordered table-condensed table-striped\">\n");
    html.push_str("<tr><th class=\"text-left\">Description</th><th class=\"text-left\">Optimizer</th><th class=\"text-left\">Added</th></tr>\n");
    for c in checks {
        let scope: String = c
            .scope
            .iter()
            .map(|s| format!(" <span class=\"badge optimizer-{0}\">{0}</span> ", s))
            .collect();
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"nowrap\">{}</td><td class=\"nowrap\">{}</td></tr>\n",
            escape_html(c.description),
            scope,
            c.created_at
        ));
    }
    html.push_str("</table>\n");
    html
}

/// Report page. `plan_ref` is empty for a plan that has not been saved yet.
pub fn plan_page(report_html: &str, plan_text_base64: &str, plan_ref: &str) -> String {
    let saved = !plan_ref.is_empty();
    let mut html = String::from(HEAD);
    html.push_str(&format!(
        "<script>var planTextBase64 = \"{}\"; var planRef = \"{}\";</script>\n",
        plan_text_base64,
        escape_html(plan_ref)
    ));
    html.push_str(SAVE_SCRIPT);
    html.push_str(&format!(
        "<p id=\"planRef\"{}>Plan reference: <a id=\"planRefLink\" href=\"/plan/{ref_}\">{ref_}</a></p>\n",
        if saved { "" } else { " style=\"display:none\"" },
        ref_ = escape_html(plan_ref)
    ));
    if !saved {
        html.push_str("<p id=\"planSave\"><button class=\"btn btn-default\" onclick=\"savePlan()\">Save and share</button></p>\n");
    }
    html.push_str(report_html);
    html.push_str(FOOT);
    html
}

/// Plain error fragment used by the page flows.
pub fn error_fragment(headline: &str, detail: &str) -> String {
    format!(
        "<!DOCTYPE html><pre>{}\n--\n{}\n\n<a href=\"/\">Back</a></pre>",
        escape_html(headline),
        escape_html(detail)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::catalog;

    #[test]
    fn index_lists_checks() {
        let page = index_page(&catalog());
        assert!(page.contains("name=\"uploadfile\""));
        assert!(page.contains("Nested Loop joins"));
        assert!(page.contains("<span class=\"badge optimizer-orca\">orca</span>"));
    }

    #[test]
    fn unsaved_plan_offers_save() {
        let page = plan_page("<table></table>", "U2VxIFNjYW4=", "");
        assert!(page.contains("var planTextBase64 = \"U2VxIFNjYW4=\""));
        assert!(page.contains("id=\"planSave\""));
        let saved = plan_page("<table></table>", "U2VxIFNjYW4=", "abcd1234");
        assert!(!saved.contains("id=\"planSave\""));
        assert!(saved.contains("href=\"/plan/abcd1234\""));
    }

    #[test]
    fn error_fragment_escapes_detail() {
        let html = error_fragment("Oops... we had a problem parsing the plan:", "bad <line>");
        assert!(html.contains("bad &lt;line&gt;"));
        assert!(html.starts_with("<!DOCTYPE html><pre>Oops..."));
    }
}
