// Single-page layout: three tabs, the data table, dropdowns and chart containers

use crate::controller::{dropdowns, ChartId, ControlId, Dropdown, SelectionState};
use crate::table::{escape_html, Grid};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = r#"
body { font-family: system-ui; }
.page { max-width: 1000px; margin: 0 auto; }
.tabs { display: flex; border-bottom: 1px solid #d6d6d6; }
.tab { padding: 12px 24px; cursor: pointer; border: 1px solid transparent; }
.tab.active { border-color: #d6d6d6 #d6d6d6 white; margin-bottom: -1px; background: white; }
.tab-content { display: none; font-family: Arial; border: 1px solid #d6d6d6; border-top: none; padding: 44px; }
.tab-content.active { display: block; }
.h1FirstTab { text-align: center; }
table.table_dataset { border-collapse: collapse; width: 100%; }
.table_dataset th, .table_dataset td { border: 1px solid #d6d6d6; padding: 4px 8px; }
.controls td { vertical-align: top; padding-right: 16px; }
select { width: 100%; padding: 4px; }
"#;

// Creates a session, draws the initial figures, then posts every dropdown change.
// Failed updates leave the chart as it was.
const SCRIPT: &str = r#"
(function () {
  var sessionId = null;
  document.querySelectorAll('.tab').forEach(function (tab) {
    tab.addEventListener('click', function () {
      document.querySelectorAll('.tab, .tab-content').forEach(function (el) { el.classList.remove('active'); });
      tab.classList.add('active');
      var content = document.getElementById(tab.dataset.target);
      content.classList.add('active');
      content.querySelectorAll('.js-plotly-plot').forEach(function (plot) { Plotly.Plots.resize(plot); });
    });
  });

  function draw(updates) {
    updates.forEach(function (u) { Plotly.react(u.chart, u.figure.data, u.figure.layout); });
  }

  fetch('/api/sessions', { method: 'POST' })
    .then(function (r) { return r.json(); })
    .then(function (body) { sessionId = body.session_id; draw(body.figures); });

  document.querySelectorAll('select[data-control]').forEach(function (select) {
    select.addEventListener('change', function () {
      if (!sessionId) { return; }
      fetch('/api/sessions/' + sessionId + '/controls/' + select.id, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ value: select.value })
      })
        .then(function (r) { return r.ok ? r.json() : Promise.reject(r.status); })
        .then(function (body) { draw(body.updates); })
        .catch(function (err) { console.warn('chart update failed', err); });
    });
  });
})();
"#;

pub fn render_page(title: &str, table: &Grid) -> String {
    let controls = dropdowns(&SelectionState::default());
    let (scatter_controls, bar_controls): (Vec<&Dropdown>, Vec<&Dropdown>) =
        controls.iter().partition(|d| d.id == ControlId::HueScatter);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str(&format!("<script src=\"{}\"></script>\n", PLOTLY_JS));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n<div class=\"page\">\n", STYLE));

    html.push_str("<div class=\"tabs\">\n");
    html.push_str("<div class=\"tab active\" data-target=\"tab-1\">Tips Data Set</div>\n");
    html.push_str("<div class=\"tab\" data-target=\"tab-2\">Scatter Plot</div>\n");
    html.push_str("<div class=\"tab\" data-target=\"tab-3\">Bar Plot</div>\n");
    html.push_str("</div>\n");

    html.push_str("<div id=\"tab-1\" class=\"tab-content active\">\n");
    html.push_str("<h1 class=\"h1FirstTab\">Tips Data Set</h1>\n");
    html.push_str(&table.to_html());
    html.push_str("\n</div>\n");

    html.push_str("<div id=\"tab-2\" class=\"tab-content\">\n");
    html.push_str("<h1 class=\"h1FirstTab\">Scatter Plot Tips Data Set</h1>\n");
    html.push_str("<table class=\"controls\" style=\"width: 300px\"><tr>");
    html.extend(scatter_controls.into_iter().map(render_dropdown));
    html.push_str("</tr></table>\n");
    html.push_str(&format!("<div id=\"{}\"></div>\n</div>\n", ChartId::Scatter.as_str()));

    html.push_str("<div id=\"tab-3\" class=\"tab-content\">\n");
    html.push_str("<h1 class=\"h1FirstTab\">Bar Plot Tips Data Set</h1>\n");
    html.push_str("<table class=\"controls\" style=\"width: 900px\"><tr>");
    html.extend(bar_controls.into_iter().map(render_dropdown));
    html.push_str("</tr></table>\n");
    html.push_str(&format!("<div id=\"{}\"></div>\n</div>\n", ChartId::Bar.as_str()));

    html.push_str("</div>\n");
    html.push_str(&format!("<script>{}</script>\n</body>\n</html>\n", SCRIPT));
    html
}

fn render_dropdown(dropdown: &Dropdown) -> String {
    let mut html = format!(
        "<td><p>{}</p><select id=\"{}\" data-control>",
        escape_html(dropdown.label),
        dropdown.id.as_str()
    );
    for option in &dropdown.options {
        let selected = if option.value == dropdown.value { " selected" } else { "" };
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            option.value.name(),
            selected,
            escape_html(option.label)
        ));
    }
    html.push_str("</select></td>");
    html
}
