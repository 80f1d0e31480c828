//! # sweeper-viz
//!
//! Chart generation for data-sweeper.
//!
//! This crate builds chart specifications that can be rendered by:
//! - HTML/Chart.js output
//! - A web frontend (via JSON)

use serde::{Deserialize, Serialize};
use sweeper_sheet::Table;

/// Number of numeric columns plotted by [`ChartSpec::numeric_bar`].
pub const MAX_SERIES: usize = 2;

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js";

const SERIES_COLORS: [&str; MAX_SERIES] = ["#007BFF", "#28a745"];

/// Chart specification for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartKind,
    pub title: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

/// Chart type for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
}

/// Chart data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// A dataset in a chart. Missing cells are `None` and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// Chart rendering options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    pub show_legend: bool,
}

/// Escape HTML special characters to prevent XSS.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

impl ChartSpec {
    /// Create a new chart specification.
    #[must_use]
    pub fn new(chart_type: ChartKind, title: impl Into<String>) -> Self {
        Self {
            chart_type,
            title: title.into(),
            data: ChartData::default(),
            options: ChartOptions::default(),
        }
    }

    /// Bar chart of the first two numeric columns of a table.
    ///
    /// Columns are taken in table order; with fewer numeric columns the chart
    /// simply carries fewer datasets. Each row is one bar group labelled by
    /// its position.
    #[must_use]
    pub fn numeric_bar(table: &Table, title: impl Into<String>) -> Self {
        let mut chart = Self::new(ChartKind::Bar, title);
        chart.options.show_legend = true;
        chart.options.x_axis_label = Some("row".to_string());
        chart.data.labels = (0..table.row_count()).map(|idx| idx.to_string()).collect();

        for (series, col) in table
            .numeric_columns()
            .into_iter()
            .take(MAX_SERIES)
            .enumerate()
        {
            let data = table
                .rows()
                .map(|row| row[col].as_f64())
                .collect();
            chart.data.datasets.push(Dataset {
                label: table.columns()[col].clone(),
                data,
                background_color: Some(SERIES_COLORS[series].to_string()),
            });
        }

        chart
    }

    /// Whether the chart has nothing to plot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.datasets.is_empty()
    }

    /// Standalone page drawing the chart with Chart.js.
    ///
    /// The title is HTML-escaped and the embedded spec cannot close the
    /// script element.
    #[must_use]
    pub fn to_html(&self) -> String {
        let title = escape_html(&self.title);
        let spec = serde_json::to_string(self)
            .unwrap_or_else(|_| "null".to_string())
            .replace("</", "<\\/");
        let kind = match self.chart_type {
            ChartKind::Bar => "bar",
        };

        let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{title}</title>\n"));
        html.push_str(&format!("<script src=\"{CHART_JS_URL}\"></script>\n"));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h2>{title}</h2>\n"));
        if self.is_empty() {
            html.push_str("<p>No numeric columns to plot.</p>\n");
        }
        html.push_str("<canvas id=\"sweeper-chart\"></canvas>\n<script>\n");
        html.push_str(&format!("const spec = {spec};\n"));
        html.push_str(&format!(
            r#"new Chart(document.getElementById("sweeper-chart"), {{
  type: "{kind}",
  data: {{
    labels: spec.data.labels,
    datasets: spec.data.datasets.map((set) => ({{
      label: set.label,
      data: set.data,
      backgroundColor: set.background_color,
    }})),
  }},
  options: {{
    plugins: {{ legend: {{ display: spec.options.show_legend }} }},
    scales: {{
      x: {{ title: {{ display: !!spec.options.x_axis_label, text: spec.options.x_axis_label }} }},
    }},
  }},
}});
"#
        ));
        html.push_str("</script>\n</body>\n</html>\n");
        html
    }
}
