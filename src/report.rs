use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::dashboard::{DashboardView, PanelData};
use crate::transform::Column;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Render `view` in the chosen format.
pub fn write_report<W: Write>(view: &DashboardView, format: OutputFormat, out: W) -> Result<()> {
    match format {
        OutputFormat::Table => write_text_report(view, out),
        OutputFormat::Csv => write_csv(view, out),
        OutputFormat::Json => write_json(view, out),
    }
}

fn format_cell(column: Column, value: Option<f64>) -> String {
    match (column, value) {
        (_, None) => String::new(),
        (Column::Volume, Some(v)) => format!("{:.0}", v),
        (Column::CumulativeReturn, Some(v)) => format!("{:.4}", v),
        (_, Some(v)) => format!("{:.2}", v),
    }
}

/// Generate a text report
pub fn write_text_report<W: Write>(view: &DashboardView, mut out: W) -> Result<()> {
    writeln!(out, "Available data: {}", view.available)?;
    writeln!(out, "Selected:       {}", view.selected)?;
    writeln!(out)?;

    writeln!(out, "Panels:")?;
    for panel in view.panels() {
        writeln!(out, "  - {}", panel.title())?;
    }
    writeln!(out)?;

    let columns = view.derived.columns();
    let mut header = vec!["Date".to_string()];
    header.extend(columns.iter().map(|c| c.header().to_string()));

    let body: Vec<Vec<String>> = view
        .derived
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![row.price.date.to_string()];
            cells.extend(columns.iter().map(|&c| format_cell(c, row.value(c))));
            cells
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|cells| cells[i].len())
                .chain(std::iter::once(header[i].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                if i == 0 {
                    format!("{:<w$}", cell)
                } else {
                    format!("{:>w$}", cell)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(out, "{}", line(&header))?;
    for cells in &body {
        writeln!(out, "{}", line(cells))?;
    }

    Ok(())
}

/// Write the derived table as CSV; undefined values are left blank.
pub fn write_csv<W: Write>(view: &DashboardView, out: W) -> Result<()> {
    let columns = view.derived.columns();
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec!["Date"];
    header.extend(columns.iter().map(|c| c.header()));
    wtr.write_record(&header)?;

    for row in &view.derived.rows {
        let mut record = vec![row.price.date.to_string()];
        record.extend(
            columns
                .iter()
                .map(|&c| row.value(c).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    view: &'a DashboardView,
    panels: Vec<PanelData>,
}

/// Generate a JSON report
pub fn write_json<W: Write>(view: &DashboardView, out: W) -> Result<()> {
    let report = JsonReport {
        view,
        panels: view.panels().into_iter().map(|p| view.panel_data(p)).collect(),
    };
    serde_json::to_writer_pretty(out, &report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::build_view;
    use crate::series::{PriceRow, PriceSeries};
    use chrono::NaiveDate;

    fn view() -> DashboardView {
        let closes = [100.0, 110.0, 99.0];
        let series = PriceSeries::from_rows(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    PriceRow::close_only(NaiveDate::from_ymd_opt(2024, 1, 2 + i as u32).unwrap(), c)
                })
                .collect(),
        )
        .unwrap();
        build_view(&series, None, None).unwrap()
    }

    #[test]
    fn test_text_report() {
        let mut buf = Vec::new();
        write_text_report(&view(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Available data: 2024-01-02 → 2024-01-04"));
        assert!(text.contains("Daily % Change in Price"));
        assert!(!text.contains("Candlestick"));
        assert!(text.contains("Daily Change %"));
        assert!(text.contains("-10.00"));
        assert!(text.contains("0.9900"));
    }

    #[test]
    fn test_csv_blank_for_undefined() {
        let mut buf = Vec::new();
        write_csv(&view(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Date,Close,MA20,MA50,Daily Change %,Cumulative Return");
        assert_eq!(lines[1], "2024-01-02,100,,,,1");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_json_includes_panels() {
        let mut buf = Vec::new();
        write_json(&view(), &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["available"]["start"], "2024-01-02");
        assert_eq!(value["derived"]["rows"].as_array().unwrap().len(), 3);
        assert!(value["derived"]["rows"][0]["pct_change"].is_null());
        assert_eq!(value["panels"][0]["panel"], "ClosingPrice");
    }
}
