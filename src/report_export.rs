//! CSV report and chart output for a filtered taxon table.

use crate::{
    error::Result,
    length_chart::LengthChart,
    taxon_report::{ReportTable, TaxonQuery},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub const PLOT_ROW_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub record_count: usize,
    pub plotted_count: usize,
    pub csv_path: String,
    pub plot_path: String,
    pub title: String,
}

pub fn chart_title(query: &TaxonQuery, total: usize) -> String {
    if total > PLOT_ROW_LIMIT {
        format!(
            "Top {PLOT_ROW_LIMIT} of {total} sequences for taxid {}",
            query.taxid()
        )
    } else {
        format!("{total} sequences for taxid {}", query.taxid())
    }
}

pub fn write_csv_report(table: &ReportTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in table.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Sorts the table longest-first and writes `<stem>_report.csv` plus
/// `<stem>_plot.svg` into `out_dir`. Returns `None` for an empty table,
/// in which case nothing is written.
pub fn export_report(
    mut table: ReportTable,
    query: &TaxonQuery,
    out_dir: &Path,
) -> Result<Option<ExportReport>> {
    if table.is_empty() {
        return Ok(None);
    }
    table.sort_by_length_desc();

    fs::create_dir_all(out_dir)
        .map_err(|e| format!("Could not create output directory '{}': {e}", out_dir.display()))?;
    let stem = query.base_file_name();
    let csv_path: PathBuf = out_dir.join(format!("{stem}_report.csv"));
    let plot_path: PathBuf = out_dir.join(format!("{stem}_plot.svg"));

    write_csv_report(&table, &csv_path)?;
    info!(path = %csv_path.display(), rows = table.len(), "wrote CSV report");

    let plotted = table.top(PLOT_ROW_LIMIT);
    let title = chart_title(query, table.len());
    let svg = LengthChart::new(&title, plotted).to_svg();
    fs::write(&plot_path, svg)
        .map_err(|e| format!("Could not write chart '{}': {e}", plot_path.display()))?;
    info!(path = %plot_path.display(), points = plotted.len(), "wrote length chart");

    Ok(Some(ExportReport {
        record_count: table.len(),
        plotted_count: plotted.len(),
        csv_path: csv_path.display().to_string(),
        plot_path: plot_path.display().to_string(),
        title,
    }))
}
