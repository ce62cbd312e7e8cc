//! Tabular sheet sink: renders sheet layouts into one XLSX workbook.
//!
//! All styling lives here: category fills from the configured color
//! table, bold centered headers, a uniform thin border on every populated
//! cell, and content-driven column widths clamped into [10, 30].

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use tracing::info;

use crate::config::ColorTable;
use crate::report::{CellKind, SheetLayout, StateCategory};

const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 30;

/// Write the synthesized sheets to `path` as one workbook.
pub fn write_report(sheets: &[SheetLayout], colors: &ColorTable, path: &Path) -> Result<()> {
    let styles = Styles::from_table(colors)?;
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        let columns = sheet.column_count();
        for (r, row) in sheet.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (row_idx, col_idx) = (r as u32, c as u16);
                match &cell.kind {
                    CellKind::Title if columns > 1 => {
                        worksheet.merge_range(
                            row_idx,
                            0,
                            row_idx,
                            (columns - 1) as u16,
                            &cell.text,
                            &styles.title,
                        )?;
                    }
                    CellKind::Title => {
                        worksheet.write_string_with_format(
                            row_idx,
                            col_idx,
                            &cell.text,
                            &styles.title,
                        )?;
                    }
                    CellKind::Header => {
                        worksheet.write_string_with_format(
                            row_idx,
                            col_idx,
                            &cell.text,
                            &styles.header,
                        )?;
                    }
                    CellKind::Label => {
                        worksheet.write_string_with_format(
                            row_idx,
                            col_idx,
                            &cell.text,
                            &styles.label,
                        )?;
                    }
                    CellKind::Text => {
                        worksheet.write_string_with_format(
                            row_idx,
                            col_idx,
                            &cell.text,
                            &styles.text,
                        )?;
                    }
                    CellKind::State(category) => {
                        worksheet.write_string_with_format(
                            row_idx,
                            col_idx,
                            &cell.text,
                            styles.state(*category),
                        )?;
                    }
                }
            }
        }

        for (col, width) in column_widths(sheet).into_iter().enumerate() {
            worksheet.set_column_width(col as u16, width as f64)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("cannot save workbook to '{}'", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

/// Write a workbook containing only a default blank sheet; used when the
/// parse produced no hosts.
pub fn write_empty(path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    workbook.add_worksheet();
    workbook
        .save(path)
        .with_context(|| format!("cannot save workbook to '{}'", path.display()))?;
    Ok(())
}

/// Width of each column: longest cell text plus padding, clamped.
pub fn column_widths(sheet: &SheetLayout) -> Vec<usize> {
    let mut widths = vec![0usize; sheet.column_count()];
    for row in &sheet.rows {
        for (c, cell) in row.iter().enumerate() {
            widths[c] = widths[c].max(cell.text.chars().count());
        }
    }
    widths
        .into_iter()
        .map(|longest| (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
        .collect()
}

struct Styles {
    title: Format,
    header: Format,
    label: Format,
    text: Format,
    open: Format,
    closed: Format,
    filtered: Format,
    undefined: Format,
    fallback: Format,
}

impl Styles {
    fn from_table(colors: &ColorTable) -> Result<Self> {
        let bordered = Format::new().set_border(FormatBorder::Thin);
        let state_format = |category| -> Result<Format> {
            Ok(bordered
                .clone()
                .set_background_color(parse_color(colors.hex_for(category))?))
        };

        Ok(Self {
            title: bordered
                .clone()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            header: bordered.clone().set_bold().set_align(FormatAlign::Center),
            label: bordered.clone().set_bold(),
            text: bordered.clone(),
            open: state_format(StateCategory::Open)?,
            closed: state_format(StateCategory::Closed)?,
            filtered: state_format(StateCategory::Filtered)?,
            undefined: state_format(StateCategory::Undefined)?,
            fallback: state_format(StateCategory::Default)?,
        })
    }

    fn state(&self, category: StateCategory) -> &Format {
        match category {
            StateCategory::Open => &self.open,
            StateCategory::Closed => &self.closed,
            StateCategory::Filtered => &self.filtered,
            StateCategory::Undefined => &self.undefined,
            StateCategory::Default => &self.fallback,
        }
    }
}

fn parse_color(hex: &str) -> Result<Color> {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16)
        .with_context(|| format!("invalid RRGGBB color '{hex}'"))?;
    Ok(Color::RGB(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{canonical_port_keys, Host, PortKey, ScanInfo};
    use crate::report::synthesize;

    fn sample_sheets() -> Vec<SheetLayout> {
        let mut host = Host::new("10.0.0.1", Some("gateway".to_string()));
        host.ports
            .insert(PortKey::new("22", "tcp", "ssh"), "open".to_string());
        host.ports
            .insert(PortKey::new("80", "tcp", "http"), "closed".to_string());
        let hosts = vec![host];
        let keys = canonical_port_keys(&hosts);
        synthesize(&hosts, &ScanInfo::default(), &keys)
    }

    #[test]
    fn widths_are_clamped_to_bounds() {
        let sheets = sample_sheets();
        for width in column_widths(&sheets[0]) {
            assert!((MIN_COLUMN_WIDTH..=MAX_COLUMN_WIDTH).contains(&width));
        }
    }

    #[test]
    fn long_cell_text_saturates_at_max_width() {
        let sheets = sample_sheets();
        // "Scan started:" rows carry long values in real reports; fake one.
        let mut sheet = sheets[0].clone();
        sheet.rows[1][1].text = "x".repeat(100);
        assert_eq!(column_widths(&sheet)[1], MAX_COLUMN_WIDTH);
    }

    #[test]
    fn report_workbook_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan_report.xlsx");
        let config = Config::default();

        write_report(&sample_sheets(), &config.colors, &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn empty_workbook_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        write_empty(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn malformed_color_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.xlsx");
        let mut config = Config::default();
        config.colors.open = "not-a-color".to_string();

        assert!(write_report(&sample_sheets(), &config.colors, &path).is_err());
    }
}
