use std::io::{self, Write};

use finscope_core::{
    CompanyField, CompanyInfo, FieldState, NoticeLevel, PriceSeries, SourceError, StatementSet,
    StatementTable,
};

use crate::cli::{Cli, OutputFormat};
use crate::commands::CommandResult;
use crate::error::CliError;
use crate::report::Report;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 60;
const MISSING: &str = "-";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub rows: usize,
}

impl From<&Cli> for RenderOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            pretty: cli.pretty,
            rows: cli.rows,
        }
    }
}

pub fn render(
    result: &CommandResult,
    source: &'static str,
    options: &RenderOptions,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match options.format {
        OutputFormat::Json => {
            let report = Report::new(result, source);
            let payload = if options.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => write_table(&mut out, result, options.rows)?,
    }

    out.flush()?;
    Ok(())
}

fn write_table<W: Write>(out: &mut W, result: &CommandResult, rows: usize) -> io::Result<()> {
    let mut heading = result.symbol.to_string();
    if let Some(window) = result.window {
        heading.push_str(&format!(" · {window}"));
    }
    if let Some(granularity) = result.granularity {
        heading.push_str(&format!(" · {granularity}"));
    }
    writeln!(out, "{heading}")?;
    writeln!(out, "{}", "=".repeat(heading.chars().count()))?;

    if let Some(company) = &result.company {
        writeln!(out)?;
        write_company(out, company)?;
    }
    if let Some(price) = &result.price {
        writeln!(out)?;
        match price {
            Ok(series) => write_price(out, series, rows)?,
            Err(error) => write_failure(out, "Price history", error)?,
        }
    }
    if let Some(statements) = &result.statements {
        match statements {
            Ok(set) => write_statements(out, set)?,
            Err(error) => {
                writeln!(out)?;
                write_failure(out, "Financial statements", error)?;
            }
        }
    }

    if !result.notices.is_empty() {
        writeln!(out)?;
        for notice in &result.notices {
            let prefix = match notice.level() {
                NoticeLevel::Info => "note",
                NoticeLevel::Warning => "warning",
            };
            writeln!(out, "{prefix}: {}", notice.message())?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn write_failure<W: Write>(out: &mut W, title: &str, error: &SourceError) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "  unavailable: {} ({})", error.message(), error.code())
}

fn write_company<W: Write>(out: &mut W, info: &CompanyInfo) -> io::Result<()> {
    writeln!(out, "Company overview")?;
    let rows: Vec<[String; 2]> = info
        .iter()
        .map(|(field, state)| [field.label().to_owned(), format_field(field, state)])
        .collect();
    write_grid(out, &["Field", "Value"], &rows, &[false, false])
}

fn write_price<W: Write>(out: &mut W, series: &PriceSeries, rows: usize) -> io::Result<()> {
    writeln!(out, "Price history ({} rows)", series.len())?;
    if series.is_empty() {
        return Ok(());
    }

    let closes: Vec<f64> = series.closes().into_iter().map(|(_, close)| close).collect();
    writeln!(out, "  {}", sparkline(&closes, SPARK_WIDTH))?;
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        let change = series
            .change_pct()
            .map_or_else(|| String::from(MISSING), |pct| format!("{pct:+.2}%"));
        writeln!(
            out,
            "  {} {:.2} -> {} {:.2} ({change})",
            first.ts.date(),
            first.close,
            last.ts.date(),
            last.close
        )?;
    }
    writeln!(out)?;

    let skip = series.len().saturating_sub(rows);
    let table: Vec<[String; 7]> = series.bars()[skip..]
        .iter()
        .map(|bar| {
            [
                bar.ts.date().to_string(),
                format!("{:.2}", bar.open),
                format!("{:.2}", bar.high),
                format!("{:.2}", bar.low),
                format!("{:.2}", bar.close),
                bar.adj_close
                    .map_or_else(|| String::from(MISSING), |value| format!("{value:.2}")),
                bar.volume
                    .map_or_else(|| String::from(MISSING), group_thousands),
            ]
        })
        .collect();
    write_grid(
        out,
        &["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"],
        &table,
        &[false, true, true, true, true, true, true],
    )
}

fn write_statements<W: Write>(out: &mut W, set: &StatementSet) -> io::Result<()> {
    for table in set.tables() {
        writeln!(out)?;
        writeln!(out, "{} ({})", table.kind.title(), set.granularity)?;
        if table.is_empty() {
            writeln!(out, "  no data")?;
            continue;
        }
        write_statement_table(out, table)?;
    }
    Ok(())
}

/// Line items down the side, periods across, the way statements are read.
fn write_statement_table<W: Write>(out: &mut W, table: &StatementTable) -> io::Result<()> {
    let periods = table.periods();
    let mut headers = vec![String::from("Line item")];
    headers.extend(periods.iter().map(ToString::to_string));

    let rows: Vec<Vec<String>> = table
        .columns()
        .iter()
        .map(|line_item| {
            let mut row = vec![line_item.clone()];
            row.extend(
                table
                    .series(line_item)
                    .into_iter()
                    .map(|(_, value)| value.map_or_else(|| String::from(MISSING), compact_number)),
            );
            row
        })
        .collect();

    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let mut right_align = vec![true; headers.len()];
    right_align[0] = false;
    write_grid(out, &header_refs, &rows, &right_align)
}

fn write_grid<W, R>(out: &mut W, headers: &[&str], rows: &[R], right_align: &[bool]) -> io::Result<()>
where
    W: Write,
    R: AsRef<[String]>,
{
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.as_ref()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    writeln!(out, "  {}", pad_cells(headers.iter().copied(), &widths, right_align))?;
    let rule: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();
    writeln!(out, "  {}", rule.join("  "))?;
    for row in rows {
        let cells = row.as_ref().iter().map(String::as_str);
        writeln!(out, "  {}", pad_cells(cells, &widths, right_align))?;
    }
    Ok(())
}

fn pad_cells<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize],
    right_align: &[bool],
) -> String {
    let line = cells
        .zip(widths.iter().zip(right_align))
        .map(|(cell, (&width, &right))| {
            if right {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_owned()
}

fn format_field(field: CompanyField, state: &FieldState) -> String {
    let Some(value) = state.value() else {
        return state.to_string();
    };
    let Some(number) = value.as_number() else {
        return value.to_string();
    };

    match field {
        CompanyField::MarketCap => format!("${}", compact_number(number)),
        CompanyField::CurrentPrice | CompanyField::YearHigh | CompanyField::YearLow => {
            format!("${number:.2}")
        }
        CompanyField::DividendYield => format!("{:.2}%", number * 100.0),
        CompanyField::PeRatio => format!("{number:.2}"),
        CompanyField::CompanyName | CompanyField::Sector | CompanyField::Industry => {
            value.to_string()
        }
    }
}

/// `2_950_000_000_000.0` renders as `2.95T`.
fn compact_number(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let magnitude = value.abs();
    for (scale, suffix) in UNITS {
        if magnitude >= scale {
            return format!("{:.2}{suffix}", value / scale);
        }
    }
    format!("{value:.2}")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Close prices downsampled to at most `width` buckets.
fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let bucket = values.len().div_ceil(width);
    let points: Vec<f64> = values
        .chunks(bucket)
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect();

    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let top = SPARK_LEVELS.len() - 1;

    points
        .iter()
        .map(|point| {
            if span <= f64::EPSILON {
                return SPARK_LEVELS[top / 2];
            }
            let level = ((point - min) / span * top as f64).round() as usize;
            SPARK_LEVELS[level.min(top)]
        })
        .collect()
}
