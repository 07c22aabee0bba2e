use crate::{detect_delimiter, read_source};
use fnb_core::error::FnbError;
use fnb_core::visitor::VisitorRecord;
use fnb_utils::columns::find_column;
use fnb_utils::dates::parse_date_flexible;
use fnb_utils::numbers::parse_decimal;
use std::path::Path;

const TABLE: &str = "budget sheet";
const DATE_COLUMNS: [&str; 2] = ["datum", "date"];
const BUDGET_COLUMNS: [&str; 4] = [
    "begroot aantal bezoekers",
    "begroot",
    "budgeted visitors",
    "budget",
];
const ACTUAL_COLUMNS: [&str; 4] = [
    "totaal aantal bezoekers",
    "werkelijk aantal bezoekers",
    "actual visitors",
    "visitors",
];

fn to_count(value: f64) -> u32 {
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Parse the budget sheet export into one record per row.
///
/// Rows for several sub-locations on the same date are returned as-is;
/// [`fnb_core::visitor::VisitorTable::from_records`] sums them. Rows with an
/// unparseable date or budget are skipped.
pub fn parse_visitor_csv(csv_data: &str) -> anyhow::Result<Vec<VisitorRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(csv_data))
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers = rdr.headers().map_err(FnbError::from)?.clone();
    let date_idx = find_column(headers.iter(), &DATE_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, DATE_COLUMNS[0]))?;
    let budget_idx = find_column(headers.iter(), &BUDGET_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, BUDGET_COLUMNS[0]))?;
    let actual_idx = find_column(headers.iter(), &ACTUAL_COLUMNS);

    let mut records = Vec::new();
    let mut skipped = 0u32;
    for result in rdr.records() {
        let r = result.map_err(FnbError::from)?;
        let date_str = r.get(date_idx).unwrap_or("").trim();
        if date_str.is_empty() {
            skipped += 1;
            continue;
        }
        let date = match parse_date_flexible(date_str) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("{}: skipping row with bad date: {}", TABLE, e);
                skipped += 1;
                continue;
            }
        };
        let Some(budgeted) = r.get(budget_idx).and_then(parse_decimal) else {
            log::warn!("{}: skipping {} without a budgeted visitor count", TABLE, date);
            skipped += 1;
            continue;
        };
        let actual = actual_idx
            .and_then(|idx| r.get(idx))
            .and_then(parse_decimal)
            .map(to_count);
        records.push(VisitorRecord {
            date,
            budgeted: to_count(budgeted),
            actual,
        });
    }
    log::info!("loader: Loaded {} visitor rows, skipped {}", records.len(), skipped);
    Ok(records)
}

/// Read and parse the budget sheet export at `path`.
pub fn load_visitor_records(path: &Path) -> anyhow::Result<Vec<VisitorRecord>> {
    parse_visitor_csv(&read_source(path)?)
}
