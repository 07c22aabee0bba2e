use crate::{detect_delimiter, read_source};
use chrono::NaiveDate;
use fnb_core::date_range::DateRange;
use fnb_core::error::FnbError;
use fnb_core::sales::SalesRecord;
use fnb_utils::columns::find_column;
use fnb_utils::dates::{format_date, parse_date};
use fnb_utils::numbers::parse_decimal;
use std::path::{Path, PathBuf};

const TABLE: &str = "sales export";
const GROUP_COLUMNS: [&str; 3] = ["productgroep", "product group", "omzetgroep"];
const PRODUCT_COLUMNS: [&str; 4] = ["product", "productnaam", "product name", "artikel"];
const QUANTITY_COLUMNS: [&str; 3] = ["aantal", "quantity", "qty"];
const REVENUE_COLUMNS: [&str; 4] = ["netto omzet", "omzet", "net revenue", "revenue"];

/// Location of the export for one location and day:
/// `{sales_dir}/{location}/{YYYY-MM-DD}.csv`.
pub fn sales_file_path(sales_dir: &Path, location: &str, date: &NaiveDate) -> PathBuf {
    sales_dir.join(location).join(format!("{}.csv", format_date(date)))
}

/// Parse one point-of-sale export. The date and location come from the
/// file's place in the directory layout, not from its content.
///
/// Rows without a product group or product, or whose quantity does not
/// parse, are skipped; an unparseable revenue counts as zero.
pub fn parse_sales_csv(
    csv_data: &str,
    date: NaiveDate,
    location: &str,
) -> anyhow::Result<Vec<SalesRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(csv_data))
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers = rdr.headers().map_err(FnbError::from)?.clone();
    let group_idx = find_column(headers.iter(), &GROUP_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, GROUP_COLUMNS[0]))?;
    let product_idx = find_column(headers.iter(), &PRODUCT_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, PRODUCT_COLUMNS[0]))?;
    let quantity_idx = find_column(headers.iter(), &QUANTITY_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, QUANTITY_COLUMNS[0]))?;
    let revenue_idx = find_column(headers.iter(), &REVENUE_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, REVENUE_COLUMNS[0]))?;

    let mut lines = Vec::new();
    let mut skipped = 0u32;
    for result in rdr.records() {
        let r = result.map_err(FnbError::from)?;
        let product_group = r.get(group_idx).unwrap_or("").trim();
        let product = r.get(product_idx).unwrap_or("").trim();
        if product_group.is_empty() || product.is_empty() {
            skipped += 1;
            continue;
        }
        let Some(quantity) = r.get(quantity_idx).and_then(parse_decimal) else {
            skipped += 1;
            continue;
        };
        let net_revenue = r.get(revenue_idx).and_then(parse_decimal).unwrap_or(0.0);
        lines.push(SalesRecord {
            date,
            location: location.to_string(),
            product_group: product_group.to_string(),
            product: product.to_string(),
            quantity,
            net_revenue,
        });
    }
    if skipped > 0 {
        log::warn!("{} {} {}: skipped {} rows", TABLE, location, date, skipped);
    }
    Ok(lines)
}

/// Sales export files for `location` whose date falls in `range`, ordered
/// by date. A missing location directory yields nothing.
pub(crate) fn sales_files_in_range(
    sales_dir: &Path,
    location: &str,
    range: &DateRange,
) -> anyhow::Result<Vec<(NaiveDate, PathBuf)>> {
    let location_dir = sales_dir.join(location);
    if !location_dir.is_dir() {
        log::debug!("No sales directory for {} at {}", location, location_dir.display());
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&location_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let Some(date) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| parse_date(s).ok())
        else {
            continue;
        };
        if range.contains(&date) {
            files.push((date, path));
        }
    }
    files.sort();
    Ok(files)
}

fn read_sales_export(
    path: &Path,
    date: NaiveDate,
    location: &str,
) -> anyhow::Result<Vec<SalesRecord>> {
    parse_sales_csv(&read_source(path)?, date, location)
}

/// Load and aggregate the sales of `locations` over `range`.
///
/// Days without an export are not an error; they simply contribute no
/// records. An export that cannot be read or parsed is skipped with a
/// warning, unless it lacks a required column.
pub fn load_sales_records(
    sales_dir: &Path,
    range: DateRange,
    locations: &[String],
) -> anyhow::Result<Vec<SalesRecord>> {
    let mut lines = Vec::new();
    let mut skipped = 0usize;
    for location in locations {
        for (date, path) in sales_files_in_range(sales_dir, location, &range)? {
            match read_sales_export(&path, date, location) {
                Ok(parsed) => lines.extend(parsed),
                Err(e) if e.downcast_ref::<FnbError>().is_some_and(FnbError::is_fatal) => {
                    return Err(e.context(format!("Failed to load {}", path.display())));
                }
                Err(e) => {
                    log::warn!("Skipping sales export {}: {:#}", path.display(), e);
                    skipped += 1;
                }
            }
        }
    }
    let records = SalesRecord::aggregate(lines);
    if skipped > 0 {
        log::warn!("loader: Skipped {} unreadable sales exports", skipped);
    }
    log::info!(
        "loader: Loaded {} sales records ({} to {})",
        records.len(),
        range.0,
        range.1
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPORT: &str = "\
Productgroep;Product;Aantal;Netto omzet
Soepen;Tomatensoep;12;54,00
Soepen;Tomatensoep;3;13,50
Salades;Caesar salade;4;1.034,40
;Zonder groep;1;2,00
Soepen;Erwtensoep;onbekend;5,00
";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn write_export(dir: &Path, location: &str, date: NaiveDate, content: &str) {
        let path = sales_file_path(dir, location, &date);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn parse_semicolon_comma_decimal_export() {
        let lines = parse_sales_csv(EXPORT, day(1), "Entree").unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].location, "Entree");
        assert_eq!(lines[0].quantity, 12.0);
        assert!((lines[0].net_revenue - 54.0).abs() < 1e-9);
        assert!((lines[2].net_revenue - 1034.4).abs() < 1e-9);
    }

    #[test]
    fn parse_missing_quantity_column_is_schema_error() {
        let csv = "Productgroep;Product;Netto omzet\nSoepen;Tomatensoep;5,00\n";
        let err = parse_sales_csv(csv, day(1), "Entree").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FnbError>(),
            Some(FnbError::Schema { .. })
        ));
    }

    #[test]
    fn sales_file_layout() {
        let path = sales_file_path(Path::new("/data/kassa"), "Oranjerie", &day(19));
        assert_eq!(path, PathBuf::from("/data/kassa/Oranjerie/2025-05-19.csv"));
    }

    #[test]
    fn load_aggregates_and_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path(), "Entree", day(1), EXPORT);
        write_export(dir.path(), "Entree", day(3), EXPORT);
        write_export(
            dir.path(),
            "Oranjerie",
            day(1),
            "Productgroep;Product;Aantal;Netto omzet\nSoepen;Tomatensoep;2;9,00\n",
        );
        // outside the requested range
        write_export(dir.path(), "Entree", day(9), EXPORT);

        let locations = vec![
            "Entree".to_string(),
            "Oranjerie".to_string(),
            "Bloemenkas".to_string(),
        ];
        let records =
            load_sales_records(dir.path(), DateRange(day(1), day(5)), &locations).unwrap();

        assert!(records.iter().all(|r| r.date <= day(5)));
        assert!(records.iter().all(|r| r.location != "Bloemenkas"));
        let entree_soup = records
            .iter()
            .find(|r| r.date == day(1) && r.location == "Entree" && r.product == "Tomatensoep")
            .unwrap();
        assert_eq!(entree_soup.quantity, 15.0);
        assert_eq!(records.iter().filter(|r| r.date == day(2)).count(), 0);
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn load_from_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let records = load_sales_records(
            &dir.path().join("nope"),
            DateRange::single(day(1)),
            &["Entree".to_string()],
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn windows_1252_export_loads_next_to_utf8_export() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path(), "Entree", day(1), EXPORT);
        let path = sales_file_path(dir.path(), "Entree", &day(2));
        std::fs::write(
            &path,
            b"Productgroep;Product;Aantal;Netto omzet\nDesserts;Cr\xE8me br\xFBl\xE9e;7;38,50\n",
        )
        .unwrap();

        let locations = vec!["Entree".to_string()];
        let range = DateRange(day(1), day(2));
        let records = load_sales_records(dir.path(), range, &locations).unwrap();
        assert_eq!(records.iter().filter(|r| r.date == day(1)).count(), 2);
        let dessert = records.iter().find(|r| r.date == day(2)).unwrap();
        assert_eq!(dessert.product_group, "Desserts");
        assert_eq!(dessert.quantity, 7.0);
    }

    #[test]
    fn unreadable_export_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path(), "Entree", day(1), EXPORT);
        // a directory where the day-2 export should be
        std::fs::create_dir_all(sales_file_path(dir.path(), "Entree", &day(2))).unwrap();

        let locations = vec!["Entree".to_string()];
        let range = DateRange(day(1), day(2));
        let records = load_sales_records(dir.path(), range, &locations).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.date == day(1)));
    }

    #[test]
    fn export_missing_a_column_stops_the_load() {
        let dir = TempDir::new().unwrap();
        write_export(dir.path(), "Entree", day(1), EXPORT);
        write_export(
            dir.path(),
            "Entree",
            day(2),
            "Productgroep;Product;Netto omzet\nSoepen;Tomatensoep;5,00\n",
        );

        let locations = vec!["Entree".to_string()];
        let range = DateRange(day(1), day(2));
        let err = load_sales_records(dir.path(), range, &locations).unwrap_err();
        assert!(err.downcast_ref::<FnbError>().is_some_and(FnbError::is_fatal));
    }
}
