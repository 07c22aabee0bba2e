//! Shared utility functions for FNB crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// Date formats accepted in spreadsheet and point-of-sale exports,
    /// tried in order.
    const FLEXIBLE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d", "%Y%m%d"];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Parse a date string in "YYYYMMDD" format (KNMI compact format)
    pub fn parse_date_compact(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y%m%d")?)
    }

    /// Parse a date in any of the formats found in the budget sheet and
    /// sales exports. A trailing time part ("2025-05-01 00:00:00",
    /// "2025-05-01T00:00") is ignored.
    pub fn parse_date_flexible(s: &str) -> anyhow::Result<NaiveDate> {
        let trimmed = s.trim();
        let date_part = trimmed
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('T')
            .next()
            .unwrap_or("");
        if date_part.is_empty() {
            anyhow::bail!("empty date value");
        }
        for format in FLEXIBLE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                return Ok(date);
            }
        }
        Err(crate::error::DateError(trimmed.to_string()).into())
    }

}

/// Number parsing for European-formatted exports
pub mod numbers {
    /// Parse a decimal that may use a comma as the decimal separator and
    /// dots as thousands separators ("1.234,50"). Currency signs and
    /// surrounding whitespace are ignored. Empty cells and "-" yield `None`.
    pub fn parse_decimal(s: &str) -> Option<f64> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '€')
            .collect();
        if cleaned.is_empty() || cleaned == "-" {
            return None;
        }
        let normalized = if cleaned.contains(',') {
            cleaned.replace('.', "").replace(',', ".")
        } else {
            cleaned
        };
        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }

}

/// Column header normalization
pub mod columns {
    /// Normalize a header for lookup: strip a byte-order mark, trim,
    /// lower-case, treat underscores as spaces and collapse runs of
    /// whitespace.
    pub fn normalize_column(name: &str) -> String {
        name.trim_start_matches('\u{feff}')
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Find the index of the first header matching any alias.
    /// Aliases are compared in normalized form.
    pub fn find_column<'a, I>(headers: I, aliases: &[&str]) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let normalized: Vec<String> = headers.into_iter().map(normalize_column).collect();
        aliases.iter().find_map(|alias| {
            let alias = normalize_column(alias);
            normalized.iter().position(|h| *h == alias)
        })
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: unrecognized date {:?}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
