//! Roster (CSV) parsing
//!
//! One upload is a headered CSV with the columns `company_name`,
//! `company_website`, `employee_size`, `location`. Rows missing a required
//! field are skipped with a warning rather than voiding the whole file.

use crate::error::{Error, Result};
use crate::ingestion::normalize::{
    normalize_employee_size, normalize_location, normalize_website,
};
use crate::types::CompanyRecord;

/// Column names the roster header must or may carry.
const COL_NAME: &str = "company_name";
const COL_WEBSITE: &str = "company_website";
const COL_SIZE: &str = "employee_size";
const COL_LOCATION: &str = "location";

/// Outcome of parsing one roster file.
#[derive(Debug)]
pub struct ParsedRoster {
    pub records: Vec<CompanyRecord>,
    pub skipped: usize,
}

/// Parse roster bytes into normalized company records.
///
/// Missing `company_name`/`company_website` headers make the whole file
/// unusable and return an error; missing optional columns degrade to `NA`
/// per row. Individual malformed rows are skipped and counted.
pub fn parse_roster(bytes: &[u8]) -> Result<ParsedRoster> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| Error::Roster(format!("unreadable header row: {e}")))?
        .clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let name_idx = position(COL_NAME)
        .ok_or_else(|| Error::Roster(format!("missing required column '{COL_NAME}'")))?;
    let website_idx = position(COL_WEBSITE)
        .ok_or_else(|| Error::Roster(format!("missing required column '{COL_WEBSITE}'")))?;
    let size_idx = position(COL_SIZE);
    let location_idx = position(COL_LOCATION);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(row = row + 1, "skipping malformed roster row: {e}");
                skipped += 1;
                continue;
            }
        };

        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
        let company_name = field(name_idx);
        let raw_website = field(website_idx);

        if company_name.is_empty() || raw_website.is_empty() {
            tracing::warn!(
                row = row + 1,
                "skipping roster row with empty company_name or company_website"
            );
            skipped += 1;
            continue;
        }

        records.push(CompanyRecord {
            company_name: company_name.to_string(),
            company_website: normalize_website(raw_website),
            employee_size: normalize_employee_size(
                size_idx.map(field).unwrap_or(""),
            ),
            location: normalize_location(location_idx.map(field).unwrap_or("")),
        });
    }

    Ok(ParsedRoster { records, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SizeBucket;

    const ROSTER: &str = "company_name,company_website,employee_size,location\n\
                          test1,test1.com,45,USA\n\
                          test2,test2.com,592,Canada\n";

    #[test]
    fn parses_and_normalizes_rows() {
        let roster = parse_roster(ROSTER.as_bytes()).unwrap();
        assert_eq!(roster.skipped, 0);
        assert_eq!(roster.records.len(), 2);

        let first = &roster.records[0];
        assert_eq!(first.company_name, "test1");
        assert_eq!(first.company_website, "https://www.test1.com");
        assert_eq!(first.employee_size, SizeBucket::Small);
        assert_eq!(first.location, "USA");

        let second = &roster.records[1];
        assert_eq!(second.company_website, "https://www.test2.com");
        assert_eq!(second.employee_size, SizeBucket::Enterprise);
    }

    #[test]
    fn skips_rows_missing_required_fields() {
        let input = "company_name,company_website,employee_size,location\n\
                     ,missing-name.com,5,USA\n\
                     no-website,,5,USA\n\
                     ok,ok.com,5,USA\n";
        let roster = parse_roster(input.as_bytes()).unwrap();
        assert_eq!(roster.skipped, 2);
        assert_eq!(roster.records.len(), 1);
        assert_eq!(roster.records[0].company_name, "ok");
    }

    #[test]
    fn short_rows_degrade_to_na() {
        let input = "company_name,company_website,employee_size,location\n\
                     acme,acme.com\n";
        let roster = parse_roster(input.as_bytes()).unwrap();
        assert_eq!(roster.records.len(), 1);
        assert_eq!(roster.records[0].employee_size, SizeBucket::Unknown);
        assert_eq!(roster.records[0].location, "NA");
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let input = "company_name,employee_size,location\nacme,5,USA\n";
        assert!(parse_roster(input.as_bytes()).is_err());
    }

    #[test]
    fn empty_file_yields_no_records() {
        let input = "company_name,company_website,employee_size,location\n";
        let roster = parse_roster(input.as_bytes()).unwrap();
        assert!(roster.records.is_empty());
        assert_eq!(roster.skipped, 0);
    }
}
