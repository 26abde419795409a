//! Field normalization applied to every roster row

use crate::types::SizeBucket;

/// Normalize a raw website value to `https://www.<bare-domain>`.
///
/// Strips an optional scheme and `www.` prefix, drops everything from the
/// first `/` on, lowercases the domain, then rebuilds the canonical form.
/// Idempotent: normalizing an already-normalized value is a no-op.
pub fn normalize_website(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    let domain = without_www.split('/').next().unwrap_or("");
    format!("https://www.{}", domain.to_ascii_lowercase())
}

/// Normalize a raw employee-size value to a bucket.
///
/// A value that is already a valid label is kept. Otherwise an integer
/// parse is attempted and bucketed; anything unparsable maps to `NA`.
pub fn normalize_employee_size(raw: &str) -> SizeBucket {
    let trimmed = raw.trim();
    if let Some(bucket) = SizeBucket::from_label(trimmed) {
        return bucket;
    }
    match trimmed.parse::<i64>() {
        Ok(count) => SizeBucket::from_count(count),
        Err(_) => SizeBucket::Unknown,
    }
}

/// Normalize a raw location value. Absent or blank locations become `NA`.
pub fn normalize_location(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "NA".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_strips_scheme_www_and_path() {
        assert_eq!(
            normalize_website("http://www.Example.com/about"),
            "https://www.example.com"
        );
        assert_eq!(normalize_website("test1.com"), "https://www.test1.com");
        assert_eq!(
            normalize_website("https://leadbird.io/"),
            "https://www.leadbird.io"
        );
        assert_eq!(
            normalize_website("www.acme.dev/products/x"),
            "https://www.acme.dev"
        );
    }

    #[test]
    fn website_normalization_is_idempotent() {
        for raw in [
            "http://www.Example.com/about",
            "test1.com",
            "https://www.already.com",
            "WWW.MIXED.COM",
        ] {
            let once = normalize_website(raw);
            assert_eq!(normalize_website(&once), once);
        }
    }

    #[test]
    fn employee_size_keeps_valid_labels() {
        assert_eq!(normalize_employee_size("11-50"), SizeBucket::Small);
        assert_eq!(normalize_employee_size("500+"), SizeBucket::Enterprise);
        assert_eq!(normalize_employee_size("NA"), SizeBucket::Unknown);
    }

    #[test]
    fn employee_size_buckets_counts() {
        assert_eq!(normalize_employee_size("45"), SizeBucket::Small);
        assert_eq!(normalize_employee_size("592"), SizeBucket::Enterprise);
    }

    #[test]
    fn employee_size_bucket_boundaries() {
        assert_eq!(normalize_employee_size("10"), SizeBucket::Micro);
        assert_eq!(normalize_employee_size("11"), SizeBucket::Small);
        assert_eq!(normalize_employee_size("50"), SizeBucket::Small);
        assert_eq!(normalize_employee_size("51"), SizeBucket::Medium);
        assert_eq!(normalize_employee_size("200"), SizeBucket::Medium);
        assert_eq!(normalize_employee_size("201"), SizeBucket::Large);
        assert_eq!(normalize_employee_size("500"), SizeBucket::Large);
        assert_eq!(normalize_employee_size("501"), SizeBucket::Enterprise);
    }

    #[test]
    fn employee_size_unparsable_maps_to_na() {
        assert_eq!(normalize_employee_size("a few"), SizeBucket::Unknown);
        assert_eq!(normalize_employee_size(""), SizeBucket::Unknown);
    }

    #[test]
    fn location_defaults_to_na() {
        assert_eq!(normalize_location(""), "NA");
        assert_eq!(normalize_location("   "), "NA");
        assert_eq!(normalize_location(" USA "), "USA");
    }
}
