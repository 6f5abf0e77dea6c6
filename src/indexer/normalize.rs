//! Helpers for turning scraped text into release fields

use chrono::{DateTime, Duration, Utc};

use super::client::{RawCategory, RawRelease};
use super::types::{ReleaseInfo, TorznabCapabilities};

/// Parse size string (e.g., "1.5 GB", "700MiB", "1,024 KB")
pub fn parse_size(size_str: &str) -> Option<i64> {
    let size_str = size_str.trim().to_uppercase().replace(',', "");

    let split = size_str
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(size_str.len());
    let (number, unit) = size_str.split_at(split);
    let num = number.trim().parse::<f64>().ok()?;

    let multiplier = match unit.trim() {
        "" | "B" | "BYTES" => 1.0,
        "KB" | "KIB" => 1024.0,
        "MB" | "MIB" => 1024.0 * 1024.0,
        "GB" | "GIB" => 1024.0 * 1024.0 * 1024.0,
        "TB" | "TIB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };

    Some((num * multiplier) as i64)
}

/// Parse a relative time string (e.g., "2 hours ago")
pub fn parse_time_ago(time_str: &str) -> DateTime<Utc> {
    parse_time_ago_from(time_str, Utc::now())
}

/// Parse a relative time string against a fixed `now`.
///
/// Unparseable input yields `now`.
pub fn parse_time_ago_from(time_str: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let time_str = time_str.to_lowercase();

    let parts: Vec<&str> = time_str.split_whitespace().collect();
    if parts.len() >= 2 {
        let num = match parts[0] {
            "a" | "an" => Some(1),
            n => n.parse::<i64>().ok(),
        };
        if let Some(num) = num {
            let unit = parts[1];
            let duration = if unit.starts_with("second") || unit.starts_with("sec") {
                Duration::seconds(num)
            } else if unit.starts_with("minute") || unit.starts_with("min") {
                Duration::minutes(num)
            } else if unit.starts_with("hour") {
                Duration::hours(num)
            } else if unit.starts_with("day") {
                Duration::days(num)
            } else if unit.starts_with("week") {
                Duration::weeks(num)
            } else if unit.starts_with("month") {
                Duration::days(num * 30)
            } else if unit.starts_with("year") {
                Duration::days(num * 365)
            } else {
                Duration::zero()
            };
            return now - duration;
        }
    }

    now
}

/// Parse an absolute (RFC 3339 / RFC 2822) or relative publish date
pub fn parse_publish_date(value: &str) -> DateTime<Utc> {
    let value = value.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return date.with_timezone(&Utc);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return date.with_timezone(&Utc);
    }

    parse_time_ago(value)
}

/// Clean title string
pub fn clean_title(title: &str) -> String {
    // Remove [REQ] or [REQUEST] tags at the start
    let title = title.trim();
    let title = ["[REQ]", "[REQUEST]", "[REQUESTED]"]
        .iter()
        .find_map(|tag| title.strip_prefix(tag))
        .map(str::trim_start)
        .unwrap_or(title);

    title
        .trim()
        .trim_matches(|c| c == '-' || c == ':')
        .trim()
        .to_string()
}

/// Parse a peer/grab counter such as "1,204"
pub fn parse_count(value: &str) -> Option<i32> {
    value.trim().replace(',', "").parse().ok()
}

/// Resolve `href` against the site link unless it is already absolute
pub fn absolute_url(site_link: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") || href.starts_with("magnet:") {
        return href.to_string();
    }
    format!(
        "{}/{}",
        site_link.trim_end_matches('/'),
        href.trim_start_matches('/')
    )
}

/// Turn a scraped row into a release record.
///
/// Returns `None` for rows without a usable title. Categories resolve by
/// token or label through the indexer's category map and fall back to
/// `Other`.
pub fn normalize_release(
    raw: &RawRelease,
    site_link: &str,
    caps: &TorznabCapabilities,
) -> Option<ReleaseInfo> {
    let title = clean_title(&raw.title);
    if title.is_empty() {
        return None;
    }

    let details = raw.details.as_deref().map(|d| absolute_url(site_link, d));
    let link = raw.download.as_deref().map(|d| absolute_url(site_link, d));
    let guid = details
        .clone()
        .or_else(|| link.clone())
        .or_else(|| raw.magnet.clone())
        .unwrap_or_else(|| title.clone());

    let seeders = raw.seeders.as_deref().and_then(parse_count);
    let leechers = raw.leechers.as_deref().and_then(parse_count);
    let peers = match (seeders, leechers) {
        (Some(s), Some(l)) => Some(s.saturating_add(l)),
        (Some(s), None) => Some(s),
        _ => None,
    };

    let publish_date = raw
        .published
        .as_deref()
        .map(parse_publish_date)
        .unwrap_or_else(Utc::now);

    Some(ReleaseInfo {
        title,
        guid,
        link,
        magnet_uri: raw.magnet.clone(),
        details,
        publish_date,
        categories: caps.result_categories(raw.category.as_ref().map(RawCategory::as_category_ref)),
        size: raw.size.as_deref().and_then(parse_size),
        grabs: raw.grabs.as_deref().and_then(parse_count),
        description: raw.description.clone(),
        seeders,
        peers,
        download_volume_factor: if raw.freeleech { 0.0 } else { 1.0 },
        upload_volume_factor: raw.upload_factor.unwrap_or(1.0),
        ..Default::default()
    })
}
