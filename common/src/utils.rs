use chrono::DateTime;

/// Builds the gravatar identicon URL for an email address.
pub fn gravatar_url(email: &str, size: u32) -> String {
    let digest = md5::compute(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{digest:x}?d=identicon&s={size}")
}

/// Formats a unix timestamp (seconds, UTC) the way timelines display it.
pub fn format_pub_date(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(date) => date.format("%Y-%m-%d @ %H:%M").to_string(),
        None => "Unknown date".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravatar_hashes_normalized_email() {
        let expected =
            "https://www.gravatar.com/avatar/b58996c504c5638798eb6b511e6f49af?d=identicon&s=48";
        assert_eq!(gravatar_url("user@example.com", 48), expected);
        assert_eq!(gravatar_url("  User@Example.COM ", 48), expected);
    }

    #[test]
    fn pub_date_formatting() {
        assert_eq!(format_pub_date(0), "1970-01-01 @ 00:00");
        assert_eq!(format_pub_date(1_700_000_000), "2023-11-14 @ 22:13");
        assert_eq!(format_pub_date(i64::MAX), "Unknown date");
    }
}
