use anyhow::Result;

/// Mask a secret, keeping the first and last five characters of long values.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***".to_string()
    }
}

/// Whether an env-style key names a secret value.
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_uppercase();
    key.ends_with("TOKEN") || key.ends_with("KEY")
}

pub fn format_timestamp(timestamp: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(timestamp) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        timestamp.to_string()
    }
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Progress through a batch as a percentage, e.g. `33.3`.
pub fn progress_percent(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    index as f64 / total as f64 * 100.0
}

pub fn confirm(message: &str) -> Result<bool> {
    use dialoguer::Confirm;

    Ok(Confirm::new().with_prompt(message).default(false).interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret_long_value() {
        assert_eq!(mask_secret("abcdefghijklmnop"), "abcde...lmnop");
    }

    #[test]
    fn test_mask_secret_short_value() {
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret("exactly10c"), "***");
        assert_eq!(mask_secret(""), "***");
    }

    #[test]
    fn test_mask_secret_multibyte() {
        assert_eq!(mask_secret("ééééééééééé"), "ééééé...ééééé");
    }

    #[test]
    fn test_is_secret_key() {
        assert!(is_secret_key("CF_API_TOKEN"));
        assert!(is_secret_key("cf_api_key"));
        assert!(!is_secret_key("CF_ACCOUNT_ID"));
        assert!(!is_secret_key("CF_EMAIL"));
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2024-01-15T10:30:00.123456Z"),
            "2024-01-15 10:30:00"
        );
        assert_eq!(format_timestamp("not a date"), "not a date");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a much longer string", 10), "a much ...");
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(format!("{:.1}", progress_percent(1, 3)), "33.3");
        assert_eq!(format!("{:.1}", progress_percent(3, 3)), "100.0");
        assert_eq!(progress_percent(0, 0), 100.0);
    }
}
