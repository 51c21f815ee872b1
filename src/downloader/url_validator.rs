// Post URL validation
//
// Matching is anchored at the start only. Trailing content after a valid
// prefix (query strings, extra path segments, garbage) is accepted.

use regex::Regex;

lazy_static::lazy_static! {
    static ref POST_URL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"^https?://(?:www\.)?twitter\.com/\w+/status/\d+").unwrap(),
        Regex::new(r"^https?://(?:www\.)?x\.com/\w+/status/\d+").unwrap(),
        // Link shortener
        Regex::new(r"^https?://t\.co/\w+").unwrap(),
    ];
}

/// Check if the string starts with a supported post URL shape
pub fn is_valid_post_url(url: &str) -> bool {
    POST_URL_PATTERNS.iter().any(|re| re.is_match(url))
}

/// Validate and return a ready-to-use error for rejected input
pub fn validate(url: &str) -> Result<(), super::DownloadError> {
    if is_valid_post_url(url) {
        Ok(())
    } else {
        Err(super::DownloadError::InvalidUrl(
            "Please provide a valid Twitter/X URL".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_shapes() {
        assert!(is_valid_post_url("https://twitter.com/user/status/1234567890"));
        assert!(is_valid_post_url("http://www.twitter.com/user_1/status/1"));
        assert!(is_valid_post_url("https://x.com/user/status/123456"));
        assert!(is_valid_post_url("https://www.x.com/someone/status/42"));
        assert!(is_valid_post_url("https://t.co/AbC123"));
    }

    #[test]
    fn test_prefix_match_accepts_trailing_content() {
        assert!(is_valid_post_url("https://x.com/user/status/123456?s=20"));
        assert!(is_valid_post_url("https://x.com/user/status/123456/video/1"));
        assert!(is_valid_post_url("https://t.co/abc def"));
    }

    #[test]
    fn test_rejects_everything_else() {
        assert!(!is_valid_post_url("not-a-url"));
        assert!(!is_valid_post_url(""));
        assert!(!is_valid_post_url(" https://x.com/user/status/1"));
        assert!(!is_valid_post_url("https://x.com/user"));
        assert!(!is_valid_post_url("https://x.com/user/status/abc"));
        assert!(!is_valid_post_url("https://youtube.com/watch?v=1"));
        assert!(!is_valid_post_url("ftp://twitter.com/user/status/1"));
        assert!(!is_valid_post_url("https://mobile.twitter.com/user/status/1"));
        assert!(!is_valid_post_url("https://t.co/"));
    }

    #[test]
    fn test_validate_error_kind() {
        let err = validate("not-a-url").unwrap_err();
        assert_eq!(err.kind(), crate::downloader::ErrorKind::InvalidUrl);
    }
}
