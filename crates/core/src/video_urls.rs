//! Lenient filtering of external video links.
//!
//! Properties only reference hosted videos. Anything that is not a YouTube or
//! Vimeo link, or a direct `.mp4` file, is dropped without error.

use url::Url;

/// Hosts accepted as video platforms (the domain itself or any subdomain).
const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be", "vimeo.com"];

fn is_video_host(host: &str) -> bool {
    VIDEO_HOSTS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Whether `raw` parses as a URL pointing at a known video platform or an
/// `.mp4` file.
pub fn is_likely_video_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    let host = url.host_str().unwrap_or("").to_lowercase();
    is_video_host(&host) || url.path().to_lowercase().ends_with(".mp4")
}

/// Normalize raw form values into the stored video URL list.
///
/// Each value may itself be a comma-separated list. Values are trimmed,
/// empties dropped, and only URLs accepted by [`is_likely_video_url`] kept,
/// in input order.
pub fn normalize_video_urls<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| is_likely_video_url(s))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_platforms() {
        assert!(is_likely_video_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_likely_video_url("https://youtu.be/abc"));
        assert!(is_likely_video_url("https://player.vimeo.com/video/1"));
        assert!(is_likely_video_url("https://cdn.example.com/tour/Campo.MP4"));
    }

    #[test]
    fn rejects_other_hosts_and_garbage() {
        assert!(!is_likely_video_url("https://example.com/video"));
        assert!(!is_likely_video_url("not a url"));
        assert!(!is_likely_video_url("https://notyoutube.com/watch"));
        assert!(!is_likely_video_url("https://example.com/clip.mp4.html"));
    }

    #[test]
    fn splits_comma_separated_values() {
        let values = vec![
            " https://youtu.be/a , https://evil.example/x,,".to_string(),
            "https://vimeo.com/2".to_string(),
        ];
        assert_eq!(
            normalize_video_urls(&values),
            vec!["https://youtu.be/a", "https://vimeo.com/2"]
        );
    }

    #[test]
    fn empty_input_yields_empty_list() {
        let values: Vec<String> = Vec::new();
        assert!(normalize_video_urls(&values).is_empty());
        assert!(normalize_video_urls(&["  "]).is_empty());
    }
}
