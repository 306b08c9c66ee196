// src/version.rs

//! Version comparison and pinning
//!
//! Versions are dot-separated numeric segments (`1.4.0.7`). Comparison uses a
//! truncated prefix rule: the final segment of the current version is never
//! compared, since manifests abstract the build counter away behind `LATEST`.

/// Placeholder written in place of the final version segment
pub const LATEST: &str = "LATEST";

/// Check whether `candidate` is newer than `current`
///
/// Walks every segment of `current` except the last and returns true as soon
/// as the candidate's segment at the same index is strictly greater. Segments
/// that fail to parse (including `LATEST`) are never greater. A single-segment
/// `current` compares nothing and is never outdated.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    let current: Vec<&str> = current.split('.').collect();
    let candidate: Vec<&str> = candidate.split('.').collect();

    for i in 0..current.len().saturating_sub(1) {
        let ours = parse_segment(current[i]);
        let theirs = candidate.get(i).and_then(|s| parse_segment(s));

        if let (Some(ours), Some(theirs)) = (ours, theirs)
            && theirs > ours
        {
            return true;
        }
    }

    false
}

/// Replace the final segment of `version` with `LATEST`
///
/// `3.4.2` becomes `3.4.LATEST`; a version without any `.` becomes `LATEST`.
pub fn pin_latest(version: &str) -> String {
    match version.rfind('.') {
        Some(idx) => format!("{}{}", &version[..=idx], LATEST),
        None => LATEST.to_string(),
    }
}

/// Segments are parsed as `u128` so that long numeric runs still compare
fn parse_segment(segment: &str) -> Option<u128> {
    segment.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_minor() {
        assert!(is_newer("1.2.3", "1.3.0"));
    }

    #[test]
    fn test_older_minor() {
        assert!(!is_newer("1.2.3", "1.1.9"));
    }

    #[test]
    fn test_last_segment_ignored() {
        assert!(!is_newer("2.0.0", "2.0.5"));
        assert!(!is_newer("1.4.0.1", "1.4.0.99"));
        assert!(!is_newer("1.4.0.LATEST", "1.4.0.12"));
    }

    #[test]
    fn test_single_segment_never_newer() {
        assert!(!is_newer("1", "2"));
        assert!(!is_newer("5", "5"));
        assert!(!is_newer("", "9"));
    }

    #[test]
    fn test_unparsable_segments_not_greater() {
        assert!(!is_newer("1.x.0", "1.9.0"));
        assert!(!is_newer("1.2.0", "1.beta.0"));
        assert!(!is_newer("1.2.0", "1"));
    }

    #[test]
    fn test_latest_current_still_compares_prefix() {
        assert!(is_newer("1.2.LATEST", "1.3.0"));
        assert!(is_newer("1.2.0.LATEST", "1.2.1.4"));
    }

    #[test]
    fn test_first_greater_segment_wins() {
        // Comparison stops at the first greater segment; a smaller leading
        // segment does not short-circuit to false.
        assert!(is_newer("2.0.0", "1.5.0"));
    }

    #[test]
    fn test_long_segments_compare() {
        assert!(is_newer(
            "1.99999999999999999999999.0",
            "1.100000000000000000000000.0"
        ));
        assert!(!is_newer(
            "1.100000000000000000000000.0",
            "1.99999999999999999999999.0"
        ));
    }

    #[test]
    fn test_pin_latest() {
        assert_eq!(pin_latest("3.4.2"), "3.4.LATEST");
        assert_eq!(pin_latest("1.2.0.7"), "1.2.0.LATEST");
        assert_eq!(pin_latest("7"), "LATEST");
        assert_eq!(pin_latest("1."), "1.LATEST");
    }
}
