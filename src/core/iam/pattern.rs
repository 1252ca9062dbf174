//! Pattern matching for resource URNs
//!
//! URNs are compared segment by segment, segments being separated by `:`.
//! Inside a segment `*` matches any run of characters, including `/` and the
//! empty string. A trailing `*` on the last pattern segment also absorbs any
//! remaining candidate segments, so `urn:iws:*` covers every URN of the scope.
//!
//! Matching is case-sensitive. A pattern without `*` only matches itself.

/// Segment separator inside a URN
const SEPARATOR: char = ':';

/// Pattern matcher for resource URNs
pub struct PatternMatcher;

impl PatternMatcher {
    /// Check if a candidate URN matches a pattern
    ///
    /// # Examples
    /// ```
    /// use bastion::iam::PatternMatcher;
    ///
    /// assert!(PatternMatcher::matches("urn:org1:group:/*", "urn:org1:group:/teamA/g1"));
    /// assert!(PatternMatcher::matches("urn:*:group:/g1", "urn:org2:group:/g1"));
    /// assert!(!PatternMatcher::matches("urn:org1:group:/teamA/*", "urn:org1:group:/teamB/g1"));
    /// ```
    pub fn matches(pattern: &str, candidate: &str) -> bool {
        // Exact match
        if pattern == candidate {
            return true;
        }

        if !pattern.contains('*') {
            return false;
        }

        let pattern_parts: Vec<&str> = pattern.split(SEPARATOR).collect();
        let candidate_parts: Vec<&str> = candidate.split(SEPARATOR).collect();

        Self::match_parts(&pattern_parts, &candidate_parts, candidate)
    }

    /// Match pre-split pattern segments against pre-split candidate segments
    fn match_parts(pattern: &[&str], candidate: &[&str], raw_candidate: &str) -> bool {
        if candidate.len() < pattern.len() {
            return false;
        }

        let last = pattern.len() - 1;
        for (idx, pat_part) in pattern.iter().enumerate() {
            if idx == last {
                if candidate.len() == pattern.len() {
                    return Self::match_glob_segment(pat_part, candidate[idx]);
                }
                // Only a trailing wildcard may swallow extra segments
                if !pat_part.ends_with('*') {
                    return false;
                }
                let offset: usize = candidate[..idx].iter().map(|part| part.len() + 1).sum();
                return Self::match_glob_segment(pat_part, &raw_candidate[offset..]);
            }

            if !Self::match_glob_segment(pat_part, candidate[idx]) {
                return false;
            }
        }

        false
    }

    /// Match a glob segment (e.g. `/team*/`, `*`, `get*`) against a candidate segment
    ///
    /// Each `*` matches any run of characters. On mismatch the scan resumes
    /// just after the most recent `*`, which keeps the match linear in practice
    /// and unambiguous.
    fn match_glob_segment(pattern: &str, segment: &str) -> bool {
        let pattern = pattern.as_bytes();
        let segment = segment.as_bytes();

        let mut pat_idx = 0;
        let mut seg_idx = 0;
        let mut last_star: Option<usize> = None;
        let mut star_seg_idx = 0;

        while seg_idx < segment.len() {
            if pat_idx < pattern.len() && pattern[pat_idx] == b'*' {
                last_star = Some(pat_idx);
                star_seg_idx = seg_idx;
                pat_idx += 1;
            } else if pat_idx < pattern.len() && pattern[pat_idx] == segment[seg_idx] {
                pat_idx += 1;
                seg_idx += 1;
            } else if let Some(star) = last_star {
                // Let the last `*` absorb one more character and retry
                pat_idx = star + 1;
                star_seg_idx += 1;
                seg_idx = star_seg_idx;
            } else {
                return false;
            }
        }

        // Remaining pattern may only consist of wildcards matching the empty string
        pattern[pat_idx..].iter().all(|&b| b == b'*')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(PatternMatcher::matches(
            "urn:org1:group:/g1",
            "urn:org1:group:/g1"
        ));
        assert!(!PatternMatcher::matches(
            "urn:org1:group:/g1",
            "urn:org1:group:/g2"
        ));
        assert!(!PatternMatcher::matches(
            "urn:org1:group:/g1",
            "urn:org1:group:/g1/extra"
        ));
    }

    #[test]
    fn test_path_wildcard() {
        assert!(PatternMatcher::matches(
            "urn:org1:group:/*",
            "urn:org1:group:/teamA/g1"
        ));
        assert!(PatternMatcher::matches(
            "urn:org1:group:/*",
            "urn:org1:group:/g1"
        ));
        assert!(!PatternMatcher::matches(
            "urn:org1:group:/teamA/*",
            "urn:org1:group:/teamB/g1"
        ));
        assert!(PatternMatcher::matches(
            "urn:org1:group:/teamA/*",
            "urn:org1:group:/teamA/nested/g1"
        ));
    }

    #[test]
    fn test_whole_segment_wildcard() {
        assert!(PatternMatcher::matches(
            "urn:*:group:/g1",
            "urn:org2:group:/g1"
        ));
        assert!(!PatternMatcher::matches(
            "urn:*:group:/g1",
            "urn:org2:policy:/g1"
        ));
    }

    #[test]
    fn test_wildcard_matches_empty() {
        assert!(PatternMatcher::matches("urn:org1:group:/g1*", "urn:org1:group:/g1"));
        assert!(PatternMatcher::matches("urn:org1:*:/g1", "urn:org1::/g1"));
    }

    #[test]
    fn test_trailing_wildcard_spans_segments() {
        assert!(PatternMatcher::matches("*", "urn:iws:iam:org1:group/g1"));
        assert!(PatternMatcher::matches("urn:iws:*", "urn:iws:iam:org1:group/g1"));
        assert!(PatternMatcher::matches(
            "urn:iws:iam:org1:*",
            "urn:iws:iam:org1:group/g1"
        ));
        assert!(!PatternMatcher::matches(
            "urn:iws:iam:org1:*",
            "urn:iws:iam:org2:group/g1"
        ));
    }

    #[test]
    fn test_inner_wildcard_does_not_span_segments() {
        assert!(!PatternMatcher::matches("urn:*:g1", "urn:org1:group:g1"));
        assert!(!PatternMatcher::matches("urn:org1:group", "urn:org1:group:/g1"));
    }

    #[test]
    fn test_glob_inside_segment() {
        assert!(PatternMatcher::matches(
            "urn:org1:group:/team*/g1",
            "urn:org1:group:/teamA/g1"
        ));
        assert!(!PatternMatcher::matches(
            "urn:org1:group:/team*/g1",
            "urn:org1:group:/teamA/g2"
        ));
        assert!(PatternMatcher::matches(
            "urn:org1:group:/*/g*",
            "urn:org1:group:/a/b/gx"
        ));
        assert!(PatternMatcher::matches("urn:o:t:/a*b*c", "urn:o:t:/abbbbc"));
        assert!(!PatternMatcher::matches("urn:o:t:/a*b*c", "urn:o:t:/acb"));
    }

    #[test]
    fn test_overlapping_prefix_and_suffix() {
        // Prefix and suffix must not share characters
        assert!(!PatternMatcher::matches("urn:o:t:ab*ba", "urn:o:t:aba"));
        assert!(PatternMatcher::matches("urn:o:t:ab*ba", "urn:o:t:abba"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!PatternMatcher::matches(
            "urn:org1:group:/G1",
            "urn:org1:group:/g1"
        ));
        assert!(!PatternMatcher::matches("urn:ORG1:*", "urn:org1:group:/g1"));
    }

    #[test]
    fn test_star_in_candidate_is_literal() {
        assert!(!PatternMatcher::matches("urn:org1:group:/g1", "urn:*:group:/g1"));
        assert!(PatternMatcher::matches("urn:*:group:/g1", "urn:*:group:/g1"));
    }
}
