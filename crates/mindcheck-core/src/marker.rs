//! Marker extraction: pull the reported percentage out of narrative text.
//!
//! The narrative is instructed to contain a line such as
//! `Depression Probability: 83.5%`. The grammar is strict:
//!
//! - the label, case-sensitive, then `": "` (colon and exactly one space)
//! - one or more ASCII digits, optionally `.` followed by zero or more digits
//! - a `%` sign
//!
//! Every occurrence of the label prefix is tried in order and the first one
//! that completes the grammar wins. No range check happens here.

/// A fixed `<label>: X%` marker for one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPattern {
    pub label: &'static str,
}

impl MarkerPattern {
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }

    pub fn extract(&self, text: &str) -> Option<f64> {
        extract_marker(text, self.label)
    }

    /// The example line shown to the generator, e.g. `Depression Probability: X%`.
    pub fn template_line(&self) -> String {
        format!("{}: X%", self.label)
    }
}

/// Find the first `<label>: <number>%` in `text` and parse the number.
pub fn extract_marker(text: &str, label: &str) -> Option<f64> {
    if label.is_empty() {
        return None;
    }
    let prefix = format!("{label}: ");
    let mut offset = 0;
    while let Some(found) = text[offset..].find(&prefix) {
        let start = offset + found + prefix.len();
        if let Some(value) = parse_percent(&text[start..]) {
            return Some(value);
        }
        offset += found + 1;
        // `find` returned a char boundary; step past the whole char.
        while !text.is_char_boundary(offset) {
            offset += 1;
        }
    }
    None
}

/// Parse `\d+(\.\d*)?%` at the start of `s`.
fn parse_percent(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let int_end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    if int_end == 0 {
        return None;
    }

    let mut end = int_end;
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        end += bytes[end..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(bytes.len() - end);
    }

    if bytes.get(end) != Some(&b'%') {
        return None;
    }
    s[..end].trim_end_matches('.').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPRESSION: MarkerPattern = MarkerPattern::new("Depression Probability");
    const ACADEMIC: MarkerPattern = MarkerPattern::new("Academic Stress Probability");

    #[test]
    fn decimal_precision_is_preserved() {
        let text = "**Summary** ...\nDepression Probability: 83.5%\nRecommendations...";
        assert_eq!(DEPRESSION.extract(text), Some(83.5));
    }

    #[test]
    fn integral_value() {
        assert_eq!(
            ACADEMIC.extract("Academic Stress Probability: 75% (moderate-high)"),
            Some(75.0)
        );
    }

    #[test]
    fn trailing_dot_is_accepted() {
        assert_eq!(DEPRESSION.extract("Depression Probability: 40.%"), Some(40.0));
    }

    #[test]
    fn first_complete_occurrence_wins() {
        let text = "Format: 'Depression Probability: X%'.\nDepression Probability: 62%\n\
                    Depression Probability: 10%";
        assert_eq!(DEPRESSION.extract(text), Some(62.0));
    }

    #[test]
    fn out_of_range_value_passes_through() {
        assert_eq!(DEPRESSION.extract("Depression Probability: 150%"), Some(150.0));
    }

    #[test]
    fn absent_or_malformed_marker_is_none() {
        assert_eq!(DEPRESSION.extract(""), None);
        assert_eq!(DEPRESSION.extract("no marker here"), None);
        assert_eq!(DEPRESSION.extract("Depression Probability: high"), None);
        assert_eq!(DEPRESSION.extract("Depression Probability:  40%"), None);
        assert_eq!(DEPRESSION.extract("Depression Probability: 40"), None);
        assert_eq!(DEPRESSION.extract("depression probability: 40%"), None);
        assert_eq!(DEPRESSION.extract("Depression Probability: 4.0.1%"), None);
    }

    #[test]
    fn label_must_match_deployment() {
        let text = "Academic Stress Probability: 30%";
        assert_eq!(DEPRESSION.extract(text), None);
        assert_eq!(ACADEMIC.extract(text), Some(30.0));
    }

    #[test]
    fn non_ascii_text_around_marker() {
        let text = "Résumé — état émotionnel\nDepression Probability: 12.25% ✓";
        assert_eq!(DEPRESSION.extract(text), Some(12.25));
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "Depression Probability: 83.5%";
        let first = DEPRESSION.extract(text);
        assert_eq!(first, DEPRESSION.extract(text));
        assert_eq!(first, extract_marker(text, "Depression Probability"));
    }

    #[test]
    fn template_line() {
        assert_eq!(ACADEMIC.template_line(), "Academic Stress Probability: X%");
    }
}
