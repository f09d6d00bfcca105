use serde::{Deserialize, Serialize};

/// A timestamped span of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Copy of this segment carrying different text, timing untouched
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        Self {
            start: self.start,
            end: self.end,
            text: text.into(),
        }
    }
}

/// Order segments by start time; ties keep their original order
pub fn sort_chronologically(segments: &mut [Segment]) {
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_text_keeps_timing() {
        let seg = Segment::new(1.5, 3.25, "hello");
        let translated = seg.with_text("bonjour");
        assert_eq!(translated.start, 1.5);
        assert_eq!(translated.end, 3.25);
        assert_eq!(translated.text, "bonjour");
    }

    #[test]
    fn test_sort_is_stable_on_equal_starts() {
        let mut segments = vec![
            Segment::new(5.0, 6.0, "c"),
            Segment::new(1.0, 2.0, "a"),
            Segment::new(1.0, 1.5, "b"),
        ];
        sort_chronologically(&mut segments);
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }
}
