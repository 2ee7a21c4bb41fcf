//! Text direction detection.
//!
//! Pure logic, no I/O: the page supplies its `dir` attribute and a sample
//! of its text, and we pick which built-in default applies.

use serde::{Deserialize, Serialize};

/// Writing direction of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Resolve the direction of a page.
    ///
    /// An explicit `dir` attribute wins. Without one, the text is scanned
    /// for right-to-left script characters.
    pub fn resolve(dir_attr: Option<&str>, text: &str) -> Self {
        match dir_attr.map(str::trim).filter(|d| !d.is_empty()) {
            Some(dir) if dir.eq_ignore_ascii_case("rtl") => Direction::Rtl,
            Some(_) => Direction::Ltr,
            None => Self::detect(text),
        }
    }

    /// Detect direction from text content alone.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_rtl_char) {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Ltr => f.write_str("ltr"),
            Direction::Rtl => f.write_str("rtl"),
        }
    }
}

/// Hebrew (U+0590..U+05FF) or Arabic (U+0600..U+06FF).
fn is_rtl_char(c: char) -> bool {
    matches!(c, '\u{0590}'..='\u{05FF}' | '\u{0600}'..='\u{06FF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_latin_is_ltr() {
        assert_eq!(Direction::detect("Maria Lopez"), Direction::Ltr);
        assert_eq!(Direction::detect(""), Direction::Ltr);
    }

    #[test]
    fn test_detect_hebrew_and_arabic() {
        assert_eq!(Direction::detect("שלום"), Direction::Rtl);
        assert_eq!(Direction::detect("hello مرحبا"), Direction::Rtl);
    }

    #[test]
    fn test_dir_attribute_wins_over_text() {
        assert_eq!(Direction::resolve(Some("rtl"), "plain text"), Direction::Rtl);
        assert_eq!(Direction::resolve(Some("RTL"), ""), Direction::Rtl);
        assert_eq!(Direction::resolve(Some("ltr"), "שלום"), Direction::Ltr);
    }

    #[test]
    fn test_blank_dir_attribute_falls_back_to_text() {
        assert_eq!(Direction::resolve(Some("  "), "שלום"), Direction::Rtl);
        assert_eq!(Direction::resolve(None, "hello"), Direction::Ltr);
    }
}
