//! First-name extraction.
//!
//! Turns text found on a page (title attributes, short text nodes) into
//! first names. The markup scanning is a best-effort heuristic tied to how
//! chat lists are usually rendered; the rules in [`first_name`] are the
//! stable part.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Words that mark a candidate as UI chrome rather than a contact name.
const REJECTED_MARKERS: [&str; 2] = ["Status", "Photo"];

/// Longest full name, in words, still taken as a name.
const MAX_WORDS: usize = 3;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z][a-zA-Z0-9]*\b([^>]*)>").unwrap());

static SPAN_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<span\b([^>]*)>([^<]{1,80})</span>").unwrap());

static TITLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\btitle\s*=\s*"([^"]*)""#).unwrap());

static ROOT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:html|body)\b([^>]*)>").unwrap());

static DIR_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bdir\s*=\s*"([^"]*)""#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Title,
    Text,
}

/// A piece of page text that might be a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCandidate {
    pub source: CandidateSource,
    pub text: String,
    /// The element's `dir` attribute, if any.
    pub dir: Option<String>,
}

impl NameCandidate {
    /// Candidate without a direction.
    pub fn new(source: CandidateSource, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
            dir: None,
        }
    }

    /// Set the element's `dir` attribute.
    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Whether the element is marked right-to-left.
    pub fn is_rtl(&self) -> bool {
        self.dir
            .as_deref()
            .is_some_and(|d| d.trim().eq_ignore_ascii_case("rtl"))
    }
}

/// First name from a full name, or `None` if it does not look like one.
pub fn first_name(raw: &str) -> Option<String> {
    let full = raw.trim();
    if full.is_empty() || REJECTED_MARKERS.iter().any(|m| full.contains(m)) {
        return None;
    }

    let mut words = full.split_whitespace();
    let first = words.next()?;
    if words.count() + 1 > MAX_WORDS {
        return None;
    }

    (first.chars().count() > 1).then(|| first.to_string())
}

/// First names from candidates, in order, without duplicates.
/// Right-to-left elements are skipped.
pub fn extract_first_names(candidates: &[NameCandidate]) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|c| !c.is_rtl())
        .filter_map(|c| first_name(&c.text))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Scan markup for name candidates in document order: `title` attributes
/// on any element and short `<span>` text.
pub fn candidates_from_html(html: &str) -> Vec<NameCandidate> {
    let mut found: Vec<(usize, NameCandidate)> = Vec::new();

    for cap in TAG_RE.captures_iter(html) {
        let (Some(tag), Some(attrs)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if let Some(title) = attribute(&TITLE_ATTR_RE, attrs.as_str()) {
            if !title.trim().is_empty() {
                found.push((tag.start(), candidate(CandidateSource::Title, title, attrs.as_str())));
            }
        }
    }

    for cap in SPAN_TEXT_RE.captures_iter(html) {
        let (Some(whole), Some(attrs), Some(text)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            continue;
        };
        let text = decode_entities(text.as_str());
        if !text.trim().is_empty() {
            // Sort after the span's own title, if it has one.
            found.push((whole.start() + 1, candidate(CandidateSource::Text, text, attrs.as_str())));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, c)| c).collect()
}

/// The document's declared direction: the `dir` attribute of `<html>`,
/// else of `<body>`.
pub fn document_dir(html: &str) -> Option<String> {
    ROOT_TAG_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .find_map(|attrs| attribute(&DIR_ATTR_RE, attrs.as_str()))
}

/// Visible text of the markup, for direction detection.
pub fn visible_text(html: &str) -> String {
    SPAN_TEXT_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(2))
        .map(|m| decode_entities(m.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn candidate(source: CandidateSource, text: String, attrs: &str) -> NameCandidate {
    NameCandidate {
        source,
        text,
        dir: attribute(&DIR_ATTR_RE, attrs),
    }
}

fn attribute(re: &Regex, attrs: &str) -> Option<String> {
    re.captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name_rules() {
        assert_eq!(first_name("  Maria Lopez "), Some("Maria".into()));
        assert_eq!(first_name("Sam"), Some("Sam".into()));
        assert_eq!(first_name("Anna Maria de Souza"), None);
        assert_eq!(first_name("J"), None);
        assert_eq!(first_name("J Smith"), None);
        assert_eq!(first_name("Status update"), None);
        assert_eq!(first_name("Photo"), None);
        assert_eq!(first_name("   "), None);
    }

    #[test]
    fn test_first_name_counts_characters_not_bytes() {
        assert_eq!(first_name("ש"), None);
        assert_eq!(first_name("נועה כהן"), Some("נועה".into()));
    }

    #[test]
    fn test_extract_dedupes_and_skips_rtl() {
        let candidates = vec![
            NameCandidate::new(CandidateSource::Title, "Maria Lopez"),
            NameCandidate::new(CandidateSource::Text, "Maria Lopez"),
            NameCandidate::new(CandidateSource::Text, "דנה לוי").with_dir("rtl"),
            NameCandidate::new(CandidateSource::Text, "Sam"),
            NameCandidate::new(CandidateSource::Text, "Photo"),
        ];

        assert_eq!(extract_first_names(&candidates), vec!["Maria", "Sam"]);
    }

    #[test]
    fn test_candidates_from_html() {
        let html = r#"
            <div title="Group chat"><span dir="auto" title="Maria Lopez">Maria Lopez</span></div>
            <span dir="rtl">דנה</span>
            <span class="x">Tom &amp; Jerry</span>
            <img title="Photo">
        "#;

        let candidates = candidates_from_html(html);
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Group chat",
                "Maria Lopez",
                "Maria Lopez",
                "דנה",
                "Tom & Jerry",
                "Photo"
            ]
        );
        assert_eq!(candidates[1].source, CandidateSource::Title);
        assert_eq!(candidates[2].source, CandidateSource::Text);
        assert!(candidates[3].is_rtl());

        assert_eq!(
            extract_first_names(&candidates),
            vec!["Group", "Maria", "Tom"]
        );
    }

    #[test]
    fn test_document_dir() {
        assert_eq!(
            document_dir(r#"<html lang="he" dir="rtl"><body>"#).as_deref(),
            Some("rtl")
        );
        assert_eq!(
            document_dir(r#"<html><body dir="ltr">"#).as_deref(),
            Some("ltr")
        );
        assert_eq!(document_dir("<html><body>"), None);
    }

    #[test]
    fn test_visible_text() {
        let html = r#"<span>Maria</span><p>skip</p><span title="x">Sam &amp; co</span>"#;
        assert_eq!(visible_text(html), "Maria Sam & co");
    }

    #[test]
    fn test_no_candidates() {
        assert!(candidates_from_html("<p>hello</p>").is_empty());
        assert!(extract_first_names(&[]).is_empty());
    }
}
