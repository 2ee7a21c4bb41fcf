//! Greeting templates.
//!
//! A template is a user-edited string with a name placeholder. Two
//! placeholder spellings are accepted: `<name>` and the short `<n>`.
//! Rendering never fails: a template without a placeholder gets the name
//! prepended instead.

mod direction;

pub use direction::Direction;

use serde::{Deserialize, Serialize};

/// Primary placeholder token.
pub const PLACEHOLDER: &str = "<name>";

/// Short placeholder token kept for templates written by older versions.
pub const SHORT_PLACEHOLDER: &str = "<n>";

/// Inserted between the name and the template when no placeholder is present.
pub const SEPARATOR: &str = ", ";

/// Built-in left-to-right default.
pub const DEFAULT_LTR: &str = "Dear <name>, happy holidays and I wish you well";

/// Built-in right-to-left default.
pub const DEFAULT_RTL: &str = "חג שמח <name> יקרה!";

/// Warning shown by the editor when a template has no placeholder.
pub const MISSING_PLACEHOLDER_WARNING: &str =
    "Please include the <name> placeholder in your template.";

/// Which placeholder spelling a template uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderForm {
    /// `<name>`
    Name,
    /// `<n>`
    Short,
}

/// A greeting template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    text: String,
}

impl Template {
    /// Wrap a template string as typed by the user.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The built-in default for a page direction.
    pub fn default_for(direction: Direction) -> Self {
        match direction {
            Direction::Ltr => Self::new(DEFAULT_LTR),
            Direction::Rtl => Self::new(DEFAULT_RTL),
        }
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// An empty template counts as no template at all: stores skip it and
    /// updates carrying it are ignored.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Detected placeholder form. `<name>` is reported when both are present.
    pub fn placeholder(&self) -> Option<PlaceholderForm> {
        if self.text.contains(PLACEHOLDER) {
            Some(PlaceholderForm::Name)
        } else if self.text.contains(SHORT_PLACEHOLDER) {
            Some(PlaceholderForm::Short)
        } else {
            None
        }
    }

    /// Substitute `name` into the template.
    ///
    /// Every occurrence of either placeholder form is replaced. Without a
    /// placeholder the result is `name + ", " + template`.
    pub fn render(&self, name: &str) -> String {
        if self.placeholder().is_none() {
            return format!("{name}{SEPARATOR}{}", self.text);
        }

        // Single pass so a name that itself looks like a token is left alone.
        let mut out = String::with_capacity(self.text.len() + name.len());
        let mut rest = self.text.as_str();
        while let Some(idx) = rest.find('<') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx..];
            if let Some(after) = tail.strip_prefix(PLACEHOLDER) {
                out.push_str(name);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(SHORT_PLACEHOLDER) {
                out.push_str(name);
                rest = after;
            } else {
                out.push('<');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::default_for(Direction::Ltr)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for Template {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Non-blocking editor warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateWarning {
    MissingPlaceholder,
}

impl TemplateWarning {
    /// Text shown next to the editor.
    pub fn message(&self) -> &'static str {
        match self {
            TemplateWarning::MissingPlaceholder => MISSING_PLACEHOLDER_WARNING,
        }
    }
}

impl std::fmt::Display for TemplateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Check a template as the user types it. Nothing is enforced.
pub fn validate(text: &str) -> Option<TemplateWarning> {
    if text.contains(PLACEHOLDER) || text.contains(SHORT_PLACEHOLDER) {
        None
    } else {
        Some(TemplateWarning::MissingPlaceholder)
    }
}
