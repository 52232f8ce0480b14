//! In-memory code-to-description lookup.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Columns in the tabular code list are separated by two or more spaces.
static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid column gap regex"));

/// Canonical form of a code: alphanumerics only, upper-cased.
///
/// `e11.9` and `E119` resolve to the same key.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Immutable mapping from diagnosis code to its description.
///
/// Built once per run and shared read-only between workers.
#[derive(Debug, Clone, Default)]
pub struct CodeLookup {
    entries: HashMap<String, String>,
}

impl CodeLookup {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses the fixed-width code list: one `CODE  Description` per line.
    ///
    /// Lines without both columns are ignored.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for line in text.lines() {
            let mut columns = COLUMN_GAP.splitn(line.trim(), 2);
            let (Some(code), Some(description)) = (columns.next(), columns.next()) else {
                continue;
            };
            let key = normalize_code(code);
            let description = description.trim();
            if key.is_empty() || description.is_empty() {
                continue;
            }
            entries.insert(key, description.to_string());
        }
        Self { entries }
    }

    /// Description for a code, ignoring punctuation and case.
    pub fn get(&self, code: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries.get(&normalize_code(code)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for CodeLookup {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(code, description)| (normalize_code(&code), description))
                .filter(|(code, _)| !code.is_empty())
                .collect(),
        }
    }
}
