//! Fixed procedure code table (HCPCS-style `code,short_description`).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CodesError, Result};

#[derive(Debug, Deserialize)]
struct ProcedureRow {
    code: String,
    short_description: String,
}

/// Procedure code to short description, matched exactly.
#[derive(Debug, Clone, Default)]
pub struct ProcedureCodeTable {
    entries: HashMap<String, String>,
}

impl ProcedureCodeTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads a CSV file with `code` and `short_description` columns.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| CodesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file).map_err(|source| CodesError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut entries = HashMap::new();
        for row in csv_reader.deserialize::<ProcedureRow>() {
            let row = row?;
            if row.code.is_empty() || row.short_description.is_empty() {
                continue;
            }
            entries.insert(row.code, row.short_description);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for ProcedureCodeTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
