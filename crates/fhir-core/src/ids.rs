//! Bundle-local entry identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for every name-based UUID the bundler derives.
const BUNDLER_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a9e_4b3d_5e87_9a0c_d2f4_1b6e_8c35);

/// How entry `fullUrl`s are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// A fresh UUID v4 per entry.
    #[default]
    Random,
    /// UUID v5 over the input file name and the entry ordinal, so reruns
    /// produce byte-identical bundles.
    Deterministic,
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Random => "random",
            Self::Deterministic => "deterministic",
        })
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "deterministic" => Ok(Self::Deterministic),
            other => Err(format!("unknown id strategy '{other}'")),
        }
    }
}

/// Hands out `urn:uuid:` URLs for the entries of one bundle.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    strategy: IdStrategy,
    scope: String,
    next: u64,
}

impl IdGenerator {
    /// `scope` is the input file name; it only matters for
    /// [`IdStrategy::Deterministic`].
    pub fn new(strategy: IdStrategy, scope: impl Into<String>) -> Self {
        Self {
            strategy,
            scope: scope.into(),
            next: 0,
        }
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    pub fn next_uuid(&mut self) -> Uuid {
        match self.strategy {
            IdStrategy::Random => Uuid::new_v4(),
            IdStrategy::Deterministic => {
                let ordinal = self.next;
                self.next += 1;
                let name = format!("{}#{ordinal}", self.scope);
                Uuid::new_v5(&BUNDLER_NAMESPACE, name.as_bytes())
            }
        }
    }

    pub fn next_full_url(&mut self) -> String {
        full_url(self.next_uuid())
    }

    /// The patient's `fullUrl`: the extract's patient id when it is a UUID,
    /// otherwise a generated one.
    pub fn patient_full_url(&mut self, patient_id: Option<&str>) -> String {
        match patient_id.and_then(|id| Uuid::parse_str(id.trim()).ok()) {
            Some(id) => full_url(id),
            None => self.next_full_url(),
        }
    }
}

pub fn full_url(id: Uuid) -> String {
    format!("urn:uuid:{id}")
}

/// Stable identifier for a patient's aggregated note of one type.
pub fn note_identifier(mrn: &str, note_type: &str) -> Uuid {
    Uuid::new_v5(&BUNDLER_NAMESPACE, format!("{mrn}:{note_type}").as_bytes())
}
