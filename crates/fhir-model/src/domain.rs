use std::fmt;
use std::str::FromStr;

/// A named collection of domain records within a clinical extract.
///
/// Variants are declared in bundle processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClinicalDomain {
    Diagnoses,
    Assessments,
    Comorbidities,
    EncounterSchedules,
    Encounters,
    FamilyMemberHistory,
    Imagings,
    Labs,
    Medications,
    OtherDiagnoses,
    OtherProcedures,
    Vitals,
    Surgeries,
    MolecularSequencings,
    Radiotherapies,
}

impl ClinicalDomain {
    /// Every domain, in processing order.
    pub const ALL: [ClinicalDomain; 15] = [
        Self::Diagnoses,
        Self::Assessments,
        Self::Comorbidities,
        Self::EncounterSchedules,
        Self::Encounters,
        Self::FamilyMemberHistory,
        Self::Imagings,
        Self::Labs,
        Self::Medications,
        Self::OtherDiagnoses,
        Self::OtherProcedures,
        Self::Vitals,
        Self::Surgeries,
        Self::MolecularSequencings,
        Self::Radiotherapies,
    ];

    /// Collection key in the extract JSON.
    pub fn key(self) -> &'static str {
        match self {
            Self::Diagnoses => "diagnoses",
            Self::Assessments => "assessments",
            Self::Comorbidities => "comorbidities",
            Self::EncounterSchedules => "encounter_schedules",
            Self::Encounters => "encounters",
            Self::FamilyMemberHistory => "family_member_history",
            Self::Imagings => "imagings",
            Self::Labs => "labs",
            Self::Medications => "medications",
            Self::OtherDiagnoses => "other_diagnoses",
            Self::OtherProcedures => "other_procedures",
            Self::Vitals => "vitals",
            Self::Surgeries => "surgeries",
            Self::MolecularSequencings => "molecular_sequencings",
            Self::Radiotherapies => "radiotherapies",
        }
    }

    /// Resource types a record of this domain maps to.
    pub fn resource_types(self) -> &'static [&'static str] {
        match self {
            Self::Diagnoses | Self::Comorbidities | Self::OtherDiagnoses => &["Condition"],
            Self::Assessments | Self::Vitals => &["Observation"],
            Self::EncounterSchedules => &["Appointment"],
            Self::Encounters => &["Encounter"],
            Self::FamilyMemberHistory => &["FamilyMemberHistory"],
            Self::Imagings => &["DiagnosticReport"],
            Self::Labs => &["Observation", "DiagnosticReport"],
            Self::Medications => &["MedicationRequest", "MedicationAdministration"],
            Self::OtherProcedures | Self::Surgeries | Self::Radiotherapies => &["Procedure"],
            Self::MolecularSequencings => &["MolecularSequence", "Observation"],
        }
    }
}

impl fmt::Display for ClinicalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ClinicalDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|domain| domain.key() == key)
            .ok_or_else(|| format!("unknown clinical domain: {s}"))
    }
}
