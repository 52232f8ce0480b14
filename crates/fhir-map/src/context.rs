use fhir_codes::{CodeLookup, ProcedureCodeTable};
use fhir_model::Reference;

/// Read-only inputs shared by every mapper call for one patient.
#[derive(Debug, Clone, Copy)]
pub struct MappingContext<'a> {
    /// `fullUrl` of the patient entry.
    pub subject: &'a str,
    pub codes: &'a CodeLookup,
    pub procedures: &'a ProcedureCodeTable,
}

impl<'a> MappingContext<'a> {
    pub fn new(
        subject: &'a str,
        codes: &'a CodeLookup,
        procedures: &'a ProcedureCodeTable,
    ) -> Self {
        Self {
            subject,
            codes,
            procedures,
        }
    }

    pub fn subject_reference(&self) -> Reference {
        Reference::to(self.subject)
    }

    /// Subject reference labelled for display, as used by scheduling and
    /// history resources.
    pub fn patient_reference(&self) -> Reference {
        Reference::to(self.subject).with_display("Patient")
    }

    /// Description from the code list, falling back to the source name.
    pub fn describe(&self, code: Option<&str>, name: Option<String>) -> Option<String> {
        code.and_then(|code| self.codes.get(code))
            .map(str::to_string)
            .or(name)
    }

    /// Procedure name: procedure table, then code list, then source name.
    ///
    /// The code and then the name are tried as keys in each table.
    pub fn procedure_name(&self, code: Option<&str>, name: Option<&str>) -> Option<String> {
        let keys = || code.into_iter().chain(name);
        keys()
            .find_map(|key| self.procedures.get(key))
            .or_else(|| keys().find_map(|key| self.codes.get(key)))
            .map(str::to_string)
            .or_else(|| name.map(str::to_string))
    }
}
