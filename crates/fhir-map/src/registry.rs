//! Mapper trait and registry.
//!
//! Every [`ClinicalDomain`] has one [`ResourceMapper`] registered in the
//! [`MapperRegistry`]. Mappers are pure: the same record and context always
//! yield the same resources, and no identifiers are generated here.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use fhir_model::{ClinicalDomain, DomainRecord};
use tracing::debug;

use crate::context::MappingContext;
use crate::mapped::Mapped;
use crate::mappers;

/// Converts one domain record into FHIR resources.
pub trait ResourceMapper: Send + Sync {
    /// The domain this mapper handles.
    fn domain(&self) -> ClinicalDomain;

    /// Returns a human-readable description of the mapper.
    fn description(&self) -> &'static str {
        "Resource mapper"
    }

    /// Maps a single record for the patient in `context`.
    fn map(&self, record: &DomainRecord, context: &MappingContext<'_>) -> Mapped;
}

/// Registry of mappers indexed by domain.
///
/// The default registry is cached using [`OnceLock`] and shared across
/// worker tasks.
pub struct MapperRegistry {
    mappers: BTreeMap<ClinicalDomain, Box<dyn ResourceMapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self {
            mappers: BTreeMap::new(),
        }
    }

    /// Registers a mapper for its domain, replacing any previous one.
    pub fn register(&mut self, mapper: Box<dyn ResourceMapper>) {
        self.mappers.insert(mapper.domain(), mapper);
    }

    pub fn get(&self, domain: ClinicalDomain) -> Option<&dyn ResourceMapper> {
        self.mappers.get(&domain).map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Registered domains in processing order.
    pub fn domains(&self) -> impl Iterator<Item = ClinicalDomain> + '_ {
        self.mappers.keys().copied()
    }

    /// Maps every record of a collection, preserving record order.
    ///
    /// Domains without a registered mapper produce nothing.
    pub fn map_records(
        &self,
        domain: ClinicalDomain,
        records: &[DomainRecord],
        context: &MappingContext<'_>,
    ) -> Vec<Mapped> {
        let Some(mapper) = self.get(domain) else {
            debug!(domain = %domain, "no mapper registered; skipping collection");
            return Vec::new();
        };
        records
            .iter()
            .map(|record| mapper.map(record, context))
            .collect()
    }
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("domains", &self.mappers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        build_default_registry()
    }
}

/// Cached default registry with every domain mapper.
static DEFAULT_REGISTRY: OnceLock<MapperRegistry> = OnceLock::new();

/// Returns the default mapper registry.
pub fn default_registry() -> &'static MapperRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

/// Builds a registry with a mapper for every [`ClinicalDomain`].
pub fn build_default_registry() -> MapperRegistry {
    let mut registry = MapperRegistry::new();

    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Diagnoses,
        "Diagnoses to Condition",
        mappers::diagnosis::map_diagnosis,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Assessments,
        "Assessments to Observation",
        mappers::assessment::map_assessment,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Comorbidities,
        "Comorbidities to Condition",
        mappers::comorbidity::map_comorbidity,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::EncounterSchedules,
        "Encounter schedules to Appointment",
        mappers::appointment::map_encounter_schedule,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Encounters,
        "Encounters to Encounter",
        mappers::encounter::map_encounter,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::FamilyMemberHistory,
        "Family member history to FamilyMemberHistory",
        mappers::family_history::map_family_member_history,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Imagings,
        "Imaging to DiagnosticReport",
        mappers::imaging::map_imaging,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Labs,
        "Labs to Observation and DiagnosticReport",
        mappers::lab::map_lab,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Medications,
        "Medications to MedicationRequest or MedicationAdministration",
        mappers::medication::map_medication,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::OtherDiagnoses,
        "Other diagnoses to Condition",
        mappers::diagnosis::map_other_diagnosis,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::OtherProcedures,
        "Other procedures to Procedure",
        mappers::procedure::map_other_procedure,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Vitals,
        "Vitals to Observation",
        mappers::vitals::map_vitals,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Surgeries,
        "Surgeries to Procedure",
        mappers::procedure::map_surgery,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::MolecularSequencings,
        "Molecular sequencing to MolecularSequence and Observation",
        mappers::molecular::map_molecular_sequencing,
    )));
    registry.register(Box::new(FunctionMapper::new(
        ClinicalDomain::Radiotherapies,
        "Radiotherapy to Procedure",
        mappers::radiotherapy::map_radiotherapy,
    )));

    registry
}

type MapFn = fn(&DomainRecord, &MappingContext<'_>) -> Mapped;

/// Adapts a mapping function to the [`ResourceMapper`] trait.
struct FunctionMapper {
    domain: ClinicalDomain,
    description: &'static str,
    map_fn: MapFn,
}

impl FunctionMapper {
    fn new(domain: ClinicalDomain, description: &'static str, map_fn: MapFn) -> Self {
        Self {
            domain,
            description,
            map_fn,
        }
    }
}

impl ResourceMapper for FunctionMapper {
    fn domain(&self) -> ClinicalDomain {
        self.domain
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn map(&self, record: &DomainRecord, context: &MappingContext<'_>) -> Mapped {
        (self.map_fn)(record, context)
    }
}
