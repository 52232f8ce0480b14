//! Per-domain mapping of extract records to FHIR resources.
//!
//! Each [`fhir_model::ClinicalDomain`] has one pure mapping function,
//! registered behind the [`ResourceMapper`] trait in a [`MapperRegistry`].
//! Mappers never generate identifiers; every subject reference comes from
//! the [`MappingContext`], and linked pairs are returned as
//! [`Mapped::Linked`] so the assembler can wire the reference once both
//! entries have a `fullUrl`.

pub mod context;
pub mod fields;
pub mod mapped;
pub mod mappers;
pub mod registry;

pub use context::MappingContext;
pub use mapped::Mapped;
pub use mappers::patient::map_patient;
pub use registry::{MapperRegistry, ResourceMapper, build_default_registry, default_registry};
