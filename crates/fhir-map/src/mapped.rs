use fhir_model::Resource;

/// Output of mapping one domain record.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapped {
    /// A standalone resource.
    One(Resource),
    /// A pair where `referrer` must point at `target`'s bundle entry.
    ///
    /// The assembler appends `target` first and wires its `fullUrl` into
    /// `referrer` via [`Resource::link_to`].
    Linked { target: Resource, referrer: Resource },
}

impl Mapped {
    /// Number of bundle entries this output produces.
    pub fn entry_count(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Linked { .. } => 2,
        }
    }

    /// Resources in the order they are appended to the bundle.
    pub fn resources(&self) -> Vec<&Resource> {
        match self {
            Self::One(resource) => vec![resource],
            Self::Linked { target, referrer } => vec![target, referrer],
        }
    }
}
