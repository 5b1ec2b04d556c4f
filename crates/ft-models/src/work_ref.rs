//! Project / plant work reference.
//!
//! A time period refers to exactly one of {project, plant}; the enum makes
//! the mutual exclusivity unrepresentable. References captured by logical
//! code must be resolved to durable identifiers before remote submission.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a time period was worked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ref")]
pub enum WorkRef {
    Project(RefSource),
    Plant(RefSource),
}

/// A reference either already resolved to a durable id, or captured as a
/// logical code (e.g. a job number or a fleet number painted on the
/// machine) that needs resolution against the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", untagged)]
pub enum RefSource {
    Id(Uuid),
    Code(String),
}

/// Reference kind, for resolution requests and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Project,
    Plant,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Plant => "plant",
        }
    }
}

impl WorkRef {
    pub fn kind(&self) -> RefKind {
        match self {
            Self::Project(_) => RefKind::Project,
            Self::Plant(_) => RefKind::Plant,
        }
    }

    pub fn source(&self) -> &RefSource {
        match self {
            Self::Project(s) | Self::Plant(s) => s,
        }
    }

    /// The durable id, if already resolved.
    pub fn resolved_id(&self) -> Option<Uuid> {
        match self.source() {
            RefSource::Id(id) => Some(*id),
            RefSource::Code(_) => None,
        }
    }

    /// Replace the source with a resolved id, keeping the kind.
    pub fn with_id(&self, id: Uuid) -> Self {
        match self {
            Self::Project(_) => Self::Project(RefSource::Id(id)),
            Self::Plant(_) => Self::Plant(RefSource::Id(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_resolves_to_id_keeping_kind() {
        let r = WorkRef::Plant(RefSource::Code("100".into()));
        assert_eq!(r.kind(), RefKind::Plant);
        assert_eq!(r.resolved_id(), None);

        let id = Uuid::new_v4();
        let resolved = r.with_id(id);
        assert_eq!(resolved.kind(), RefKind::Plant);
        assert_eq!(resolved.resolved_id(), Some(id));
    }
}
