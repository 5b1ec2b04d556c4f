//! Actors and roles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::WorkflowStage;

/// Role of an actor interacting with the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Field worker who owns their own time periods.
    Worker,
    /// First approval stage reviewer.
    Supervisor,
    /// Final approval stage reviewer.
    Admin,
}

/// An authenticated actor. Authentication itself is an external
/// collaborator; the core only carries identity and role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }

    /// The workflow stage tag recorded on revisions made by this actor.
    pub fn stage(&self) -> WorkflowStage {
        match self.role {
            ActorRole::Worker => WorkflowStage::User,
            ActorRole::Supervisor => WorkflowStage::Supervisor,
            ActorRole::Admin => WorkflowStage::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_maps_to_stage() {
        let actor = Actor::new(Uuid::new_v4(), ActorRole::Supervisor);
        assert_eq!(actor.stage(), WorkflowStage::Supervisor);
    }
}
