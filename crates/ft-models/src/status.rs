//! Approval workflow status.
//!
//! A submitted time period occupies exactly one of three states and only
//! moves forward. There is no draft and no rejected state: rejection is
//! expressed by a reviewer editing the record at its current stage, with a
//! revision record explaining the change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::ActorRole;

/// Workflow state of a submitted time period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Initial state, set at creation.
    Submitted,
    /// Approved by a supervisor.
    SupervisorApproved,
    /// Approved by an admin. Terminal: correcting a record past this point
    /// is an unresolved product decision, not a supported transition.
    AdminApproved,
}

/// Approval role context in effect when a change is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    User,
    Supervisor,
    Admin,
}

/// Rejected workflow transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("transition {from:?} -> {to:?} is not part of the workflow")]
    NotForward {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
    #[error("role {role:?} may not perform {from:?} -> {to:?}")]
    RoleNotPermitted {
        role: ActorRole,
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
    #[error("{0:?} is terminal")]
    Terminal(WorkflowStatus),
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::SupervisorApproved => "supervisor_approved",
            Self::AdminApproved => "admin_approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(Self::Submitted),
            "supervisor_approved" => Some(Self::SupervisorApproved),
            "admin_approved" => Some(Self::AdminApproved),
            _ => None,
        }
    }

    /// The single next stage, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Submitted => Some(Self::SupervisorApproved),
            Self::SupervisorApproved => Some(Self::AdminApproved),
            Self::AdminApproved => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Role required to perform `from -> to`, when the transition exists.
    pub fn required_role(from: Self, to: Self) -> Option<ActorRole> {
        match (from, to) {
            (Self::Submitted, Self::SupervisorApproved) => Some(ActorRole::Supervisor),
            (Self::SupervisorApproved, Self::AdminApproved) => Some(ActorRole::Admin),
            _ => None,
        }
    }

    /// Validate a requested transition for the acting role.
    ///
    /// Transitions may only move forward one stage; backward transitions
    /// and stage skips are never legal regardless of role.
    pub fn check_transition(from: Self, to: Self, role: ActorRole) -> Result<(), TransitionError> {
        if from.is_terminal() {
            return Err(TransitionError::Terminal(from));
        }
        match Self::required_role(from, to) {
            Some(required) if required == role => Ok(()),
            Some(_) => Err(TransitionError::RoleNotPermitted { role, from, to }),
            None => Err(TransitionError::NotForward { from, to }),
        }
    }

    /// Whether an actor may mutate fields while the record is in this state.
    ///
    /// The owner edits their own record while it is `submitted`; a
    /// supervisor edits during the first review stage; an admin edits
    /// during the second. Nobody edits a terminal record.
    pub fn may_edit(&self, role: ActorRole, is_owner: bool) -> bool {
        match self {
            Self::Submitted => match role {
                ActorRole::Worker => is_owner,
                ActorRole::Supervisor => true,
                ActorRole::Admin => false,
            },
            Self::SupervisorApproved => role == ActorRole::Admin,
            Self::AdminApproved => false,
        }
    }
}
