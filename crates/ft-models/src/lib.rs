//! # ft-models
//!
//! Domain entities for fieldtime: the `TimePeriod` aggregate, its owned
//! child collections, the three-stage approval workflow, and actor roles.

pub mod actor;
pub mod children;
pub mod status;
pub mod time_period;
pub mod work_ref;

pub use actor::*;
pub use children::*;
pub use status::*;
pub use time_period::*;
pub use work_ref::*;
