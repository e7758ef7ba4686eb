//! Payment allocation planning.
//!
//! Every call site that applies funds to obligations (cash payments, direct
//! credit application, composite bill payments) goes through the single
//! composition step in this module. The plan decides which funding source
//! covers which obligation by how much; executing the plan against storage
//! lives in the database layer.

pub mod error;
pub mod plan;

#[cfg(test)]
mod plan_props;

pub use error::AllocationError;
pub use plan::{
    compose_plan, AllocationPlan, AllocationRequest, FundingSource, ObligationTarget,
    PlannedApplication,
};
