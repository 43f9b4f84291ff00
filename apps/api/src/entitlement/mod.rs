// Template entitlement: which templates a user may build resumes from, and the
// ledger of free templates already granted to them.

pub mod evaluator;
pub mod handlers;
pub mod ledger;

#[cfg(test)]
pub mod memory;
