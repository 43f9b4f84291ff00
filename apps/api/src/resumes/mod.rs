// Resume CRUD. Every path that binds a resume to a template goes through the
// entitlement evaluator before anything is written.

pub mod handlers;
pub mod service;
pub mod store;
