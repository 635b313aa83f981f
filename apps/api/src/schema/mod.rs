//! The schema core: everything between an untrusted document and a
//! committed, renderable section tree.

pub mod adjust;
pub mod baseline;
pub mod dedupe;
pub mod handlers;
pub mod materialize;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod removal;
pub mod validate;
