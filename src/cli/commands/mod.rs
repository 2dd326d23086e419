//! CLI command implementations.

mod doctor;
mod prune;
mod render;
mod run;

pub use doctor::run_doctor;
pub use prune::run_prune;
pub use render::run_render;
pub use run::run_pipeline;
