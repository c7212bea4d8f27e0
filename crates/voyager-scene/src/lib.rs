//! Scene graph side of a document: models showing one derivative each, and
//! the scene collecting them.

pub mod model;
pub mod scene;

pub use model::{Model, ModelError};
pub use scene::Scene;
