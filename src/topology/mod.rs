//! Mesh metadata: handles, compute steps, element groups, families,
//! profiles, and the model root.

pub mod cache;
pub mod element;
pub mod family;
pub mod ids;
pub mod mesh;
pub mod profile;
pub mod step;
