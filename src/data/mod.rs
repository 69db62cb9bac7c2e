//! Field data: storage model, localizations, and the field mapper.

pub mod field;
pub mod localization;
pub mod mapper;
