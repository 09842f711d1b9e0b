//! Pure helpers shared by the runtime and front ends.

pub mod validation;
