//! Test modules for the crate

#[cfg(test)]
pub mod framework;


#[cfg(test)]
mod linkage_tests;
