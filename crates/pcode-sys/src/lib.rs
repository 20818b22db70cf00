//! This crate is the raw boundary between the p-code translation layer and a
//! [SLEIGH](https://github.com/NationalSecurityAgency/ghidra) decode engine. It holds the numeric
//! code tables shared with the engine, the raw structures a decode produces, and the traits an
//! engine binding implements. It is not recommended to depend on this crate directly unless you
//! are adding a binding for a decode engine.

pub mod api;
pub mod sys;
