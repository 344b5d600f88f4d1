pub mod cli;
pub(crate) mod command;
pub(crate) mod ops;
