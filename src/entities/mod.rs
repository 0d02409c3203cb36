//! Entity-level fetch workflows used by the CLI.

pub(crate) mod pathway;
