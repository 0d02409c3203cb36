//! Output rendering: markdown for terminals, pretty JSON for pipes.

pub(crate) mod json;
pub(crate) mod markdown;
