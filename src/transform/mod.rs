//! Transform adapters from backend wire shapes into table-facing records.

pub(crate) mod pathway;
