use serde::Serialize;

use crate::error::OmicsBrowseError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, OmicsBrowseError> {
    Ok(serde_json::to_string_pretty(value)?)
}
