use tfredis_plugin::ResourceData;

use crate::error::ProviderError;

pub(crate) fn required_str<'a>(
    data: &'a ResourceData,
    attribute: &str,
) -> Result<&'a str, ProviderError> {
    data.get_str(attribute)
        .ok_or_else(|| ProviderError::invalid_input(attribute, "a string value is required"))
}

/// A non-empty string, for attributes that become the tracked identity.
pub(crate) fn required_key<'a>(
    data: &'a ResourceData,
    attribute: &str,
) -> Result<&'a str, ProviderError> {
    let key = required_str(data, attribute)?;
    if key.is_empty() {
        return Err(ProviderError::invalid_input(attribute, "must not be empty"));
    }
    Ok(key)
}

/// An integer of at least 1, or `default` when unset.
pub(crate) fn positive_int(
    data: &ResourceData,
    attribute: &str,
    default: u64,
) -> Result<u64, ProviderError> {
    let Some(value) = data.get(attribute) else {
        return Ok(default);
    };
    match value.as_u64() {
        Some(n) if n >= 1 => Ok(n),
        Some(_) => Err(ProviderError::invalid_input(attribute, "must be at least 1")),
        None if value.is_i64() => Err(ProviderError::invalid_input(attribute, "must be at least 1")),
        None => Err(ProviderError::invalid_input(attribute, "must be an integer")),
    }
}
