//! Oracle connect descriptor built from discrete connection fields

use crate::config::ConnectionParams;
use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 1521;

/// Formats a descriptor, clauses for absent (or empty) fields are left out
pub fn descriptor(
    address: Option<&str>,
    port: Option<u16>,
    service: Option<&str>,
    sid: Option<&str>,
) -> String {
    let clause = |name: &str, value: Option<&str>| {
        value
            .filter(|v| !v.is_empty())
            .map(|v| format!("({name}={v})"))
            .unwrap_or_default()
    };
    format!(
        "(DESCRIPTION= (ADDRESS= (PROTOCOL=TCP){}(PORT={})) (CONNECT_DATA= (SERVER=dedicated){}{}))",
        clause("HOST", address),
        port.unwrap_or(DEFAULT_PORT),
        clause("SERVICE_NAME", service),
        clause("SID", sid),
    )
}

/// Connect string for `params`: the supplied dsn verbatim, or a descriptor built from its fields
///
/// User and password are required either way. Without a dsn the address and at least one of
/// service or sid must be set.
pub fn connect_string(params: &ConnectionParams) -> Result<String> {
    params.credentials()?;
    if let Some(dsn) = params.dsn.as_deref() {
        return Ok(dsn.to_string());
    }
    let present = |v: &Option<String>| v.as_deref().is_some_and(|v| !v.is_empty());
    if !present(&params.address) {
        return Err(Error::config("address is not set and no dsn was given"));
    }
    if !present(&params.service) && !present(&params.sid) {
        return Err(Error::config("either service or sid must be set"));
    }
    Ok(descriptor(
        params.address.as_deref(),
        params.port,
        params.service.as_deref(),
        params.sid.as_deref(),
    ))
}
