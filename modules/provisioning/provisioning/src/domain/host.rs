use std::net::IpAddr;

use provisioning_sdk::{HostResolver, ProvisioningError};

const MAX_HOST_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Network identity obtained for a node address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub ip: IpAddr,
    pub host_name: String,
}

/// Checks that `name` is a syntactically valid DNS host name.
///
/// # Errors
/// Returns `HostResolution` describing the first violation found.
pub fn validate_host_name(name: &str) -> Result<(), ProvisioningError> {
    if name.is_empty() {
        return Err(ProvisioningError::host_resolution(name, "empty host name"));
    }
    if name.len() > MAX_HOST_NAME_LEN {
        return Err(ProvisioningError::host_resolution(
            name,
            format!("host name longer than {MAX_HOST_NAME_LEN} characters"),
        ));
    }

    let fqdn = name.strip_suffix('.').unwrap_or(name);
    for label in fqdn.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(ProvisioningError::host_resolution(
                name,
                format!("label '{label}' must be 1..={MAX_LABEL_LEN} characters"),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ProvisioningError::host_resolution(
                name,
                format!("label '{label}' starts or ends with a hyphen"),
            ));
        }
        if let Some(c) = label
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ProvisioningError::host_resolution(
                name,
                format!("invalid character {c:?}"),
            ));
        }
    }
    Ok(())
}

/// Picks the address a node is reached at: the first IPv4 answer, otherwise
/// the first answer.
#[must_use]
pub fn pick_address(ips: &[IpAddr]) -> Option<IpAddr> {
    ips.iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| ips.first())
        .copied()
}

/// Resolves a node address that is either a literal IP or a host name.
///
/// A literal IP keeps its value and gets its name from a reverse lookup,
/// then `fallback_name`, then the literal itself. A host name keeps the name
/// and gets its IP from a forward lookup.
///
/// # Errors
/// Returns `HostResolution` for malformed names, failed lookups and empty
/// answers.
pub async fn resolve_address(
    resolver: &dyn HostResolver,
    target: &str,
    fallback_name: Option<&str>,
) -> Result<ResolvedAddress, ProvisioningError> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        let host_name = resolver
            .reverse_lookup(ip)
            .await?
            .or_else(|| fallback_name.map(ToOwned::to_owned))
            .unwrap_or_else(|| ip.to_string());
        return Ok(ResolvedAddress { ip, host_name });
    }

    validate_host_name(target)?;
    let ips = resolver.lookup_host(target).await?;
    let ip = pick_address(&ips)
        .ok_or_else(|| ProvisioningError::host_resolution(target, "no addresses returned"))?;

    Ok(ResolvedAddress {
        ip,
        host_name: target.to_owned(),
    })
}
