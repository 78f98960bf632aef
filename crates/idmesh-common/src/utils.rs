//! Utility functions for idmesh
//!
//! Common helper functions used across the codebase.

use if_addrs::IfAddr;

/// Get the local IP address
///
/// Returns the first non-loopback IPv4 address found,
/// or "127.0.0.1" as fallback.
///
/// # Examples
///
/// ```
/// use idmesh_common::local_ip;
///
/// let ip = local_ip();
/// assert!(!ip.is_empty());
/// ```
pub fn local_ip() -> String {
    if_addrs::get_if_addrs()
        .ok()
        .and_then(|addrs| {
            addrs
                .into_iter()
                .find(|iface| !iface.is_loopback() && matches!(iface.addr, IfAddr::V4(_)))
                .and_then(|iface| match iface.addr {
                    IfAddr::V4(addr) => Some(addr.ip.to_string()),
                    _ => None,
                })
        })
        .unwrap_or_else(|| "127.0.0.1".to_string())
}
