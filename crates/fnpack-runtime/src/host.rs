//! Facts about the invoking host.

use fnpack_schema::Architecture;

/// Safe wrapper around libc::getuid().
#[allow(unsafe_code)]
pub fn current_uid() -> u32 {
    // SAFETY: getuid() is always safe: no arguments, no side effects, cannot fail.
    unsafe { libc::getuid() }
}

/// Safe wrapper around libc::getgid().
#[allow(unsafe_code)]
pub fn current_gid() -> u32 {
    // SAFETY: getgid() is always safe: no arguments, no side effects, cannot fail.
    unsafe { libc::getgid() }
}

/// Container platform to force when the host cannot run `target` images
/// natively. `None` means the host architecture already matches, or is
/// unknown and left to the container engine.
pub fn platform_override(host: Option<Architecture>, target: Architecture) -> Option<&'static str> {
    match host {
        Some(h) if h != target => Some(target.container_platform()),
        _ => None,
    }
}
