//! Listener configuration for the HTTP surface.
//!
//! `PAYPOINT_BIND` takes a full socket address; otherwise `PORT` picks the port on all
//! interfaces, defaulting to 4000.

const DEFAULT_PORT: &str = "4000";

/// Resolves the address the HTTP server binds to.
#[must_use]
pub fn bind_address() -> String {
    resolve_bind_address(
        std::env::var("PAYPOINT_BIND").ok(),
        std::env::var("PORT").ok(),
    )
}

fn resolve_bind_address(bind: Option<String>, port: Option<String>) -> String {
    bind.filter(|b| !b.trim().is_empty()).unwrap_or_else(|| {
        let port = port
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PORT.to_string());
        format!("0.0.0.0:{}", port.trim())
    })
}
