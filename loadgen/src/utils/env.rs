pub const fn project_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

/// Identifier used as `User-Agent` by the load generator client
/// and as `Server` header by the mock log sink.
pub const fn network_service_identifier() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}
