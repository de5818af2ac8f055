pub mod cargo_env {
    pub const CARGO_PKG_NAME: &'static str = env!("CARGO_PKG_NAME");
}

pub mod common {
    /// Engine name used both as the engine filter and the root id segment.
    pub const ENGINE_ID: &'static str = "testrelay";
    pub const DEFAULT_SHELL: &'static str = "sh -c";
    pub const ENV_PREFIX: &'static str = "TESTRELAY";
    pub const DEFAULT_THREADS: usize = 1;
}
