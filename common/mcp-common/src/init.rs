//! Tracing setup for MCP servers
//!
//! stdout carries the MCP protocol, so all log output goes to stderr.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for an MCP server crate
///
/// The filter comes from `RUST_LOG` when it is set; otherwise the crate
/// logs at `default_level` and everything else at `warn`.
/// `LOG_FORMAT=json` switches to JSON lines for log aggregation.
///
/// Fails if a global subscriber is already installed or the directive
/// built from `crate_name` / `default_level` does not parse.
///
/// # Example
///
/// ```rust,ignore
/// mcp_common::init_tracing("sqlite_mcp", "info")?;
/// ```
pub fn init_tracing(crate_name: &str, default_level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn").add_directive(directive(crate_name, default_level).parse()?),
    };

    let registry = tracing_subscriber::registry().with(filter);

    if json_requested() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

fn directive(crate_name: &str, level: &str) -> String {
    format!("{}={}", crate_name.replace('-', "_"), level)
}

fn json_requested() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
