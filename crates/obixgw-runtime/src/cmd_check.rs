//! `obixgw check`: validate the config and print what would be polled.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use obixgw_core::MappingConfig;
use obixgw_obix::GatewayConnection;

use crate::config_file::load_config;

pub fn cmd_check(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let connection = GatewayConnection::from_value(config.gateway_connection())
        .context("invalid gateway_connection")?;
    print!("{}", format_summary(&config, &connection));
    Ok(())
}

fn format_summary(config: &MappingConfig, connection: &GatewayConnection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "gateway: {} (node {}, device {})",
        connection.host, connection.node_id, connection.device_id
    );
    let _ = writeln!(out, "poll interval: {}s", config.poll_interval_seconds());
    let _ = writeln!(out, "{} point(s):", config.len());
    for m in config {
        let mut policy = String::new();
        if m.variable_type.is_numeric() {
            let _ = write!(policy, " delta={}", m.significant_change);
        }
        if m.ttl_seconds > 0 {
            let _ = write!(policy, " ttl={}s", m.ttl_seconds);
        }
        if let Some(bounds) = m.bounds {
            let side = |b: Option<f64>| b.map_or_else(|| "*".to_string(), |v| v.to_string());
            let _ = write!(policy, " bounds=[{}, {}]", side(bounds.min), side(bounds.max));
        }
        let _ = writeln!(
            out,
            "  {:<16} -> {:<24} {}{}",
            m.remote_id, m.variable_name, m.variable_type, policy
        );
    }
    out
}
