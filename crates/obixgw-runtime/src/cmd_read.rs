//! `obixgw read`: one-off read of a mapped point, for commissioning.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use obixgw_obix::ObixClient;

use crate::config_file::load_config;
use crate::poll_loop::read_mapped;

pub async fn cmd_read(config_path: &Path, remote_id: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mapping = config
        .find(remote_id)
        .with_context(|| format!("point {remote_id} is not in the mapping config"))?;

    let gateway = config.gateway_connection().clone();
    let reader = tokio::task::spawn_blocking(move || ObixClient::from_config(&gateway))
        .await?
        .context("invalid gateway_connection")?;

    let reading = read_mapped(&Arc::new(reader), mapping)
        .await
        .with_context(|| format!("failed to read {remote_id}"))?;

    let out = serde_json::json!({
        "remote_id": mapping.remote_id,
        "variable_name": mapping.variable_name,
        "variable_type": mapping.variable_type,
        "reading": reading,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
