//! Machine-readable record of completed deployments.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::orchestrator::DeploymentReport;

/// Where and under which key a run is recorded.
#[derive(Clone, Debug)]
pub struct RecordTarget<'a> {
    pub path: &'a Path,
    pub network: &'a str,
    pub contract_key: &'a str,
    pub rpc_url: &'a str,
}

/// Insert or replace `report` under `deployments.<contract_key>`, keeping other entries.
pub fn write_deployment_record(target: &RecordTarget<'_>, report: &DeploymentReport) -> Result<()> {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let existing = if target.path.exists() {
        fs::read_to_string(target.path)
            .with_context(|| format!("failed reading {}", target.path.display()))?
    } else {
        String::new()
    };

    let mut root: Value = if existing.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&existing)
            .with_context(|| format!("failed parsing JSON in {}", target.path.display()))?
    };

    if !root.is_object() {
        root = json!({});
    }

    root["network"] = json!(target.network);
    root["updated_at"] = json!(now);

    if root.get("deployments").and_then(Value::as_object).is_none() {
        root["deployments"] = json!({});
    }

    root["deployments"][target.contract_key] = json!({
        "address": format!("{}", report.deployed),
        "predicted_address": format!("{}", report.predicted),
        "deployer": format!("{}", report.account),
        "approval": {
            "nonce": report.approval_nonce,
            "tx_hash": format!("{}", report.approval_tx),
        },
        "deployment": {
            "nonce": report.deployment_nonce,
            "tx_hash": format!("{}", report.deployment_tx),
        },
        "rpc_url": target.rpc_url,
        "deployed_at": now,
    });

    let serialised =
        serde_json::to_vec_pretty(&root).context("failed serialising deployment record")?;
    replace_file(target.path, &serialised)
}

/// Replace `path` by renaming a fully written, synced sibling over it.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("failed creating {}", dir.display()))?;
    }

    let staging = staging_path(path)?;
    let mut file = File::create(&staging)
        .with_context(|| format!("failed creating {}", staging.display()))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .with_context(|| format!("failed writing {}", staging.display()))?;
    drop(file);

    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(err)
            .with_context(|| format!("failed moving record into place at {}", path.display()));
    }
    Ok(())
}

/// Hidden sibling of `path`, so a partial write is never mistaken for a record.
fn staging_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("{} does not name a file", path.display()))?;
    let mut staged = std::ffi::OsString::from(".");
    staged.push(name);
    staged.push(".partial");
    Ok(path.with_file_name(staged))
}
