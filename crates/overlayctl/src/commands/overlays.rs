use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use overlay_core::OverlayConfig;
use overlay_state::OverlayStore;

/// Declare (or replace) overlay `name` from the JSON body at `path`.
pub fn add(store: &impl OverlayStore, name: &str, path: &Path) -> anyhow::Result<()> {
    let config = OverlayConfig::from_file(path)
        .with_context(|| format!("failed to load overlay body from {}", path.display()))?;
    store.put(name, &config)?;

    info!(
        %name,
        members = config.members().len(),
        validators = config.has_validators_wildcard(),
        "custom overlay declared"
    );
    Ok(())
}

pub fn list(store: &impl OverlayStore, out: &mut impl Write) -> anyhow::Result<()> {
    let overlays = store.get_all()?;
    if overlays.is_empty() {
        writeln!(out, "No custom overlays")?;
        return Ok(());
    }

    for (name, config) in &overlays {
        writeln!(out, "Custom overlay {name}:")?;
        writeln!(out, "{}", config.to_json_pretty()?)?;
    }
    Ok(())
}

pub fn delete(store: &impl OverlayStore, name: &str) -> anyhow::Result<()> {
    store.delete(name)?;
    info!(%name, "custom overlay deleted");
    Ok(())
}
