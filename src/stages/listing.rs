// src/stages/listing.rs

//! Third-party directory-listing tool support: copy its asset tree into
//! the output root, then patch its JSON configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use tracing::{error, info};

use crate::config::ListingConfig;
use crate::stages::StageContext;

fn listing_config(ctx: &StageContext) -> Result<&ListingConfig> {
    ctx.manifest
        .listing
        .as_ref()
        .ok_or_else(|| anyhow!("no listing tool configured"))
}

fn listing_out_dir(ctx: &StageContext) -> Result<PathBuf> {
    let dist = ctx
        .globs
        .listing_dist()
        .ok_or_else(|| anyhow!("no listing tool configured"))?;
    Ok(ctx.abs(dist))
}

/// Copy the listing tool's tree verbatim, dotfiles included.
pub fn run_copy(ctx: &StageContext) -> Result<()> {
    let listing = listing_config(ctx)?;
    let from = ctx.abs(&listing.source);
    let to = listing_out_dir(ctx)?;

    if !ctx.fs.is_dir(&from) {
        bail!("listing source {} is not a directory", from.display());
    }

    let copied = copy_tree(ctx, &from, &to)?;
    info!(from = %from.display(), to = %to.display(), copied, "listing assets copied");
    Ok(())
}

fn copy_tree(ctx: &StageContext, from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in ctx.fs.read_dir(from)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let target = to.join(name);
        if ctx.fs.is_dir(&entry) {
            copied += copy_tree(ctx, &entry, &target)?;
        } else {
            ctx.copy_preserving_mtime(&entry, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Merge the configured overrides into the copied tool configuration.
///
/// The file may carry comments; it is parsed as JSON5 and written back as
/// plain pretty-printed JSON. An unparsable file is logged and left as is.
pub fn run_config(ctx: &StageContext) -> Result<()> {
    let listing = listing_config(ctx)?;
    let path = listing_out_dir(ctx)?
        .join(&listing.config_dir)
        .join(&listing.config_file);

    let text = ctx
        .fs
        .read_to_string(&path)
        .with_context(|| format!("reading listing config {}", path.display()))?;

    let mut config: Value = match json5::from_str(&text) {
        Ok(v) => v,
        Err(err) => {
            error!(file = %path.display(), error = %err, "listing config is not valid JSON5; left untouched");
            return Ok(());
        }
    };

    deep_merge(&mut config, &listing.config_overrides);

    let mut out = serde_json::to_string_pretty(&config).context("serializing listing config")?;
    out.push('\n');
    ctx.fs.write(&path, out.as_bytes())?;
    info!(file = %path.display(), "listing config patched");
    Ok(())
}

/// Merge `patch` into `base`: objects merge key by key, recursively; any
/// other patch value replaces the base value.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_merge_recursively() {
        let mut base = json!({
            "view": { "binary": false, "hidden": ["a"], "mode": "details" },
            "search": { "enabled": true }
        });
        let patch = json!({
            "view": { "binary": true, "hidden": ["b", "c"] },
            "extra": 1
        });

        deep_merge(&mut base, &patch);

        assert_eq!(
            base,
            json!({
                "view": { "binary": true, "hidden": ["b", "c"], "mode": "details" },
                "search": { "enabled": true },
                "extra": 1
            })
        );
    }

    #[test]
    fn non_object_patch_replaces() {
        let mut base = json!({ "a": { "b": 1 } });
        deep_merge(&mut base, &json!({ "a": null }));
        assert_eq!(base, json!({ "a": null }));
    }

    #[test]
    fn json5_comments_parse() {
        let text = "/* header */\n{\n  // line\n  \"a\": 1,\n}\n";
        let value: Value = json5::from_str(text).unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }
}
