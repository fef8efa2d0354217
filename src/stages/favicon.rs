// src/stages/favicon.rs

//! Favicon set generation.
//!
//! The single favicon source is decoded once and resized into the usual
//! browser, Apple and Android variants. A web app manifest and a markup
//! snippet (`favicons.html`) referencing every variant are written next to
//! them, so pages can pull the snippet in with
//! `%%include('favicons/favicons.html')`.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::FaviconOptions;
use crate::stages::StageContext;
use crate::types::Category;

/// Generated snippet inlined into pages by the markup stage.
pub const SNIPPET_FILE: &str = "favicons.html";
pub const MANIFEST_FILE: &str = "manifest.webmanifest";
/// Public URL prefix of the generated files.
pub const PUBLIC_PATH: &str = "/favicons/";

const ICO_SIZE: u32 = 32;

/// PNG variants: file name, edge length, `rel` of the snippet link (if any).
const PNG_VARIANTS: &[(&str, u32, Option<&str>)] = &[
    ("favicon-16x16.png", 16, Some("icon")),
    ("favicon-32x32.png", 32, Some("icon")),
    ("favicon-48x48.png", 48, Some("icon")),
    ("apple-touch-icon.png", 180, Some("apple-touch-icon")),
    ("android-chrome-192x192.png", 192, None),
    ("android-chrome-512x512.png", 512, None),
];

pub fn run(ctx: &StageContext) -> Result<()> {
    let sources = ctx.collect_sources(ctx.globs.source(Category::Favicon))?;
    let Some(source) = sources.first() else {
        warn!("favicon source not found; nothing generated");
        return Ok(());
    };

    let bytes = ctx.fs.read(source)?;
    let icon = match image::load_from_memory(&bytes) {
        Ok(icon) => icon,
        Err(err) => {
            error!(file = %source.display(), error = %err, "favicon decode failed; nothing generated");
            return Ok(());
        }
    };

    let out_dir = ctx.abs(ctx.globs.favicon_dist());
    let version = ctx.manifest.version.as_deref();

    write_image(ctx, &out_dir.join("favicon.ico"), &icon, ICO_SIZE, ImageFormat::Ico)?;
    for (name, size, _) in PNG_VARIANTS {
        write_image(ctx, &out_dir.join(name), &icon, *size, ImageFormat::Png)?;
    }

    let manifest = web_manifest(&ctx.manifest.favicon_config, version);
    let mut manifest_json =
        serde_json::to_string_pretty(&manifest).context("serializing web manifest")?;
    manifest_json.push('\n');
    ctx.fs
        .write(&out_dir.join(MANIFEST_FILE), manifest_json.as_bytes())?;

    ctx.fs.write(
        &out_dir.join(SNIPPET_FILE),
        snippet(&ctx.manifest.favicon_config, version).as_bytes(),
    )?;

    info!(
        source = %source.display(),
        out = %out_dir.display(),
        files = PNG_VARIANTS.len() + 3,
        "favicon stage done"
    );
    Ok(())
}

/// Remove the build-time snippet in production builds.
pub fn run_post(ctx: &StageContext) -> Result<()> {
    if !ctx.mode.is_production() {
        return Ok(());
    }
    let snippet = snippet_path(ctx);
    if ctx.fs.exists(&snippet) {
        ctx.fs.remove_file(&snippet)?;
        info!(file = %snippet.display(), "removed favicon snippet");
    }
    Ok(())
}

pub fn snippet_path(ctx: &StageContext) -> PathBuf {
    ctx.abs(ctx.globs.favicon_dist()).join(SNIPPET_FILE)
}

fn write_image(
    ctx: &StageContext,
    path: &Path,
    icon: &DynamicImage,
    size: u32,
    format: ImageFormat,
) -> Result<()> {
    let resized = icon.resize_exact(size, size, FilterType::Lanczos3);
    let resized = DynamicImage::ImageRgba8(resized.to_rgba8());

    let mut buf = Cursor::new(Vec::new());
    resized
        .write_to(&mut buf, format)
        .with_context(|| format!("encoding {}", path.display()))?;
    ctx.fs.write(path, buf.get_ref())
}

fn public_url(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{PUBLIC_PATH}{name}?v={v}"),
        None => format!("{PUBLIC_PATH}{name}"),
    }
}

#[derive(Debug, Serialize)]
struct WebManifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    theme_color: Option<String>,
    scope: &'static str,
    start_url: &'static str,
    display: &'static str,
    icons: Vec<ManifestIcon>,
}

#[derive(Debug, Serialize)]
struct ManifestIcon {
    src: String,
    sizes: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

fn web_manifest(options: &FaviconOptions, version: Option<&str>) -> WebManifest {
    let icons = PNG_VARIANTS
        .iter()
        .filter(|(name, _, _)| name.starts_with("android-chrome"))
        .map(|(name, size, _)| ManifestIcon {
            src: public_url(name, version),
            sizes: format!("{size}x{size}"),
            kind: "image/png",
        })
        .collect();

    WebManifest {
        name: options.app_name.clone(),
        short_name: options
            .app_short_name
            .clone()
            .or_else(|| options.app_name.clone()),
        description: options.app_description.clone(),
        lang: options.lang.clone(),
        background_color: options.background.clone(),
        theme_color: options.theme_color.clone(),
        scope: "/",
        start_url: "/",
        display: "standalone",
        icons,
    }
}

fn snippet(options: &FaviconOptions, version: Option<&str>) -> String {
    let href = |name: &str| escape_attr(&public_url(name, version));

    let mut tags = vec![format!(
        r#"<link rel="shortcut icon" href="{}">"#,
        href("favicon.ico")
    )];
    for (name, size, rel) in PNG_VARIANTS {
        let Some(rel) = rel else { continue };
        let kind = if *rel == "icon" { r#" type="image/png""# } else { "" };
        tags.push(format!(
            r#"<link rel="{rel}"{kind} sizes="{size}x{size}" href="{}">"#,
            href(name)
        ));
    }
    tags.push(format!(
        r#"<link rel="manifest" href="{}">"#,
        href(MANIFEST_FILE)
    ));
    if let Some(color) = &options.theme_color {
        let color = escape_attr(color);
        tags.push(format!(r#"<meta name="theme-color" content="{color}">"#));
    }
    if let Some(name) = &options.app_name {
        let name = escape_attr(name);
        tags.push(format!(r#"<meta name="application-name" content="{name}">"#));
        tags.push(format!(
            r#"<meta name="apple-mobile-web-app-title" content="{name}">"#
        ));
    }

    let mut out = tags.join("\n");
    out.push('\n');
    out
}

/// Escape a value for a double-quoted HTML attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
