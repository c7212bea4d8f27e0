use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use voyager_asset::{
    bounds::BoundingBox,
    geometry::GeometryAsset,
    loader::{asset_loader::AssetLoader, source::FileSource, url::RootUrl},
    release::ResourceRelease,
    texture::TextureAsset,
};
use voyager_document::{DerivativeQuality, DerivativeUsage, UnitType};
use voyager_scene::Scene;

fn usage(name: &str) -> Result<DerivativeUsage, String> {
    DerivativeUsage::find(name).ok_or_else(|| format!("unknown usage {}", name))
}

fn quality(name: &str) -> Result<DerivativeQuality, String> {
    DerivativeQuality::find(name).ok_or_else(|| format!("unknown quality {}", name))
}

fn units(name: &str) -> Result<UnitType, String> {
    UnitType::find(name).ok_or_else(|| format!("unknown unit {}", name))
}

/// Loads a document and the derivatives of its items, then reports their
/// bounds.
#[derive(Parser)]
#[command(name = "voyager")]
struct Cli {
    /// Document to load
    document: PathBuf,

    /// Root URL asset paths are resolved against. Defaults to the directory
    /// of the document.
    #[arg(long)]
    root: Option<String>,

    /// Path of the item assets, relative to the root
    #[arg(long, default_value = "")]
    base_path: String,

    #[arg(long, default_value = "Web", value_parser = usage)]
    usage: DerivativeUsage,

    #[arg(long, default_value = "High", value_parser = quality)]
    quality: DerivativeQuality,

    /// Scene units, e.g. "m". Defaults to the units of the document.
    #[arg(long, value_parser = units)]
    units: Option<UnitType>,
}

/// Nothing is uploaded anywhere, released resources are only logged.
struct LogRelease;

impl ResourceRelease for LogRelease {
    fn release_geometry(&mut self, geometry: &GeometryAsset) {
        debug!("Release geometry {}", geometry.id);
    }

    fn release_texture(&mut self, texture: &TextureAsset) {
        debug!("Release texture {}", texture.id);
    }
}

fn format_bounds(bounds: &BoundingBox) -> String {
    if bounds.is_empty() {
        String::from("empty")
    } else {
        format!("{} .. {} (size {})", bounds.min, bounds.max, bounds.size())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let document = std::fs::canonicalize(&cli.document)
        .with_context(|| format!("Cannot find {}", cli.document.display()))?;
    let document_url = FileSource::url(&document);
    let root = match &cli.root {
        Some(root) => RootUrl::new(root),
        None => RootUrl::from_location(&document_url),
    };

    let loader = AssetLoader::new(FileSource, root);
    loader.loading().subscribe(|loading| {
        info!("{}", if *loading { "Loading" } else { "Idle" });
    });

    let data = loader
        .load_document(&document_url)
        .await
        .with_context(|| format!("Failed to load document {}", document_url))?;
    let scene = Scene::from_data(&data);
    if let Some(units) = cli.units {
        scene.set_units(units);
    }

    let mut release = LogRelease;
    let loaded = scene
        .load_models(&loader, &cli.base_path, cli.usage, cli.quality, &mut release)
        .await;
    println!(
        "Loaded {} of {} items as {}/{}",
        loaded,
        scene.len(),
        cli.usage,
        cli.quality
    );

    for (index, model) in scene.models().iter().enumerate() {
        let derivative = model
            .active_derivative()
            .and_then(|id| {
                model
                    .derivatives()
                    .get_by_id(id)
                    .map(|derivative| format!("{}/{}", derivative.usage(), derivative.quality()))
            })
            .unwrap_or_else(|| String::from("none"));
        println!(
            "  {} {} [{}] {}: {}",
            index,
            model.name().unwrap_or_default(),
            model.units(),
            derivative,
            format_bounds(&model.world_bounding_box(scene.units()))
        );
    }
    println!(
        "Scene [{}]: {}",
        scene.units(),
        format_bounds(&scene.bounding_box())
    );

    scene.dispose(&mut release);
    Ok(())
}
