//! Inspect command

use anyhow::Result;
use kiln_core::{MaterialConfig, Rgb};
use kiln_scene::{AssetBinder, GltfLoader, TemplateCache};
use std::sync::Arc;

pub struct InspectArgs {
    pub reference: String,
    pub color: Option<String>,
    pub roughness: Option<f32>,
    pub metalness: Option<f32>,
    pub texture: Option<String>,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let mut config = MaterialConfig::default();
    if let Some(hex) = &args.color {
        config.set_base_color(Rgb::parse_hex(hex)?);
    }
    if let Some(roughness) = args.roughness {
        config.set_roughness(roughness);
    }
    if let Some(metalness) = args.metalness {
        config.set_metalness(metalness);
    }
    config.set_texture_reference(args.texture);

    let mut binder = AssetBinder::new(Arc::new(TemplateCache::new()), Arc::new(GltfLoader));
    let instance = binder.bind(&args.reference, &config)?;

    println!("{}", instance.summary());
    println!(
        "  Material: color {}, roughness {:.2}, metalness {:.2}",
        config.base_color(),
        config.roughness(),
        config.metalness()
    );
    match (config.texture_reference(), instance.texture_source()) {
        (Some(_), Some(source)) => println!("  Texture: {}", source),
        (Some(requested), None) => println!("  Texture: {} (not loaded)", requested),
        (None, _) => {}
    }
    Ok(())
}
