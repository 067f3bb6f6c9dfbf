//! `pagecap devices`

use anyhow::Result;
use serde_json::json;

pub fn run(as_json: bool) -> Result<()> {
    let config = crate::config::load_config()?;
    let catalog = config.device_catalog();

    if as_json {
        let aliases: serde_json::Map<_, _> = catalog
            .aliases()
            .into_iter()
            .map(|(alias, name)| (alias.to_string(), json!(name)))
            .collect();
        let listing = json!({ "presets": catalog.presets(), "aliases": aliases });
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{:<24} {:>11} {:>6}  MOBILE", "DEVICE", "VIEWPORT", "SCALE");
    for preset in catalog.presets() {
        println!(
            "{:<24} {:>11} {:>6}  {}",
            preset.name,
            format!("{}x{}", preset.width, preset.height),
            preset.device_scale_factor,
            if preset.is_mobile { "yes" } else { "no" }
        );
    }

    println!("\nAliases:");
    for (alias, name) in catalog.aliases() {
        println!("  {alias:<16} -> {name}");
    }
    Ok(())
}
