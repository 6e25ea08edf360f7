use cargo_toml::{Dependency, Manifest};

/// The fjall version requirement this adapter was built against, read from its manifest.
pub(crate) fn fjall_version() -> Result<String, String> {
    fjall_version_in(include_str!("../Cargo.toml"))
}

fn fjall_version_in(cargo_toml: &str) -> Result<String, String> {
    let manifest = Manifest::from_str(cargo_toml)
        .map_err(|e| format!("Failed to parse Cargo.toml: {}", e))?;

    let dependency = manifest
        .dependencies
        .get("fjall")
        .ok_or_else(|| "fjall dependency not found in Cargo.toml".to_string())?;

    match dependency {
        Dependency::Simple(version) => Ok(version.clone()),
        Dependency::Detailed(d) => d
            .version
            .clone()
            .ok_or_else(|| "fjall dependency version not specified".to_string()),
        Dependency::Inherited(_) => Err("Inherited fjall dependency not supported".to_string()),
    }
}
