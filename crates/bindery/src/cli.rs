use bindery_core::extension::{InstallResult, LibVersion, PackageManifest, SourceInfo};

/// Prints the outcome of an install to standard output.
pub fn print_install_result(result: &InstallResult) {
    println!(
        "Installed {} {} (lib {})",
        result.package_identifier, result.version_name, result.lib_version
    );
    if result.extension_nsfw {
        println!("  Extension is flagged NSFW");
    }
    if result.sources.is_empty() {
        println!("  No usable sources.");
        return;
    }
    println!("  Sources ({}):", result.sources.len());
    for loaded in &result.sources {
        let info = SourceInfo::of(loaded.source.as_ref());
        let rating = if loaded.is_nsfw { " [NSFW]" } else { "" };
        println!("  - {}{}", info, rating);
    }
}

/// Prints a package manifest and whether this host would accept it.
pub fn print_manifest(manifest: &PackageManifest, verdict: &Result<LibVersion, String>) {
    println!("Package: {}", manifest.package_identifier);
    println!("Version: {}", manifest.version_string);
    if let Some(code) = manifest.version_code {
        println!("Version code: {}", code);
    }
    if let Some(label) = &manifest.label {
        println!("Label: {}", label);
    }
    if manifest.required_features.is_empty() {
        println!("Features: none");
    } else {
        let features: Vec<&str> = manifest.required_features.iter().map(String::as_str).collect();
        println!("Features: {}", features.join(", "));
    }
    for (key, value) in &manifest.entry_metadata {
        println!("Metadata: {} = {}", key, value);
    }
    match verdict {
        Ok(lib_version) => println!("Compatible: yes (lib {})", lib_version),
        Err(reason) => println!("Compatible: no ({})", reason),
    }
}
