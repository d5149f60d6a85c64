fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    let descriptor_path = std::path::PathBuf::from(std::env::var("OUT_DIR")?).join("costsource_descriptor.bin");

    tonic_build::configure()
        .file_descriptor_set_path(descriptor_path)
        // Connect-style JSON handlers (costsource-server) and any
        // JSON-emitting client serialize these same generated types
        // instead of hand-written wire structs.
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .type_attribute(".", "#[serde(default, rename_all = \"camelCase\")]")
        .compile(&["proto/costsource.proto"], &["proto"])?;

    Ok(())
}
