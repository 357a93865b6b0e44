use utoipa::OpenApi;

fn main() {
    let spec = match relay_server::routes::ApiDoc::openapi().to_pretty_json() {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("failed to render OpenAPI document: {e}");
            std::process::exit(1);
        }
    };
    let out = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../specs/relay-server.json");
    if let Some(parent) = out.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("failed to create {}: {e}", parent.display());
            std::process::exit(1);
        }
    }
    if let Err(e) = std::fs::write(&out, spec) {
        eprintln!("failed to write {}: {e}", out.display());
        std::process::exit(1);
    }
    println!("Wrote {}", out.display());
}
