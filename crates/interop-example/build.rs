use interop_codegen::CodeGenerator;
use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let mut codegen = CodeGenerator::new();
    codegen
        .load_config(manifest_dir.join("bindgen.toml"))
        .expect("Failed to read bindgen.toml");
    codegen
        .add_model_dir(manifest_dir.join("model"))
        .expect("Failed to load model");

    let output = codegen
        .write_to_dir(out_dir.join("bindings"))
        .expect("Failed to generate bindings");
    for diagnostic in output.diagnostics().iter() {
        println!("cargo:warning={diagnostic}");
    }

    println!("cargo:rerun-if-changed=model");
    println!("cargo:rerun-if-changed=bindgen.toml");
    println!("cargo:rerun-if-changed=build.rs");
}
