//! Generates script bindings for the bundled model into a directory.
//!
//! Usage: `generate-bindings [MODEL_DIR] [OUT_DIR]`
//!
//! Set `RUST_LOG=debug` to trace the postprocessing passes.

use interop_codegen::{CodeGenerator, Severity};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut args = env::args().skip(1);
    let model_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| manifest_dir.join("model"));
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("generated"));

    let mut codegen = CodeGenerator::new();
    if let Err(err) = codegen.load_config(manifest_dir.join("bindgen.toml")) {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }
    if let Err(err) = codegen.add_model_dir(&model_dir) {
        log::error!("{err}");
        return ExitCode::FAILURE;
    }

    let output = match codegen.write_to_dir(&out_dir) {
        Ok(output) => output,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    for file in output.iter() {
        println!("  {}", file.path);
    }
    let diagnostics = output.diagnostics();
    println!(
        "Wrote {} files to {} ({} errors, {} warnings)",
        output.len(),
        out_dir.display(),
        diagnostics.count(Severity::Error),
        diagnostics.count(Severity::Warning)
    );

    if diagnostics.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
