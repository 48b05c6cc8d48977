//! # interop-codegen
//!
//! Binding generator for a native engine scripted from a managed runtime.
//! From a declarative model of native classes, structs, enums and methods it
//! emits, per module, a native wrapper header, a native wrapper source and a
//! managed (C#) source that binds to the wrappers through internal calls.
//!
//! ## Usage
//!
//! ### 1. Describe the native API
//!
//! ```toml
//! # model/texture.toml
//! [[modules]]
//! name = "Texture"
//!
//! [[modules.classes]]
//! name = "Texture"
//! category = "resource"
//! decl_file = "Image/BsTexture.h"
//!
//! [[modules.classes.methods]]
//! name = "getWidth"
//! kind = "getter"
//! managed_name = "Width"
//! returns = { type = "UINT32" }
//! ```
//!
//! ### 2. Generate bindings in build.rs
//!
//! ```rust,ignore
//! // build.rs
//! use interop_codegen::CodeGenerator;
//!
//! fn main() {
//!     CodeGenerator::new()
//!         .add_model_dir("model").unwrap()
//!         .write_to_dir("generated").unwrap();
//!
//!     println!("cargo:rerun-if-changed=model");
//! }
//! ```
//!
//! Declarations may also be built by hand with [`CodeGenerator::add_module`]
//! and [`CodeGenerator::register_type`]. Problems that only affect a single
//! declaration are reported through [`Diagnostics`] and the declaration is
//! skipped; anything else aborts with a [`GenerateError`].

pub mod code;
pub mod comments;
mod config;
mod diagnostics;
mod generator;
mod loader;
mod managed;
pub mod marshal;
mod model;
mod native;
pub mod postprocess;
mod registry;
pub mod signature;
pub mod structs;
pub mod types;

pub use code::{Block, Indent};
pub use comments::{CommentEntry, CommentIndex, CommentInfo, ParamComment};
pub use config::{ConfigError, GeneratorConfig, TargetConfig};
pub use diagnostics::{Diagnostic, Diagnostics, GenerateError, Result, Severity};
pub use generator::{CodeGenerator, FileKind, GeneratedFile, GeneratedOutput};
pub use loader::{LoadError, load_dir, load_file, load_str};
pub use managed::ManagedEmitter;
pub use model::{
    ClassFlags, ClassInfo, EnumEntry, EnumInfo, ForwardDecl, MethodFlags, MethodInfo, ModuleInfo,
    PropertyInfo, StructConstructor, StructInfo, SymbolTable, VarInfo, Visibility,
};
pub use native::NativeEmitter;
pub use registry::{TypeInfo, TypeRegistry};
pub use types::{ObjectHandle, Ownership, TypeCategory, TypeFlags};
