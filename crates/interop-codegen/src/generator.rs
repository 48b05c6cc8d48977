//! Binding generator: collects declarations, runs the postprocessor and
//! renders every artifact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::comments::CommentInfo;
use crate::config::{ConfigError, GeneratorConfig};
use crate::diagnostics::{Diagnostics, GenerateError, Result};
use crate::managed::ManagedEmitter;
use crate::model::{MethodInfo, ModuleInfo, SymbolTable};
use crate::native::NativeEmitter;
use crate::postprocess;
use crate::registry::TypeInfo;

/// Code generator that collects declarations and outputs native and managed
/// interop code.
#[derive(Debug, Default)]
pub struct CodeGenerator {
    /// Declarations as loaded, before postprocessing.
    pub(crate) table: SymbolTable,

    config: GeneratorConfig,
}

/// What an artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    NativeHeader,
    NativeSource,
    ManagedSource,
    /// The global table of builtin component wrappers.
    ComponentLookup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub kind: FileKind,
    /// Path relative to the output root, `/`-separated.
    pub path: String,
    pub contents: String,
}

/// Every artifact of one run, in module declaration order, plus the
/// diagnostics recorded while producing them.
#[derive(Debug, Default)]
pub struct GeneratedOutput {
    files: Vec<GeneratedFile>,
    diagnostics: Diagnostics,
}

impl GeneratedOutput {
    pub fn get(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|file| file.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Write every artifact below `root`, creating folders as needed.
    pub fn write_to_dir(&self, root: impl AsRef<Path>) -> Result<()> {
        let root = root.as_ref();
        for file in &self.files {
            let path = root.join(&file.path);
            let write = |path: &PathBuf| -> std::io::Result<()> {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, &file.contents)
            };
            write(&path).map_err(|source| GenerateError::Write {
                path: path.clone(),
                source,
            })?;
            log::debug!("wrote {}", path.display());
        }
        Ok(())
    }

    fn push(&mut self, kind: FileKind, dir: &str, name: String, contents: String) {
        let path = if dir.is_empty() {
            name
        } else {
            format!("{}/{name}", dir.trim_end_matches('/'))
        };
        self.files.push(GeneratedFile {
            kind,
            path,
            contents,
        });
    }
}

impl CodeGenerator {
    /// Create a new code generator with default configuration and the
    /// builtin type mappings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&mut self, config: GeneratorConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Load configuration from a TOML file.
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, ConfigError> {
        self.config = GeneratorConfig::from_path(path)?;
        Ok(self)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Set a custom banner comment for every generated file.
    pub fn set_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.config.header = Some(header.into());
        self
    }

    /// Register or override a type mapping.
    pub fn register_type(&mut self, name: impl Into<String>, info: TypeInfo) -> &mut Self {
        self.table.types.register(name, info);
        self
    }

    /// Add a module built by hand. A module with the same name is replaced.
    pub fn add_module(&mut self, module: ModuleInfo) -> &mut Self {
        self.table.modules.insert(module.name.clone(), module);
        self
    }

    /// Queue free functions to be rebound onto `class` during postprocessing.
    ///
    /// Each method must name its declaring class in `external_class`.
    pub fn add_external_methods(
        &mut self,
        class: impl Into<String>,
        methods: impl IntoIterator<Item = MethodInfo>,
    ) -> &mut Self {
        self.table
            .external_methods
            .entry(class.into())
            .or_default()
            .extend(methods);
        self
    }

    /// Add an entry `@copydoc` references can resolve to.
    pub fn add_comment(&mut self, info: CommentInfo) -> &mut Self {
        self.table.comments.add(info);
        self
    }

    /// Declarations as loaded, before postprocessing.
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Run the postprocessor on a copy of the declarations.
    pub fn postprocess(&self) -> Result<(SymbolTable, Diagnostics)> {
        let mut table = self.table.clone();
        let mut diags = Diagnostics::new();
        postprocess::run(&mut table, &self.config, &mut diags)?;
        Ok((table, diags))
    }

    /// Generate every artifact.
    ///
    /// Recoverable problems are reported through
    /// [`GeneratedOutput::diagnostics`]; a fatal one aborts the run.
    pub fn generate(&self) -> Result<GeneratedOutput> {
        let (table, diagnostics) = self.postprocess()?;
        let config = &self.config;
        let native = NativeEmitter::new(&table, config);
        let managed = ManagedEmitter::new(&table, config);

        let mut output = GeneratedOutput {
            files: Vec::new(),
            diagnostics,
        };
        for module in table.modules.values() {
            let target = config.target(module.editor);
            if module.has_native_output() {
                output.push(
                    FileKind::NativeHeader,
                    &target.header_dir,
                    config.native_header_file(&module.name),
                    native.header(module)?,
                );
                output.push(
                    FileKind::NativeSource,
                    &target.source_dir,
                    config.native_source_file(&module.name),
                    native.source(module)?,
                );
            }
            if module.has_managed_output() {
                output.push(
                    FileKind::ManagedSource,
                    &target.managed_dir,
                    config.managed_file(&module.name),
                    managed.file(module)?,
                );
            }
        }
        output.push(
            FileKind::ComponentLookup,
            &config.engine.header_dir,
            config.component_lookup_file.clone(),
            native.component_lookup(),
        );

        log::debug!(
            "generated {} files with {} diagnostics",
            output.len(),
            output.diagnostics.len()
        );
        Ok(output)
    }

    /// Generate every artifact and write it below `root`.
    pub fn write_to_dir(&self, root: impl AsRef<Path>) -> Result<GeneratedOutput> {
        let output = self.generate()?;
        output.write_to_dir(root)?;
        Ok(output)
    }
}
