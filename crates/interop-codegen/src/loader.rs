//! TOML model front end.
//!
//! A model file declares modules with their classes, structs and enums,
//! groups of external methods to rebind onto classes, extra type
//! registrations and documentation index entries:
//!
//! ```toml
//! [[types]]
//! name = "Color"
//! category = "struct"
//! managed_name = "Color"
//! decl_file = "Image/BsColor.h"
//!
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
//!
//! [[external]]
//! class = "Texture"
//! external_class = "TextureEx"
//!
//! [[external.constructors]]
//! name = "create"
//! params = [{ name = "width", type = "UINT32" }]
//! returns = { type = "Texture", ownership = "resource_handle" }
//! ```
//!
//! Declared classes, structs and enums register themselves in the
//! [`TypeRegistry`](crate::TypeRegistry) and in the documentation index, so
//! `@copydoc` references may point at any of them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::comments::{CommentEntry, CommentInfo};
use crate::generator::CodeGenerator;
use crate::model::{
    ClassFlags, ClassInfo, EnumEntry, EnumInfo, MethodFlags, MethodInfo, ModuleInfo,
    StructConstructor, StructInfo, SymbolTable, VarInfo, Visibility,
};
use crate::registry::TypeInfo;
use crate::types::{Ownership, TypeCategory};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid model file `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to scan model directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("module `{0}` is declared more than once")]
    DuplicateModule(String),
}

// ── File format ──

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ModelFile {
    types: Vec<TypeDecl>,
    modules: Vec<ModuleDecl>,
    external: Vec<ExternalDecl>,
    comments: Vec<CommentInfo>,
}

#[derive(Debug, Deserialize)]
struct TypeDecl {
    name: String,
    #[serde(flatten)]
    info: TypeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleDecl {
    name: String,
    #[serde(default)]
    editor: bool,
    #[serde(default)]
    classes: Vec<ClassDecl>,
    #[serde(default)]
    structs: Vec<StructDecl>,
    #[serde(default)]
    enums: Vec<EnumDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassDecl {
    name: String,
    managed_name: Option<String>,
    #[serde(default = "default_class_category")]
    category: TypeCategory,
    #[serde(default)]
    namespace: Vec<String>,
    base: Option<String>,
    decl_file: Option<String>,
    /// Accessed through a single global instance.
    #[serde(default)]
    singleton: bool,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    doc: CommentEntry,
    #[serde(default)]
    constructors: Vec<MethodDecl>,
    #[serde(default)]
    methods: Vec<MethodDecl>,
    #[serde(default)]
    events: Vec<MethodDecl>,
}

fn default_class_category() -> TypeCategory {
    TypeCategory::Class
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MethodKind {
    #[default]
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodDecl {
    name: String,
    managed_name: Option<String>,
    #[serde(default)]
    kind: MethodKind,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default)]
    interop_only: bool,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    params: Vec<VarDecl>,
    returns: Option<VarDecl>,
    #[serde(default)]
    doc: CommentEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VarDecl {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    ownership: Option<Ownership>,
    #[serde(default)]
    array: bool,
    #[serde(default)]
    output: bool,
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructDecl {
    name: String,
    managed_name: Option<String>,
    #[serde(default)]
    namespace: Vec<String>,
    decl_file: Option<String>,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    doc: CommentEntry,
    #[serde(default)]
    fields: Vec<VarDecl>,
    #[serde(default)]
    constructors: Vec<StructConstructorDecl>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StructConstructorDecl {
    params: Vec<VarDecl>,
    /// Field name -> parameter name.
    assign: IndexMap<String, String>,
    doc: CommentEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumDecl {
    name: String,
    managed_name: Option<String>,
    #[serde(default)]
    namespace: Vec<String>,
    decl_file: Option<String>,
    /// Native integer type values are cast through.
    underlying_type: Option<String>,
    /// Underlying type written on the managed enum.
    explicit_type: Option<String>,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    doc: CommentEntry,
    #[serde(default)]
    entries: Vec<EnumEntryDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumEntryDecl {
    name: String,
    value: i64,
    #[serde(default)]
    doc: CommentEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExternalDecl {
    /// Class the methods are rebound onto.
    class: String,
    /// Class or namespace declaring the free functions.
    external_class: String,
    #[serde(default)]
    constructors: Vec<MethodDecl>,
    #[serde(default)]
    methods: Vec<MethodDecl>,
}

// ── Conversion ──

impl VarDecl {
    fn into_var(self) -> VarInfo {
        let mut var = VarInfo::new(self.name, self.type_name);
        if let Some(ownership) = self.ownership {
            var = var.with_ownership(ownership);
        }
        if self.array {
            var = var.array();
        }
        if self.output {
            var = var.output();
        }
        var.default_value = self.default;
        var
    }
}

impl MethodDecl {
    fn into_method(self, constructor: bool) -> MethodInfo {
        let mut flags = MethodFlags::empty();
        flags.set(MethodFlags::CONSTRUCTOR, constructor);
        flags.set(MethodFlags::STATIC, self.is_static);
        flags.set(MethodFlags::INTEROP_ONLY, self.interop_only);
        flags.set(MethodFlags::PROPERTY_GETTER, self.kind == MethodKind::Getter);
        flags.set(MethodFlags::PROPERTY_SETTER, self.kind == MethodKind::Setter);

        let mut method = MethodInfo::new(self.name).with_flags(flags);
        if let Some(managed_name) = self.managed_name {
            method.managed_name = managed_name;
        }
        method.visibility = self.visibility;
        method.params = self.params.into_iter().map(VarDecl::into_var).collect();
        method.return_value = self.returns.map(VarDecl::into_var);
        method.documentation = self.doc;
        method
    }
}

fn namespaces(namespace: &[String]) -> Vec<&str> {
    namespace.iter().map(String::as_str).collect()
}

/// Index the documentation of a class and its members for `@copydoc`.
fn index_class(table: &mut SymbolTable, class: &ClassInfo) {
    let ns = namespaces(&class.namespace);
    table.comments.add(CommentInfo::new(
        class.name.clone(),
        &ns,
        class.documentation.clone(),
    ));

    let mut functions: IndexMap<&str, CommentInfo> = IndexMap::new();
    for method in class.all_methods() {
        let params: Vec<&str> = method.params.iter().map(|p| p.type_name.as_str()).collect();
        let entry = functions
            .entry(method.source_name.as_str())
            .or_insert_with(|| {
                CommentInfo::function(format!("{}::{}", class.name, method.source_name), &ns)
            });
        *entry = std::mem::take(entry).with_overload(&params, method.documentation.clone());
    }
    for (_, info) in functions {
        table.comments.add(info);
    }
}

impl ModelFile {
    fn parse(input: &str, path: &Path) -> Result<Self, LoadError> {
        toml::from_str(input).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(self, table: &mut SymbolTable) -> Result<(), LoadError> {
        for decl in self.modules {
            if table.modules.contains_key(&decl.name) {
                return Err(LoadError::DuplicateModule(decl.name));
            }
            let module = module_from_decl(table, decl);
            log::debug!(
                "loaded module {} ({} classes, {} structs, {} enums)",
                module.name,
                module.classes.len(),
                module.structs.len(),
                module.enums.len()
            );
            table.modules.insert(module.name.clone(), module);
        }

        for group in self.external {
            let methods = table.external_methods.entry(group.class).or_default();
            let ctors = group.constructors.into_iter().map(|m| m.into_method(true));
            let others = group.methods.into_iter().map(|m| m.into_method(false));
            for mut method in ctors.chain(others) {
                method.external_class = Some(group.external_class.clone());
                methods.push(method);
            }
        }

        for decl in self.types {
            table.types.register(decl.name, decl.info);
        }
        for info in self.comments {
            table.comments.add(info);
        }
        Ok(())
    }
}

fn module_from_decl(table: &mut SymbolTable, decl: ModuleDecl) -> ModuleInfo {
    let mut module = ModuleInfo::new(decl.name);
    module.editor = decl.editor;

    for class in decl.classes {
        let mut info = TypeInfo::new(
            class.category,
            class.managed_name.unwrap_or_else(|| class.name.clone()),
        );
        info.decl_file = class.decl_file;
        table.types.register(class.name.clone(), info);

        let mut flags = ClassFlags::empty();
        flags.set(ClassFlags::IS_SINGLETON_MODULE, class.singleton);
        let info = ClassInfo {
            namespace: class.namespace,
            base_class: class.base,
            flags,
            visibility: class.visibility,
            documentation: class.doc,
            constructors: class
                .constructors
                .into_iter()
                .map(|m| m.into_method(true))
                .collect(),
            methods: class
                .methods
                .into_iter()
                .map(|m| m.into_method(false))
                .collect(),
            events: class
                .events
                .into_iter()
                .map(|m| m.into_method(false))
                .collect(),
            ..ClassInfo::new(class.name)
        };
        index_class(table, &info);
        module.classes.push(info);
    }

    for decl in decl.structs {
        let mut info = TypeInfo::new(
            TypeCategory::Struct,
            decl.managed_name.unwrap_or_else(|| decl.name.clone()),
        );
        info.decl_file = decl.decl_file;
        table.types.register(decl.name.clone(), info);

        let ns = namespaces(&decl.namespace);
        table
            .comments
            .add(CommentInfo::new(decl.name.clone(), &ns, decl.doc.clone()));

        let mut info = StructInfo::new(decl.name);
        info.namespace = decl.namespace;
        info.visibility = decl.visibility;
        info.documentation = decl.doc;
        info.fields = decl.fields.into_iter().map(VarDecl::into_var).collect();
        info.constructors = decl
            .constructors
            .into_iter()
            .map(|ctor| StructConstructor {
                params: ctor.params.into_iter().map(VarDecl::into_var).collect(),
                field_assignments: ctor.assign,
                documentation: ctor.doc,
            })
            .collect();
        module.structs.push(info);
    }

    for decl in decl.enums {
        let managed_name = decl.managed_name.unwrap_or_else(|| decl.name.clone());
        let mut info = TypeInfo::new(TypeCategory::Enum, managed_name.clone());
        info.decl_file = decl.decl_file;
        info.underlying_type = decl.underlying_type;
        table.types.register(decl.name.clone(), info);

        let ns = namespaces(&decl.namespace);
        table
            .comments
            .add(CommentInfo::new(decl.name.clone(), &ns, decl.doc.clone()));

        module.enums.push(EnumInfo {
            name: decl.name,
            managed_name,
            namespace: decl.namespace,
            visibility: decl.visibility,
            documentation: decl.doc,
            explicit_type: decl.explicit_type,
            entries: decl
                .entries
                .into_iter()
                .map(|entry| {
                    (
                        entry.value,
                        EnumEntry {
                            managed_name: entry.name,
                            documentation: entry.doc,
                        },
                    )
                })
                .collect(),
        });
    }
    module
}

/// Parse one model document and merge it into `table`.
///
/// `origin` names the document in error messages.
pub fn load_str(table: &mut SymbolTable, input: &str, origin: &Path) -> Result<(), LoadError> {
    ModelFile::parse(input, origin)?.apply(table)
}

pub fn load_file(table: &mut SymbolTable, path: &Path) -> Result<(), LoadError> {
    let input = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loading model file {}", path.display());
    load_str(table, &input, path)
}

/// Load every `*.toml` file below `root`, in file name order.
pub fn load_dir(table: &mut SymbolTable, root: &Path) -> Result<(), LoadError> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|e| e == "toml") {
            load_file(table, path)?;
        }
    }
    Ok(())
}

impl CodeGenerator {
    /// Merge a model document given as a string.
    pub fn add_model_str(&mut self, input: &str) -> Result<&mut Self, LoadError> {
        load_str(&mut self.table, input, Path::new("<string>"))?;
        Ok(self)
    }

    /// Load a single model file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut generator = CodeGenerator::new();
    /// generator.add_model_file("model/texture.toml")?;
    /// ```
    pub fn add_model_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, LoadError> {
        load_file(&mut self.table, path.as_ref())?;
        Ok(self)
    }

    /// Recursively load every `*.toml` model file below a directory.
    pub fn add_model_dir(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, LoadError> {
        load_dir(&mut self.table, path.as_ref())?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeFlags;

    const MODEL: &str = r#"
        [[types]]
        name = "Color"
        category = "struct"
        managed_name = "Color"
        decl_file = "Image/BsColor.h"

        [[modules]]
        name = "Texture"

        [[modules.classes]]
        name = "Texture"
        category = "resource"
        namespace = ["bs"]
        decl_file = "Image/BsTexture.h"
        doc = { brief = ["A texture."] }

        [[modules.classes.methods]]
        name = "getWidth"
        kind = "getter"
        managed_name = "Width"
        returns = { type = "UINT32" }

        [[modules.classes.methods]]
        name = "readPixels"
        params = [
            { name = "mip", type = "UINT32", default = "0" },
            { name = "data", type = "UINT8", array = true, output = true },
        ]

        [[modules.classes.events]]
        name = "onReloaded"
        static = true

        [[modules.structs]]
        name = "TextureDesc"
        fields = [
            { name = "width", type = "UINT32" },
            { name = "format", type = "PixelFormat" },
        ]

        [[modules.structs.constructors]]
        params = [{ name = "w", type = "UINT32" }]
        assign = { width = "w" }

        [[modules.enums]]
        name = "PixelFormat"
        underlying_type = "UINT32"
        explicit_type = "uint"
        entries = [
            { name = "R8", value = 0 },
            { name = "RGBA8", value = 3, doc = { brief = ["Four channels."] } },
        ]

        [[external]]
        class = "Texture"
        external_class = "TextureEx"

        [[external.constructors]]
        name = "create"
        params = [{ name = "desc", type = "TextureDesc" }]
        returns = { type = "Texture", ownership = "resource_handle" }

        [[comments]]
        name = "Resource"
        namespaces = ["bs"]
        comment = { brief = ["Base of every resource."] }
    "#;

    fn loaded() -> SymbolTable {
        let mut table = SymbolTable::new();
        load_str(&mut table, MODEL, Path::new("model.toml")).unwrap();
        table
    }

    #[test]
    fn test_declarations_become_model_entries() {
        let table = loaded();
        let class = table.find_class("Texture").unwrap();
        assert_eq!(class.namespace, vec!["bs"]);
        assert_eq!(class.documentation.brief, vec!["A texture."]);

        let getter = &class.methods[0];
        assert!(getter.flags.contains(MethodFlags::PROPERTY_GETTER));
        assert_eq!(getter.managed_name, "Width");
        assert_eq!(getter.return_value.as_ref().unwrap().type_name, "UINT32");

        let read = &class.methods[1];
        assert_eq!(read.managed_name, "readPixels");
        assert_eq!(read.params[0].default_value.as_deref(), Some("0"));
        assert!(read.params[1].flags.contains(TypeFlags::ARRAY | TypeFlags::OUTPUT));

        assert!(class.events[0].is_static());

        let desc = table.find_struct("TextureDesc").unwrap();
        assert_eq!(desc.fields.len(), 2);
        assert_eq!(desc.constructors[0].field_assignments["width"], "w");

        let format = table.find_enum("PixelFormat").unwrap();
        assert_eq!(format.explicit_type.as_deref(), Some("uint"));
        assert_eq!(format.entries[&3i64].managed_name, "RGBA8");
    }

    #[test]
    fn test_declarations_register_types() {
        let table = loaded();
        let texture = table.types.get("Texture").unwrap();
        assert_eq!(texture.category, TypeCategory::Resource);
        assert_eq!(texture.decl_file.as_deref(), Some("Image/BsTexture.h"));
        assert_eq!(table.types.category("TextureDesc"), Some(TypeCategory::Struct));
        assert_eq!(
            table.types.get("PixelFormat").unwrap().enum_underlying_type(),
            "UINT32"
        );
        assert_eq!(table.types.managed_name("Color"), "Color");
    }

    #[test]
    fn test_external_groups_are_pending_until_rebinding() {
        let table = loaded();
        let pending = &table.external_methods["Texture"];
        assert_eq!(pending.len(), 1);
        assert!(pending[0].is_constructor());
        assert_eq!(pending[0].external_class.as_deref(), Some("TextureEx"));
        assert_eq!(
            pending[0].return_value.as_ref().unwrap().flags.ownership(),
            Some(Ownership::ResourceHandle)
        );
    }

    #[test]
    fn test_documentation_is_indexed() {
        let table = loaded();
        let ns = vec!["bs".to_string()];
        let doc = table.comments.lookup("Texture", &ns).unwrap();
        assert_eq!(doc.brief, vec!["A texture."]);
        assert!(table.comments.lookup("Resource", &ns).is_some());
        assert!(table.comments.lookup("Texture::readPixels(UINT32, UINT8)", &ns).is_some());
    }

    #[test]
    fn test_duplicate_module_is_rejected() {
        let mut table = loaded();
        let err = load_str(&mut table, MODEL, Path::new("again.toml")).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateModule(name) if name == "Texture"));
    }

    #[test]
    fn test_unknown_keys_are_parse_errors() {
        let mut table = SymbolTable::new();
        let err = load_str(
            &mut table,
            "[[modules]]\nname = \"A\"\nclasess = []\n",
            Path::new("typo.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("typo.toml"));
    }

    #[test]
    fn test_load_dir_reads_nested_files() {
        let root = std::env::temp_dir().join(format!("interop-model-{}", std::process::id()));
        let nested = root.join("engine");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("texture.toml"), MODEL).unwrap();
        fs::write(root.join("notes.txt"), "not a model").unwrap();

        let mut table = SymbolTable::new();
        load_dir(&mut table, &root).unwrap();
        assert!(table.modules.contains_key("Texture"));

        fs::remove_dir_all(&root).unwrap();
    }
}
