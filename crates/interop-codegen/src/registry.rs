//! Type registry for mapping declared native type names to their interop category.
//!
//! Every type name that appears in a parameter, return value or field must be
//! registered before postprocessing. Builtin scalar and string mappings are
//! registered automatically; declared classes, structs and enums are added by
//! the model loader, and users can add or override mappings by hand.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{GenerateError, Result};
use crate::types::TypeCategory;

/// What the generator knows about a single declared type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub category: TypeCategory,
    /// Name of the type on the managed side.
    pub managed_name: String,
    /// Header that declares the native type.
    #[serde(default)]
    pub decl_file: Option<String>,
    /// Module whose generated files hold the wrapper, or a header path ending in `.h`.
    #[serde(default)]
    pub dest_module: Option<String>,
    /// Underlying integer type of an enum, used when casting array elements.
    #[serde(default)]
    pub underlying_type: Option<String>,
}

impl TypeInfo {
    pub fn new(category: TypeCategory, managed_name: impl Into<String>) -> Self {
        Self {
            category,
            managed_name: managed_name.into(),
            decl_file: None,
            dest_module: None,
            underlying_type: None,
        }
    }

    pub fn with_decl_file(mut self, decl_file: impl Into<String>) -> Self {
        self.decl_file = Some(decl_file.into());
        self
    }

    pub fn with_dest_module(mut self, dest_module: impl Into<String>) -> Self {
        self.dest_module = Some(dest_module.into());
        self
    }

    pub fn with_underlying_type(mut self, underlying_type: impl Into<String>) -> Self {
        self.underlying_type = Some(underlying_type.into());
        self
    }

    /// Integer type enum values are cast through, `int` when none was declared.
    pub fn enum_underlying_type(&self) -> &str {
        self.underlying_type.as_deref().unwrap_or("int")
    }
}

/// A registry of declared type name -> [`TypeInfo`] associations.
///
/// # Built-in mappings
///
/// The following types are registered by default (via [`TypeRegistry::with_builtins`]):
///
/// | Native type | Category | Managed type |
/// |-------------|----------|--------------|
/// | `bool` | Builtin | `bool` |
/// | `char` | Builtin | `char` |
/// | `int8_t` / `INT8` | Builtin | `sbyte` |
/// | `uint8_t` / `UINT8` | Builtin | `byte` |
/// | `INT16` | Builtin | `short` |
/// | `UINT16` | Builtin | `ushort` |
/// | `int` / `INT32` / `int32_t` | Builtin | `int` |
/// | `UINT32` / `uint32_t` | Builtin | `uint` |
/// | `INT64` | Builtin | `long` |
/// | `UINT64` | Builtin | `ulong` |
/// | `float` | Builtin | `float` |
/// | `double` | Builtin | `double` |
/// | `String` | String | `string` |
/// | `WString` | WideString | `string` |
/// | `ScriptObjectBase` | ManagedObject | `object` |
///
/// # Custom mappings
///
/// ```
/// use interop_codegen::{CodeGenerator, TypeCategory, TypeInfo};
///
/// let mut generator = CodeGenerator::new();
/// generator.register_type(
///     "Color",
///     TypeInfo::new(TypeCategory::Struct, "Color").with_decl_file("Image/BsColor.h"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRegistry {
    mappings: HashMap<String, TypeInfo>,
}

impl TypeRegistry {
    /// Create an empty registry with no mappings.
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Create a registry pre-populated with the builtin mappings.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register all builtin mappings.
    pub fn register_builtins(&mut self) {
        let builtins: &[(&[&str], &str)] = &[
            (&["bool"], "bool"),
            (&["char"], "char"),
            (&["int8_t", "INT8"], "sbyte"),
            (&["uint8_t", "UINT8"], "byte"),
            (&["INT16"], "short"),
            (&["UINT16"], "ushort"),
            (&["int", "INT32", "int32_t"], "int"),
            (&["UINT32", "uint32_t"], "uint"),
            (&["INT64"], "long"),
            (&["UINT64"], "ulong"),
            (&["float"], "float"),
            (&["double"], "double"),
        ];
        for (names, managed) in builtins {
            for name in *names {
                self.register(*name, TypeInfo::new(TypeCategory::Builtin, *managed));
            }
        }

        // Strings
        self.register("String", TypeInfo::new(TypeCategory::String, "string"));
        self.register("WString", TypeInfo::new(TypeCategory::WideString, "string"));

        // Opaque wrapper pointer
        self.register(
            "ScriptObjectBase",
            TypeInfo::new(TypeCategory::ManagedObject, "object"),
        );
    }

    /// Register a type. If a mapping already exists for this name, it is replaced.
    pub fn register(&mut self, name: impl Into<String>, info: TypeInfo) {
        self.mappings.insert(name.into(), info);
    }

    /// Look up the mapping for a declared type name.
    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.mappings.get(name)
    }

    /// Check if a type name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    /// Remove a type mapping.
    pub fn unregister(&mut self, name: &str) -> Option<TypeInfo> {
        self.mappings.remove(name)
    }

    /// Look up a type that must exist. `context` names the declaration using it.
    pub fn resolve(&self, name: &str, context: &str) -> Result<&TypeInfo> {
        self.get(name).ok_or_else(|| GenerateError::UnknownType {
            context: context.to_string(),
            type_name: name.to_string(),
        })
    }

    /// Category of a type, `None` when it is not registered.
    pub fn category(&self, name: &str) -> Option<TypeCategory> {
        self.get(name).map(|info| info.category)
    }

    /// Managed name of a type, falling back to the declared name.
    pub fn managed_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name)
            .map(|info| info.managed_name.as_str())
            .unwrap_or(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_builtins() {
        let registry = TypeRegistry::with_builtins();
        assert!(registry.contains("bool"));
        assert!(registry.contains("UINT32"));
        assert!(registry.contains("uint32_t"));
        assert!(registry.contains("String"));
        assert!(registry.contains("WString"));
        assert!(registry.contains("ScriptObjectBase"));
        assert!(!registry.contains("Texture"));
    }

    #[test]
    fn test_builtin_managed_names() {
        let registry = TypeRegistry::with_builtins();
        assert_eq!(registry.managed_name("UINT8"), "byte");
        assert_eq!(registry.managed_name("INT64"), "long");
        assert_eq!(registry.managed_name("WString"), "string");
        assert_eq!(registry.category("WString"), Some(TypeCategory::WideString));
        assert_eq!(
            registry.category("ScriptObjectBase"),
            Some(TypeCategory::ManagedObject)
        );
    }

    #[test]
    fn test_registry_custom_type() {
        let mut registry = TypeRegistry::new();
        registry.register(
            "Texture",
            TypeInfo::new(TypeCategory::Resource, "Texture")
                .with_decl_file("Image/BsTexture.h")
                .with_dest_module("Texture"),
        );

        let info = registry.get("Texture").unwrap();
        assert_eq!(info.category, TypeCategory::Resource);
        assert_eq!(info.decl_file.as_deref(), Some("Image/BsTexture.h"));
        assert_eq!(info.dest_module.as_deref(), Some("Texture"));
    }

    #[test]
    fn test_registry_override_builtin() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register("float", TypeInfo::new(TypeCategory::Builtin, "Single"));
        assert_eq!(registry.managed_name("float"), "Single");
    }

    #[test]
    fn test_registry_unregister() {
        let mut registry = TypeRegistry::with_builtins();
        assert!(registry.contains("double"));
        registry.unregister("double");
        assert!(!registry.contains("double"));
    }

    #[test]
    fn test_resolve_unknown_type() {
        let registry = TypeRegistry::with_builtins();
        let err = registry.resolve("Mesh", "Renderable::setMesh").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Renderable::setMesh: type `Mesh` is not registered"
        );
    }

    #[test]
    fn test_enum_underlying_type_defaults_to_int() {
        let plain = TypeInfo::new(TypeCategory::Enum, "PixelFormat");
        assert_eq!(plain.enum_underlying_type(), "int");
        let sized = plain.with_underlying_type("UINT8");
        assert_eq!(sized.enum_underlying_type(), "UINT8");
    }
}
