//! In-memory model of the declarations bindings are generated for.
//!
//! A front end (the TOML [`loader`](crate::loader) in this crate) populates a
//! [`SymbolTable`]; the postprocessor then mutates it in place and the
//! emitters read it.

use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::comments::{CommentEntry, CommentIndex};
use crate::registry::TypeRegistry;
use crate::types::{Ownership, TypeFlags};

/// Managed-side visibility of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Private,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        }
    }
}

/// A parameter, return value or struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
    pub name: String,
    pub type_name: String,
    pub flags: TypeFlags,
    pub default_value: Option<String>,
}

impl VarInfo {
    /// A by-value variable.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            flags: TypeFlags::OWNED_BY_REFERENCE_OR_VALUE,
            default_value: None,
        }
    }

    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.flags = self.flags.with_ownership(ownership);
        self
    }

    pub fn array(self) -> Self {
        self.with_flags(TypeFlags::ARRAY)
    }

    pub fn output(self) -> Self {
        self.with_flags(TypeFlags::OUTPUT)
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u32 {
        const STATIC = 1 << 0;
        const CONSTRUCTOR = 1 << 1;
        const PROPERTY_GETTER = 1 << 2;
        const PROPERTY_SETTER = 1 << 3;
        /// Rebound from an external free function onto the class it operates on.
        const EXTERNAL = 1 << 4;
        /// Gets an interop entry point but no public managed member.
        const INTEROP_ONLY = 1 << 5;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        const IS_BASE_OF_SOMETHING = 1 << 0;
        const IS_SINGLETON_MODULE = 1 << 1;
    }
}

/// A method, constructor or event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodInfo {
    /// Native name of the function.
    pub source_name: String,
    pub managed_name: String,
    /// Unique per class; assigned during postprocessing.
    pub interop_name: String,
    pub flags: MethodFlags,
    pub visibility: Visibility,
    pub params: Vec<VarInfo>,
    pub return_value: Option<VarInfo>,
    /// Class holding an external function, when `EXTERNAL` is set.
    pub external_class: Option<String>,
    /// The first parameter of an external method, removed during rebinding.
    pub receiver: Option<VarInfo>,
    pub documentation: CommentEntry,
}

impl MethodInfo {
    pub fn new(source_name: impl Into<String>) -> Self {
        let source_name = source_name.into();
        Self {
            managed_name: source_name.clone(),
            source_name,
            ..Self::default()
        }
    }

    pub fn constructor(class_name: impl Into<String>) -> Self {
        Self::new(class_name).with_flags(MethodFlags::CONSTRUCTOR)
    }

    pub fn with_managed_name(mut self, name: impl Into<String>) -> Self {
        self.managed_name = name.into();
        self
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_param(mut self, param: VarInfo) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_return(mut self, value: VarInfo) -> Self {
        self.return_value = Some(value);
        self
    }

    pub fn with_doc(mut self, documentation: CommentEntry) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(MethodFlags::CONSTRUCTOR)
    }

    pub fn is_external(&self) -> bool {
        self.flags.contains(MethodFlags::EXTERNAL)
    }

    pub fn is_property(&self) -> bool {
        self.flags
            .intersects(MethodFlags::PROPERTY_GETTER | MethodFlags::PROPERTY_SETTER)
    }

    pub fn is_interop_only(&self) -> bool {
        self.flags.contains(MethodFlags::INTEROP_ONLY)
    }

    /// Every variable this method references: params, return value and receiver.
    pub fn vars(&self) -> impl Iterator<Item = &VarInfo> {
        self.params
            .iter()
            .chain(self.return_value.iter())
            .chain(self.receiver.iter())
    }

    pub fn vars_mut(&mut self) -> impl Iterator<Item = &mut VarInfo> {
        self.params
            .iter_mut()
            .chain(self.return_value.iter_mut())
            .chain(self.receiver.iter_mut())
    }
}

/// A managed property synthesized from a getter and/or setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: String,
    pub type_name: String,
    pub flags: TypeFlags,
    pub is_static: bool,
    pub visibility: Visibility,
    /// Interop name of the getter.
    pub getter: Option<String>,
    /// Interop name of the setter.
    pub setter: Option<String>,
    pub documentation: CommentEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassInfo {
    pub name: String,
    pub namespace: Vec<String>,
    pub base_class: Option<String>,
    pub flags: ClassFlags,
    pub visibility: Visibility,
    pub documentation: CommentEntry,
    pub constructors: Vec<MethodInfo>,
    pub methods: Vec<MethodInfo>,
    pub events: Vec<MethodInfo>,
    /// Derived during postprocessing.
    pub properties: Vec<PropertyInfo>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_module(&self) -> bool {
        self.flags.contains(ClassFlags::IS_SINGLETON_MODULE)
    }

    pub fn is_base(&self) -> bool {
        self.flags.contains(ClassFlags::IS_BASE_OF_SOMETHING)
    }

    /// Constructors, methods and events in interop naming order.
    pub fn all_methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods
            .iter()
            .chain(self.constructors.iter())
            .chain(self.events.iter())
    }

    pub fn all_methods_mut(&mut self) -> impl Iterator<Item = &mut MethodInfo> {
        self.methods
            .iter_mut()
            .chain(self.constructors.iter_mut())
            .chain(self.events.iter_mut())
    }

    /// Static or module-level events, connected once at start-up.
    pub fn static_events(&self) -> impl Iterator<Item = &MethodInfo> {
        let module = self.is_module();
        self.events.iter().filter(move |e| module || e.is_static())
    }

    pub fn instance_events(&self) -> impl Iterator<Item = &MethodInfo> {
        let module = self.is_module();
        self.events.iter().filter(move |e| !module && !e.is_static())
    }

    /// The private constructor the runtime uses to allocate a managed shell.
    ///
    /// Its arity is the smallest, starting at one, that no declared
    /// constructor already uses with only `bool` parameters.
    pub fn runtime_constructor(&self) -> MethodInfo {
        let mut arity = 1;
        while self.constructors.iter().any(|ctor| {
            ctor.params.len() == arity && ctor.params.iter().all(|p| p.type_name == "bool")
        }) {
            arity += 1;
        }

        let mut ctor = MethodInfo::constructor(self.name.clone());
        ctor.visibility = Visibility::Private;
        ctor.params = (0..arity)
            .map(|i| VarInfo::new(format!("__dummy{i}"), "bool"))
            .collect();
        ctor
    }
}

/// A struct constructor; each assigned field takes the named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructConstructor {
    pub params: Vec<VarInfo>,
    /// Field name -> parameter name.
    pub field_assignments: IndexMap<String, String>,
    pub documentation: CommentEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructInfo {
    pub name: String,
    pub namespace: Vec<String>,
    pub visibility: Visibility,
    pub documentation: CommentEntry,
    pub fields: Vec<VarInfo>,
    pub constructors: Vec<StructConstructor>,
    /// Set by the struct planner.
    pub requires_interop: bool,
    /// Boundary type name; set by the struct planner.
    pub interop_name: String,
}

impl StructInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            interop_name: name.clone(),
            name,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumEntry {
    pub managed_name: String,
    pub documentation: CommentEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumInfo {
    pub name: String,
    pub managed_name: String,
    pub namespace: Vec<String>,
    pub visibility: Visibility,
    pub documentation: CommentEntry,
    /// Underlying integer type written on the managed enum.
    pub explicit_type: Option<String>,
    pub entries: BTreeMap<i64, EnumEntry>,
}

/// A forward declaration emitted at the top of a generated header.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForwardDecl {
    pub name: String,
    pub is_struct: bool,
}

/// One logical output module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleInfo {
    pub name: String,
    /// Editor modules go to the editor output buckets.
    pub editor: bool,
    pub classes: Vec<ClassInfo>,
    pub structs: Vec<StructInfo>,
    pub enums: Vec<EnumInfo>,
    /// Derived during postprocessing.
    pub header_includes: IndexSet<String>,
    pub source_includes: IndexSet<String>,
    pub forward_decls: BTreeSet<ForwardDecl>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_native_output(&self) -> bool {
        !self.classes.is_empty() || !self.structs.is_empty()
    }

    pub fn has_managed_output(&self) -> bool {
        self.has_native_output() || !self.enums.is_empty()
    }
}

/// Everything the generator knows, shared by every pass.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub modules: IndexMap<String, ModuleInfo>,
    /// Target class name -> free functions to rebind onto it.
    pub external_methods: IndexMap<String, Vec<MethodInfo>>,
    pub types: TypeRegistry,
    pub comments: CommentIndex,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.modules.values().flat_map(|m| m.classes.iter())
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructInfo> {
        self.modules.values().flat_map(|m| m.structs.iter())
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumInfo> {
        self.modules.values().flat_map(|m| m.enums.iter())
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes().find(|c| c.name == name)
    }

    pub fn find_class_mut(&mut self, name: &str) -> Option<&mut ClassInfo> {
        self.modules
            .values_mut()
            .flat_map(|m| m.classes.iter_mut())
            .find(|c| c.name == name)
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructInfo> {
        self.structs().find(|s| s.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&EnumInfo> {
        self.enums().find(|e| e.name == name)
    }
}
