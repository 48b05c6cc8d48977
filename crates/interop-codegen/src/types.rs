//! Type taxonomy shared by every stage of the generator.
//!
//! A declared type name resolves (through the [`TypeRegistry`](crate::registry::TypeRegistry))
//! to a [`TypeCategory`]. Together with the [`TypeFlags`] of a parameter or field,
//! the category decides how a value is represented at the interop boundary and
//! how it is forwarded to the native call.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{GenerateError, Result};

/// Closed set of type categories understood by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    Builtin,
    Enum,
    Struct,
    String,
    WideString,
    Class,
    Resource,
    Component,
    SceneObject,
    /// Opaque wrapper reference, only ever passed around as a pointer.
    ManagedObject,
}

/// The object-handle subset of [`TypeCategory`].
///
/// Every object handle has a managed wrapper type and a native value that the
/// wrapper owns or refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectHandle {
    Class,
    Resource,
    Component,
    SceneObject,
}

impl TypeCategory {
    pub fn object_handle(self) -> Option<ObjectHandle> {
        match self {
            TypeCategory::Class => Some(ObjectHandle::Class),
            TypeCategory::Resource => Some(ObjectHandle::Resource),
            TypeCategory::Component => Some(ObjectHandle::Component),
            TypeCategory::SceneObject => Some(ObjectHandle::SceneObject),
            TypeCategory::Builtin
            | TypeCategory::Enum
            | TypeCategory::Struct
            | TypeCategory::String
            | TypeCategory::WideString
            | TypeCategory::ManagedObject => None,
        }
    }

    /// Whether a value of this category can be the direct return value of an
    /// interop function. Anything else is written through a trailing
    /// `__output` parameter.
    pub fn can_be_returned(self, flags: TypeFlags) -> bool {
        flags.is_array() || self != TypeCategory::Struct
    }

    /// Non-array structs, which cross the boundary by reference.
    pub fn is_plain_struct(self, flags: TypeFlags) -> bool {
        self == TypeCategory::Struct && !flags.is_array()
    }
}

impl ObjectHandle {
    pub fn category(self) -> TypeCategory {
        match self {
            ObjectHandle::Class => TypeCategory::Class,
            ObjectHandle::Resource => TypeCategory::Resource,
            ObjectHandle::Component => TypeCategory::Component,
            ObjectHandle::SceneObject => TypeCategory::SceneObject,
        }
    }

    /// Native value type held by the wrapper of `type_name`.
    pub fn wrapped_type(self, type_name: &str) -> String {
        match self {
            ObjectHandle::Class => format!("SPtr<{type_name}>"),
            ObjectHandle::Resource => format!("ResourceHandle<{type_name}>"),
            ObjectHandle::Component | ObjectHandle::SceneObject => {
                format!("GameObjectHandle<{type_name}>")
            }
        }
    }

    /// Wrapper method returning the native value.
    pub fn accessor(self) -> &'static str {
        match self {
            ObjectHandle::Class => "getInternal",
            ObjectHandle::Resource | ObjectHandle::Component | ObjectHandle::SceneObject => {
                "getHandle"
            }
        }
    }

    /// Handles go through an engine handle type, classes through a shared pointer.
    pub fn is_handle(self) -> bool {
        self != ObjectHandle::Class
    }
}

/// How the native declaration owns or refers to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    RawPointer,
    ReferenceOrValue,
    SharedPointer,
    ResourceHandle,
    GameObjectHandle,
}

impl Ownership {
    pub fn flag(self) -> TypeFlags {
        match self {
            Ownership::RawPointer => TypeFlags::OWNED_BY_RAW_POINTER,
            Ownership::ReferenceOrValue => TypeFlags::OWNED_BY_REFERENCE_OR_VALUE,
            Ownership::SharedPointer => TypeFlags::OWNED_BY_SHARED_POINTER,
            Ownership::ResourceHandle => TypeFlags::OWNED_BY_RESOURCE_HANDLE,
            Ownership::GameObjectHandle => TypeFlags::OWNED_BY_GAME_OBJECT_HANDLE,
        }
    }
}

bitflags! {
    /// Orthogonal properties of a parameter, return value or field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        const ARRAY = 1 << 0;
        const OUTPUT = 1 << 1;
        const OWNED_BY_RAW_POINTER = 1 << 2;
        const OWNED_BY_REFERENCE_OR_VALUE = 1 << 3;
        const OWNED_BY_SHARED_POINTER = 1 << 4;
        const OWNED_BY_RESOURCE_HANDLE = 1 << 5;
        const OWNED_BY_GAME_OBJECT_HANDLE = 1 << 6;
        /// Set by the struct planner on values whose struct needs a flattened layout.
        const COMPLEX_STRUCT = 1 << 7;

        const OWNERSHIP = Self::OWNED_BY_RAW_POINTER.bits()
            | Self::OWNED_BY_REFERENCE_OR_VALUE.bits()
            | Self::OWNED_BY_SHARED_POINTER.bits()
            | Self::OWNED_BY_RESOURCE_HANDLE.bits()
            | Self::OWNED_BY_GAME_OBJECT_HANDLE.bits();
    }
}

impl TypeFlags {
    pub fn is_array(self) -> bool {
        self.contains(TypeFlags::ARRAY)
    }

    pub fn is_output(self) -> bool {
        self.contains(TypeFlags::OUTPUT)
    }

    pub fn is_complex(self) -> bool {
        self.contains(TypeFlags::COMPLEX_STRUCT)
    }

    /// Number of ownership bits set. Valid declarations carry at most one.
    pub fn ownership_count(self) -> u32 {
        (self & TypeFlags::OWNERSHIP).bits().count_ones()
    }

    /// The single ownership kind, if exactly one is set.
    pub fn ownership(self) -> Option<Ownership> {
        if self.ownership_count() != 1 {
            return None;
        }
        [
            Ownership::RawPointer,
            Ownership::ReferenceOrValue,
            Ownership::SharedPointer,
            Ownership::ResourceHandle,
            Ownership::GameObjectHandle,
        ]
        .into_iter()
        .find(|o| self.contains(o.flag()))
    }

    /// Replace whatever ownership is set with `ownership`.
    pub fn with_ownership(self, ownership: Ownership) -> Self {
        (self - TypeFlags::OWNERSHIP) | ownership.flag()
    }
}

/// Shape of a value at the interop boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Value,
    PointerToValue,
    ArrayHandle,
    PointerToArrayHandle,
}

/// Boundary shape for a value of `category`; `struct_field` selects the
/// layout used inside flattened structs.
pub fn boundary(category: TypeCategory, flags: TypeFlags, struct_field: bool) -> Boundary {
    let escalate = flags.is_output() && !struct_field;
    if flags.is_array() {
        return if escalate {
            Boundary::PointerToArrayHandle
        } else {
            Boundary::ArrayHandle
        };
    }
    match category {
        TypeCategory::Struct => {
            if struct_field {
                Boundary::Value
            } else {
                Boundary::PointerToValue
            }
        }
        TypeCategory::Builtin
        | TypeCategory::Enum
        | TypeCategory::String
        | TypeCategory::WideString
        | TypeCategory::Class
        | TypeCategory::Resource
        | TypeCategory::Component
        | TypeCategory::SceneObject
        | TypeCategory::ManagedObject => {
            if escalate {
                Boundary::PointerToValue
            } else {
                Boundary::Value
            }
        }
    }
}

/// Name of the flattened boundary layout of a struct.
pub fn struct_interop_name(name: &str) -> String {
    format!("__{name}Interop")
}

/// Name of the native wrapper class of a type.
pub fn wrapper_name(name: &str) -> String {
    format!("Script{name}")
}

/// Native type used for a value at the boundary.
pub fn boundary_type(
    type_name: &str,
    category: TypeCategory,
    flags: TypeFlags,
    struct_field: bool,
) -> String {
    let base = if flags.is_array() {
        "MonoArray*".to_string()
    } else {
        match category {
            TypeCategory::Builtin | TypeCategory::Enum => type_name.to_string(),
            TypeCategory::Struct => {
                if flags.is_complex() {
                    struct_interop_name(type_name)
                } else {
                    type_name.to_string()
                }
            }
            TypeCategory::String | TypeCategory::WideString => "MonoString*".to_string(),
            TypeCategory::Class
            | TypeCategory::Resource
            | TypeCategory::Component
            | TypeCategory::SceneObject
            | TypeCategory::ManagedObject => "MonoObject*".to_string(),
        }
    };

    match boundary(category, flags, struct_field) {
        Boundary::Value | Boundary::ArrayHandle => base,
        Boundary::PointerToValue | Boundary::PointerToArrayHandle => format!("{base}*"),
    }
}

/// Native type of a single (non-array) value of `category`.
pub fn native_type(type_name: &str, category: TypeCategory) -> String {
    match category.object_handle() {
        Some(handle) => handle.wrapped_type(type_name),
        None if category == TypeCategory::ManagedObject => format!("{type_name}*"),
        None => type_name.to_string(),
    }
}

/// How a managed-side type reference is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagedStyle {
    /// Prefix outputs with `out`.
    pub parameter: bool,
    /// Pass plain structs with `ref`, as interop externs do.
    pub interop: bool,
}

impl ManagedStyle {
    pub const PLAIN: ManagedStyle = ManagedStyle {
        parameter: false,
        interop: false,
    };
    pub const PARAMETER: ManagedStyle = ManagedStyle {
        parameter: true,
        interop: false,
    };
    pub const INTEROP: ManagedStyle = ManagedStyle {
        parameter: true,
        interop: true,
    };
}

/// Managed type reference for a value whose managed type name is `managed_name`.
pub fn managed_type(
    managed_name: &str,
    category: TypeCategory,
    flags: TypeFlags,
    style: ManagedStyle,
) -> String {
    let mut output = String::new();
    if style.parameter && flags.is_output() {
        output.push_str("out ");
    } else if style.interop && category.is_plain_struct(flags) {
        output.push_str("ref ");
    }
    output.push_str(managed_name);
    if flags.is_array() {
        output.push_str("[]");
    }
    output
}

/// Whether a forwarded expression is a value or a pointer to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    Value,
    Pointer,
}

/// Translate a marshaled boundary value into the argument passed to the
/// native call, following the native declaration's ownership kind.
///
/// `expr` is either the boundary parameter itself or the native temporary the
/// marshaling engine converted it into; `shape` says which one it is.
pub fn forward_to_native(
    expr: &str,
    category: TypeCategory,
    flags: TypeFlags,
    shape: ArgShape,
    context: &str,
) -> Result<String> {
    if flags.is_array() {
        return Ok(match flags.ownership() {
            Some(Ownership::RawPointer) => format!("&{expr}"),
            _ => expr.to_string(),
        });
    }

    let ownership = flags.ownership().ok_or_else(|| {
        GenerateError::fatal(
            context,
            format!("`{expr}` has no ownership kind, cannot forward it to the native call"),
        )
    })?;

    let invalid = || {
        GenerateError::fatal(
            context,
            format!("ownership {ownership:?} is not valid for a {category:?} value"),
        )
    };

    match category {
        TypeCategory::Builtin
        | TypeCategory::Enum
        | TypeCategory::Struct
        | TypeCategory::String
        | TypeCategory::WideString => match (ownership, shape) {
            (Ownership::RawPointer, ArgShape::Pointer) => Ok(expr.to_string()),
            (Ownership::RawPointer, ArgShape::Value) => Ok(format!("&{expr}")),
            (Ownership::ReferenceOrValue, ArgShape::Pointer) => Ok(format!("*{expr}")),
            (Ownership::ReferenceOrValue, ArgShape::Value) => Ok(expr.to_string()),
            _ => Err(invalid()),
        },
        TypeCategory::Resource | TypeCategory::Component | TypeCategory::SceneObject => {
            match ownership {
                Ownership::ResourceHandle | Ownership::GameObjectHandle => Ok(expr.to_string()),
                Ownership::SharedPointer => Ok(format!("{expr}.getInternalPtr()")),
                Ownership::RawPointer => Ok(format!("{expr}.get()")),
                Ownership::ReferenceOrValue => Ok(format!("*{expr}")),
            }
        }
        TypeCategory::Class => match ownership {
            Ownership::RawPointer => Ok(format!("{expr}.get()")),
            Ownership::SharedPointer => Ok(expr.to_string()),
            Ownership::ReferenceOrValue => Ok(format!("*{expr}")),
            Ownership::ResourceHandle | Ownership::GameObjectHandle => Err(invalid()),
        },
        TypeCategory::ManagedObject => Ok(if flags.is_output() {
            format!("&{expr}")
        } else {
            expr.to_string()
        }),
    }
}

/// Translate a native value (callback argument) into the expression handed
/// to the managed side.
pub fn forward_to_managed(
    expr: &str,
    category: TypeCategory,
    flags: TypeFlags,
    context: &str,
) -> Result<String> {
    if flags.is_array() {
        return Ok(expr.to_string());
    }

    let is_pointer = match flags.ownership() {
        Some(Ownership::RawPointer) => true,
        Some(_) => false,
        None if category.object_handle().is_some() || category == TypeCategory::ManagedObject => {
            false
        }
        None => {
            return Err(GenerateError::fatal(
                context,
                format!("`{expr}` has no ownership kind, cannot pass it to the managed side"),
            ));
        }
    };

    Ok(match category {
        TypeCategory::Builtin | TypeCategory::Enum if is_pointer => format!("*{expr}"),
        TypeCategory::Struct if !is_pointer => format!("&{expr}"),
        _ => expr.to_string(),
    })
}
