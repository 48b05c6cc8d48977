//! Struct interop planning.
//!
//! A struct whose managed layout cannot be shared with the native one as-is
//! crosses the boundary through a flattened `__<Name>Interop` layout. Every
//! value referencing such a struct is marked [`TypeFlags::COMPLEX_STRUCT`] so
//! the marshaling engine routes it through the conversion functions.

use std::collections::HashSet;

use crate::model::{StructInfo, SymbolTable, VarInfo};
use crate::registry::TypeRegistry;
use crate::types::{TypeCategory, TypeFlags, struct_interop_name};

/// Whether any field forces a flattened layout: arrays and builtin, enum or
/// struct fields do; handle and string fields do not.
pub fn requires_flattening(info: &StructInfo, types: &TypeRegistry) -> bool {
    info.fields.iter().any(|field| {
        field.flags.is_array()
            || matches!(
                types.category(&field.type_name),
                Some(TypeCategory::Builtin | TypeCategory::Enum | TypeCategory::Struct)
            )
    })
}

/// Decide flattening for every struct, then mark every referencing value.
pub fn plan(table: &mut SymbolTable) {
    let SymbolTable { modules, types, .. } = table;
    let types: &TypeRegistry = types;

    let mut complex = HashSet::new();
    for info in modules.values_mut().flat_map(|m| m.structs.iter_mut()) {
        info.requires_interop = requires_flattening(info, types);
        info.interop_name = if info.requires_interop {
            complex.insert(info.name.clone());
            struct_interop_name(&info.name)
        } else {
            info.name.clone()
        };
        log::debug!(
            "struct {} crosses the boundary as {}",
            info.name,
            info.interop_name
        );
    }

    let mark = |var: &mut VarInfo| {
        if types.category(&var.type_name) != Some(TypeCategory::Struct) {
            return;
        }
        var.flags
            .set(TypeFlags::COMPLEX_STRUCT, complex.contains(&var.type_name));
    };

    for module in modules.values_mut() {
        for class in module.classes.iter_mut() {
            class.all_methods_mut().flat_map(|m| m.vars_mut()).for_each(mark);
        }
        for info in module.structs.iter_mut() {
            info.fields.iter_mut().for_each(mark);
            info.constructors
                .iter_mut()
                .flat_map(|c| c.params.iter_mut())
                .for_each(mark);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassInfo, MethodInfo, ModuleInfo};
    use crate::registry::TypeInfo;

    fn table() -> SymbolTable {
        let mut table = SymbolTable::new();
        table
            .types
            .register("Bone", TypeInfo::new(TypeCategory::Struct, "Bone"));
        table
            .types
            .register("RenderTarget", TypeInfo::new(TypeCategory::Struct, "RenderTarget"));
        table
            .types
            .register("Texture", TypeInfo::new(TypeCategory::Resource, "Texture"));
        table
            .types
            .register("Skeleton", TypeInfo::new(TypeCategory::Class, "Skeleton"));

        let mut bone = StructInfo::new("Bone");
        bone.fields.push(VarInfo::new("name", "String"));
        bone.fields.push(VarInfo::new("parent", "UINT32"));

        let mut target = StructInfo::new("RenderTarget");
        target.fields.push(VarInfo::new("color", "Texture"));
        target.fields.push(VarInfo::new("depth", "Texture"));

        let mut skeleton = ClassInfo::new("Skeleton");
        skeleton.methods.push(
            MethodInfo::new("getBone")
                .with_param(VarInfo::new("idx", "UINT32"))
                .with_return(VarInfo::new("__output", "Bone")),
        );
        skeleton.methods.push(
            MethodInfo::new("setTarget").with_param(VarInfo::new("target", "RenderTarget")),
        );

        let mut module = ModuleInfo::new("Skeleton");
        module.structs.push(bone);
        module.structs.push(target);
        module.classes.push(skeleton);
        table.modules.insert(module.name.clone(), module);
        table
    }

    #[test]
    fn test_builtin_field_requires_flattening() {
        let mut table = table();
        plan(&mut table);
        let bone = table.find_struct("Bone").unwrap();
        assert!(bone.requires_interop);
        assert_eq!(bone.interop_name, "__BoneInterop");
    }

    #[test]
    fn test_handle_only_struct_keeps_its_name() {
        let mut table = table();
        plan(&mut table);
        let target = table.find_struct("RenderTarget").unwrap();
        assert!(!target.requires_interop);
        assert_eq!(target.interop_name, "RenderTarget");
    }

    #[test]
    fn test_referencing_values_are_marked() {
        let mut table = table();
        plan(&mut table);
        let class = table.find_class("Skeleton").unwrap();
        let ret = class.methods[0].return_value.as_ref().unwrap();
        assert!(ret.flags.is_complex());
        assert!(!class.methods[0].params[0].flags.is_complex());
        assert!(!class.methods[1].params[0].flags.is_complex());
    }

    #[test]
    fn test_array_field_requires_flattening() {
        let types = TypeRegistry::with_builtins();
        let mut info = StructInfo::new("Names");
        info.fields.push(VarInfo::new("names", "String"));
        assert!(!requires_flattening(&info, &types));
        info.fields[0] = VarInfo::new("names", "String").array();
        assert!(requires_flattening(&info, &types));
    }

    #[test]
    fn test_planning_twice_is_stable() {
        let mut table = table();
        plan(&mut table);
        let first: Vec<_> = table.structs().cloned().collect();
        plan(&mut table);
        let second: Vec<_> = table.structs().cloned().collect();
        assert_eq!(first, second);
    }
}
