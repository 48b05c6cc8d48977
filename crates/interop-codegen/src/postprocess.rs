//! Cross-reference postprocessor.
//!
//! Runs an ordered sequence of passes over the whole [`SymbolTable`]. Each
//! pass assumes the previous ones completed for every module:
//!
//! 0. shape validation (drops declarations the emitters cannot handle)
//! 1. external method rebinding
//! 2. `@copydoc` resolution
//! 3. unique interop names
//! 4. property synthesis
//! 5. base class flagging
//! 6. enum default rewriting
//! 7. include and forward declaration aggregation
//! 8. struct interop planning
//!
//! Running the postprocessor again on a processed table changes nothing.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;

use crate::comments::CommentEntry;
use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostics, Result};
use crate::model::{
    ClassFlags, ClassInfo, ForwardDecl, MethodFlags, MethodInfo, ModuleInfo, PropertyInfo,
    SymbolTable, VarInfo,
};
use crate::registry::TypeRegistry;
use crate::structs;
use crate::types::{Ownership, TypeCategory, TypeFlags};

/// Run every pass in order.
pub fn run(table: &mut SymbolTable, config: &GeneratorConfig, diags: &mut Diagnostics) -> Result<()> {
    log::debug!("postprocess: validating declarations");
    validate(table, diags);
    log::debug!("postprocess: rebinding external methods");
    rebind_external_methods(table, diags);
    log::debug!("postprocess: resolving @copydoc references");
    resolve_copydocs(table, diags);
    log::debug!("postprocess: assigning interop names");
    assign_interop_names(table);
    log::debug!("postprocess: synthesizing properties");
    synthesize_properties(table, diags);
    log::debug!("postprocess: flagging base classes");
    flag_base_classes(table, diags);
    log::debug!("postprocess: rewriting enum defaults");
    rewrite_enum_defaults(table, diags);
    log::debug!("postprocess: gathering includes");
    gather_includes(table, config)?;
    log::debug!("postprocess: planning struct interop");
    structs::plan(table);
    Ok(())
}

fn method_context(owner: &str, method: &MethodInfo) -> String {
    format!("{owner}::{}", method.source_name)
}

// ── Pass 0: validation ──

/// Problems with a single value; `input` says whether it flows from managed to native.
fn var_problem(var: &VarInfo, types: &TypeRegistry, input: bool) -> Option<String> {
    let Some(category) = types.category(&var.type_name) else {
        return Some(format!(
            "`{}` uses type `{}`, which is not registered",
            var.name, var.type_name
        ));
    };
    if var.flags.ownership_count() > 1 {
        return Some(format!("`{}` has more than one ownership kind", var.name));
    }
    if input && category == TypeCategory::ManagedObject {
        return Some(format!(
            "`{}` of type {} cannot be passed from managed code",
            var.name, var.type_name
        ));
    }
    None
}

/// `pending_receiver` is set for external methods whose first parameter is
/// still the receiver.
fn method_problem(
    method: &MethodInfo,
    types: &TypeRegistry,
    is_event: bool,
    pending_receiver: bool,
) -> Option<String> {
    let getter = method.flags.contains(MethodFlags::PROPERTY_GETTER);
    let setter = method.flags.contains(MethodFlags::PROPERTY_SETTER);
    if getter && setter {
        return Some("method is flagged as both a property getter and setter".to_string());
    }
    let declared_params = method.params.len() - usize::from(pending_receiver && !method.params.is_empty());
    if getter && method.return_value.is_none() {
        return Some("property getter has no return value".to_string());
    }
    if setter && declared_params != 1 {
        return Some("property setter must take exactly one parameter".to_string());
    }

    // Event arguments travel from native to managed code
    let params = method
        .params
        .iter()
        .map(|p| (p, !is_event && !p.flags.is_output()));
    let ret = method.return_value.iter().map(|r| (r, false));
    let receiver = method.receiver.iter().map(|r| (r, false));
    params
        .chain(ret)
        .chain(receiver)
        .find_map(|(var, input)| var_problem(var, types, input))
}

fn constructor_problem(method: &MethodInfo, category: Option<TypeCategory>) -> Option<String> {
    match (method.is_external(), category) {
        (false, Some(TypeCategory::Class)) => None,
        (true, Some(TypeCategory::Class | TypeCategory::Resource)) => None,
        (false, _) => Some("only plain classes can declare constructors".to_string()),
        (true, _) => {
            Some("external constructors are only supported on classes and resources".to_string())
        }
    }
}

fn field_problem(field: &VarInfo, types: &TypeRegistry) -> Option<String> {
    if field.flags.is_output() {
        return Some(format!("field `{}` cannot be an output", field.name));
    }
    if types.category(&field.type_name) == Some(TypeCategory::ManagedObject) {
        return Some(format!(
            "field `{}` of type {} cannot be stored in a struct",
            field.name, field.type_name
        ));
    }
    var_problem(field, types, false)
}

fn validate(table: &mut SymbolTable, diags: &mut Diagnostics) {
    let SymbolTable {
        modules,
        external_methods,
        types,
        ..
    } = table;
    let types: &TypeRegistry = types;

    let mut keep = |problem: Option<String>, context: &str| match problem {
        Some(message) => {
            diags.error(context, format!("{message}; dropped"));
            false
        }
        None => true,
    };

    for module in modules.values_mut() {
        module.classes.retain(|class| {
            let problem = match types.category(&class.name) {
                None => Some("class is not registered as a type".to_string()),
                Some(TypeCategory::SceneObject) => {
                    Some("scene objects are wrapped by the runtime".to_string())
                }
                Some(category) if category.object_handle().is_none() => {
                    Some(format!("a {category:?} cannot be wrapped as a class"))
                }
                Some(_) => None,
            };
            keep(problem, &class.name)
        });

        for class in module.classes.iter_mut() {
            let category = types.category(&class.name);
            let name = class.name.clone();
            class.methods.retain(|m| {
                keep(method_problem(m, types, false, false), &method_context(&name, m))
            });
            class.events.retain(|m| {
                keep(method_problem(m, types, true, false), &method_context(&name, m))
            });
            class.constructors.retain(|m| {
                let problem = method_problem(m, types, false, false)
                    .or_else(|| constructor_problem(m, category));
                keep(problem, &method_context(&name, m))
            });
        }

        for info in module.structs.iter_mut() {
            let name = info.name.clone();
            info.fields.retain(|f| keep(field_problem(f, types), &format!("{name}::{}", f.name)));
            info.constructors.retain(|ctor| {
                let problem = ctor
                    .params
                    .iter()
                    .find_map(|p| var_problem(p, types, true));
                keep(problem, &format!("{name}::{name}"))
            });
        }
    }

    for (target, methods) in external_methods.iter_mut() {
        methods.retain(|m| {
            keep(
                method_problem(m, types, false, !m.is_constructor() && !m.is_static()),
                &method_context(target, m),
            )
        });
    }
}

// ── Pass 1: external rebinding ──

fn rebind_external_methods(table: &mut SymbolTable, diags: &mut Diagnostics) {
    let pending = std::mem::take(&mut table.external_methods);
    for (target, methods) in pending {
        let category = table.types.category(&target);
        let Some(class) = table.find_class_mut(&target) else {
            diags.warning(
                &target,
                format!(
                    "{} external method(s) target a class that is not generated",
                    methods.len()
                ),
            );
            continue;
        };

        for mut method in methods {
            let context = method_context(&target, &method);
            if method.external_class.is_none() {
                diags.error(&context, "external method has no declaring class; dropped");
                continue;
            }
            method.flags |= MethodFlags::EXTERNAL;

            if method.is_constructor() {
                let returns_target = method
                    .return_value
                    .as_ref()
                    .is_some_and(|ret| ret.type_name == target);
                if !returns_target {
                    diags.error(
                        &context,
                        format!("external constructor must return `{target}`; dropped"),
                    );
                    continue;
                }
                if let Some(problem) = constructor_problem(&method, category) {
                    diags.error(&context, format!("{problem}; dropped"));
                    continue;
                }
                method.return_value = None;
                class.constructors.push(method);
                continue;
            }

            if !method.is_static() {
                let first = method.params.first().map(|p| p.type_name.as_str());
                if first != Some(target.as_str()) {
                    diags.error(
                        &context,
                        format!("first parameter of an external method must be `{target}`; dropped"),
                    );
                    continue;
                }
                method.receiver = Some(method.params.remove(0));
            }
            log::debug!("rebound {context} as a member of {target}");
            class.methods.push(method);
        }
    }
}

// ── Pass 2: @copydoc ──

fn resolve_copydocs(table: &mut SymbolTable, diags: &mut Diagnostics) {
    let SymbolTable {
        modules, comments, ..
    } = table;

    let mut resolve = |comment: &mut CommentEntry, namespace: &[String], context: &str| {
        if let Err(failure) = comments.resolve(comment, namespace) {
            diags.warning(context, failure.to_string());
        }
    };

    for module in modules.values_mut() {
        for class in module.classes.iter_mut() {
            let name = class.name.clone();
            let namespace = class.namespace.clone();
            resolve(&mut class.documentation, &namespace, &name);
            for method in class.all_methods_mut() {
                let context = method_context(&name, method);
                resolve(&mut method.documentation, &namespace, &context);
            }
        }
        for info in module.structs.iter_mut() {
            resolve(&mut info.documentation, &info.namespace, &info.name);
            for ctor in info.constructors.iter_mut() {
                resolve(&mut ctor.documentation, &info.namespace, &info.name);
            }
        }
        for info in module.enums.iter_mut() {
            resolve(&mut info.documentation, &info.namespace, &info.name);
            for entry in info.entries.values_mut() {
                let context = format!("{}::{}", info.name, entry.managed_name);
                resolve(&mut entry.documentation, &info.namespace, &context);
            }
        }
    }
}

// ── Pass 3: interop names ──

/// Give every method, constructor and event of a class a distinct name.
/// Collisions get a counter appended, in discovery order.
pub fn assign_interop_names_for(class: &mut ClassInfo) {
    let mut used = HashSet::new();
    for method in class.all_methods_mut() {
        let mut name = method.source_name.clone();
        let mut counter = 0;
        while used.contains(&name) {
            name = format!("{}{counter}", method.source_name);
            counter += 1;
        }
        used.insert(name.clone());
        method.interop_name = name;
    }
}

fn assign_interop_names(table: &mut SymbolTable) {
    for module in table.modules.values_mut() {
        module.classes.iter_mut().for_each(assign_interop_names_for);
    }
}

// ── Pass 4: properties ──

fn synthesize_properties(table: &mut SymbolTable, diags: &mut Diagnostics) {
    for class in table.modules.values_mut().flat_map(|m| m.classes.iter_mut()) {
        let mut properties: IndexMap<String, PropertyInfo> = IndexMap::new();
        let mut rejected = Vec::new();

        for (index, method) in class.methods.iter().enumerate() {
            let is_getter = method.flags.contains(MethodFlags::PROPERTY_GETTER);
            if !is_getter && !method.flags.contains(MethodFlags::PROPERTY_SETTER) {
                continue;
            }
            let value = if is_getter {
                method.return_value.as_ref()
            } else {
                method.params.first()
            };
            let Some(value) = value else {
                continue;
            };
            let accessor = Some(method.interop_name.clone());

            let Some(property) = properties.get_mut(&method.managed_name) else {
                properties.insert(
                    method.managed_name.clone(),
                    PropertyInfo {
                        name: method.managed_name.clone(),
                        type_name: value.type_name.clone(),
                        flags: value.flags - TypeFlags::OUTPUT,
                        is_static: method.is_static(),
                        visibility: method.visibility,
                        getter: if is_getter { accessor.clone() } else { None },
                        setter: if is_getter { None } else { accessor },
                        documentation: CommentEntry::default(),
                    },
                );
                continue;
            };

            let context = method_context(&class.name, method);
            let matches = property.type_name == value.type_name
                && property.flags.is_array() == value.flags.is_array()
                && property.is_static == method.is_static();
            if !matches {
                diags.error(
                    &context,
                    format!(
                        "getter and setter of property `{}` disagree on type or static-ness; dropped",
                        property.name
                    ),
                );
                rejected.push(index);
                continue;
            }

            let slot = if is_getter {
                &mut property.getter
            } else {
                &mut property.setter
            };
            if slot.is_some() {
                diags.error(
                    &context,
                    format!(
                        "property `{}` already has a {}; dropped",
                        property.name,
                        if is_getter { "getter" } else { "setter" }
                    ),
                );
                rejected.push(index);
                continue;
            }
            *slot = accessor;
        }

        for index in rejected.into_iter().rev() {
            class.methods.remove(index);
        }

        let doc_of = |interop: &Option<String>| {
            interop.as_ref().and_then(|name| {
                class
                    .methods
                    .iter()
                    .find(|m| &m.interop_name == name)
                    .map(|m| m.documentation.clone())
            })
        };
        let mut synthesized: Vec<PropertyInfo> = properties.into_values().collect();
        for property in synthesized.iter_mut() {
            let getter = doc_of(&property.getter);
            let setter = doc_of(&property.setter);
            property.documentation = match (getter, setter) {
                (Some(doc), _) if !doc.brief.is_empty() => doc,
                (_, Some(doc)) => doc,
                (Some(doc), None) => doc,
                (None, None) => CommentEntry::default(),
            };
        }
        class.properties = synthesized;
    }
}

// ── Pass 5: base classes ──

fn flag_base_classes(table: &mut SymbolTable, diags: &mut Diagnostics) {
    let derived: Vec<(String, String)> = table
        .classes()
        .filter_map(|c| c.base_class.clone().map(|base| (c.name.clone(), base)))
        .collect();

    for (name, base) in derived {
        match table.find_class_mut(&base) {
            Some(class) => class.flags |= ClassFlags::IS_BASE_OF_SOMETHING,
            None => diags.warning(
                &name,
                format!("base class `{base}` is not generated; deriving from the default wrapper"),
            ),
        }
    }
}

// ── Pass 6: enum defaults ──

/// Enum name -> (managed name, value -> managed entry name).
type EnumTable = HashMap<String, (String, BTreeMap<i64, String>)>;

fn rewrite_enum_default(var: &mut VarInfo, enums: &EnumTable, context: &str, diags: &mut Diagnostics) {
    let Some(value) = var.default_value.as_deref() else {
        return;
    };
    let Some((managed, entries)) = enums.get(&var.type_name) else {
        return;
    };
    if value.starts_with(&format!("{managed}.")) {
        return;
    }

    let entry = value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|number| entries.get(&number));
    match entry {
        Some(entry) => var.default_value = Some(format!("{managed}.{entry}")),
        None => {
            diags.error(
                context,
                format!(
                    "default value `{value}` of `{}` is not an entry of {}; default removed",
                    var.name, var.type_name
                ),
            );
            var.default_value = None;
        }
    }
}

fn rewrite_enum_defaults(table: &mut SymbolTable, diags: &mut Diagnostics) {
    let enums: EnumTable = table
        .enums()
        .map(|info| {
            let entries = info
                .entries
                .iter()
                .map(|(value, entry)| (*value, entry.managed_name.clone()))
                .collect();
            (info.name.clone(), (info.managed_name.clone(), entries))
        })
        .collect();

    for module in table.modules.values_mut() {
        for class in module.classes.iter_mut() {
            let name = class.name.clone();
            for method in class.all_methods_mut() {
                let context = method_context(&name, method);
                for param in method.params.iter_mut() {
                    rewrite_enum_default(param, &enums, &context, diags);
                }
            }
        }
        for info in module.structs.iter_mut() {
            for field in info.fields.iter_mut() {
                let context = format!("{}::{}", info.name, field.name);
                rewrite_enum_default(field, &enums, &context, diags);
            }
            for ctor in info.constructors.iter_mut() {
                for param in ctor.params.iter_mut() {
                    rewrite_enum_default(param, &enums, &info.name, diags);
                }
            }
        }
    }
}

// ── Pass 7: includes ──

/// How a module refers to a type outside its own wrappers.
#[derive(Debug, Default, Clone, Copy)]
struct TypeUse {
    /// Used by value somewhere, so the full declaration is needed.
    by_value: bool,
    /// Appears in an event callback, which is declared in the header.
    in_header: bool,
}

fn collect_uses(module: &ModuleInfo, types: &TypeRegistry) -> BTreeMap<String, TypeUse> {
    let mut uses: BTreeMap<String, TypeUse> = BTreeMap::new();
    let mut record = |var: &VarInfo, in_header: bool| {
        let entry = uses.entry(var.type_name.clone()).or_default();
        entry.by_value |= var.flags.ownership() == Some(Ownership::ReferenceOrValue)
            || types.category(&var.type_name) == Some(TypeCategory::Enum);
        entry.in_header |= in_header;
    };

    for class in &module.classes {
        for method in class.methods.iter().chain(class.constructors.iter()) {
            method.vars().for_each(|v| record(v, false));
        }
        for event in &class.events {
            event.vars().for_each(|v| record(v, true));
        }
    }
    for info in &module.structs {
        info.fields.iter().for_each(|f| record(f, true));
    }
    uses
}

fn gather_includes(table: &mut SymbolTable, config: &GeneratorConfig) -> Result<()> {
    let SymbolTable { modules, types, .. } = table;
    let types: &TypeRegistry = types;

    let mut declaring_module: HashMap<String, String> = HashMap::new();
    for module in modules.values() {
        for name in module
            .classes
            .iter()
            .map(|c| &c.name)
            .chain(module.structs.iter().map(|s| &s.name))
        {
            declaring_module.insert(name.clone(), module.name.clone());
        }
    }
    let wrapper_header = |type_name: &str| {
        types
            .get(type_name)
            .and_then(|info| info.dest_module.clone())
            .or_else(|| declaring_module.get(type_name).cloned())
            .map(|dest| config.generated_header(&dest))
    };

    for module in modules.values_mut() {
        let target = config.target(module.editor);
        let uses = collect_uses(module, types);
        let mut header = Vec::new();
        let mut source = Vec::new();
        let mut forward = Vec::new();

        header.push(target.prerequisites_header.clone());
        source.push(config.native_header_file(&module.name));
        source.push("BsMonoClass.h".to_string());
        source.push("BsMonoUtil.h".to_string());

        for class in &module.classes {
            let info = types.resolve(&class.name, &class.name)?;
            header.push(
                match info.category {
                    TypeCategory::Resource => "BsScriptResource.h",
                    TypeCategory::Component => "BsScriptComponent.h",
                    _ => "BsScriptObject.h",
                }
                .to_string(),
            );
            if let Some(include) = class.base_class.as_deref().and_then(wrapper_header) {
                header.push(include);
            }
            if let Some(decl) = &info.decl_file {
                source.push(decl.clone());
            }
            forward.push(ForwardDecl {
                name: class.name.clone(),
                is_struct: false,
            });
            for method in class.all_methods() {
                if let Some(decl) = method
                    .external_class
                    .as_deref()
                    .and_then(|ext| types.get(ext))
                    .and_then(|ext| ext.decl_file.clone())
                {
                    source.push(decl);
                }
            }
        }

        for info in &module.structs {
            header.push("BsScriptObject.h".to_string());
            match types.get(&info.name).and_then(|t| t.decl_file.clone()) {
                Some(decl) => header.push(decl),
                None => forward.push(ForwardDecl {
                    name: info.name.clone(),
                    is_struct: true,
                }),
            }
        }

        for (type_name, used) in &uses {
            let Some(info) = types.get(type_name) else {
                continue;
            };
            match info.category {
                TypeCategory::Builtin
                | TypeCategory::String
                | TypeCategory::WideString
                | TypeCategory::ManagedObject => continue,
                TypeCategory::Resource => source.push("BsScriptResourceManager.h".to_string()),
                TypeCategory::Component | TypeCategory::SceneObject => {
                    source.push("BsScriptGameObjectManager.h".to_string())
                }
                TypeCategory::Enum | TypeCategory::Struct | TypeCategory::Class => {}
            }

            if used.by_value || info.category == TypeCategory::Enum {
                if let Some(decl) = &info.decl_file {
                    if used.in_header {
                        header.push(decl.clone());
                    } else {
                        source.push(decl.clone());
                    }
                }
            } else if used.in_header {
                forward.push(ForwardDecl {
                    name: type_name.clone(),
                    is_struct: info.category == TypeCategory::Struct,
                });
            }

            if info.category != TypeCategory::Enum {
                source.extend(wrapper_header(type_name));
            }
        }

        module.header_includes = header.into_iter().collect();
        module.source_includes = source.into_iter().collect();
        module.forward_decls = forward.into_iter().collect();
        log::debug!(
            "module {}: {} header include(s), {} source include(s), {} forward declaration(s)",
            module.name,
            module.header_includes.len(),
            module.source_includes.len(),
            module.forward_decls.len()
        );
    }
    Ok(())
}
