//! Managed emitter: the C# surface of every wrapped class, struct and enum.
//!
//! Classes delegate to `[MethodImpl(MethodImplOptions.InternalCall)]` externs
//! that bind to the native `Internal_<name>` entry points produced by the
//! [`native`](crate::native) emitter.

use crate::code::Block;
use crate::comments::{CommentEntry, xml_doc};
use crate::config::GeneratorConfig;
use crate::diagnostics::Result;
use crate::model::{
    ClassInfo, EnumInfo, MethodInfo, ModuleInfo, PropertyInfo, StructConstructor, StructInfo,
    SymbolTable, VarInfo, Visibility,
};
use crate::signature::OUTPUT_NAME;
use crate::types::{ManagedStyle, TypeCategory, TypeFlags, managed_type};

const EXTERN_ATTRIBUTE: &str = "[MethodImpl(MethodImplOptions.InternalCall)]";

/// Renders managed source from a postprocessed [`SymbolTable`].
#[derive(Debug, Clone, Copy)]
pub struct ManagedEmitter<'a> {
    table: &'a SymbolTable,
    config: &'a GeneratorConfig,
}

/// Managed type of a value, and whether it can be returned directly.
struct ManagedVar {
    category: TypeCategory,
    flags: TypeFlags,
    managed_name: String,
}

impl ManagedVar {
    fn render(&self, style: ManagedStyle) -> String {
        managed_type(&self.managed_name, self.category, self.flags, style)
    }

    fn can_be_returned(&self) -> bool {
        self.category.can_be_returned(self.flags)
    }

    fn is_plain_struct(&self) -> bool {
        self.category.is_plain_struct(self.flags)
    }
}

impl<'a> ManagedEmitter<'a> {
    pub fn new(table: &'a SymbolTable, config: &'a GeneratorConfig) -> Self {
        Self { table, config }
    }

    fn var(&self, type_name: &str, flags: TypeFlags, context: &str) -> Result<ManagedVar> {
        let info = self.table.types.resolve(type_name, context)?;
        Ok(ManagedVar {
            category: info.category,
            flags,
            managed_name: info.managed_name.clone(),
        })
    }

    fn managed_var(&self, var: &VarInfo, context: &str) -> Result<ManagedVar> {
        self.var(&var.type_name, var.flags, context)
    }

    /// XML documentation for a declaration nested `depth` levels deep.
    fn doc(&self, comment: &CommentEntry, depth: usize) -> Block {
        xml_doc(
            comment,
            self.config.doc_wrap_column,
            self.config.indent.width() * depth,
        )
    }

    /// The complete managed source file of a module.
    pub fn file(&self, module: &ModuleInfo) -> Result<String> {
        log::debug!("emitting managed source of module {}", module.name);
        let target = self.config.target(module.editor);

        let mut types = Vec::new();
        for class in &module.classes {
            types.push(self.class(class)?);
        }
        for info in &module.structs {
            types.push(self.structure(info)?);
        }
        for info in &module.enums {
            types.push(self.enumeration(info));
        }

        let mut file = Block::new();
        for line in self.config.banner("//") {
            file.line(line);
        }
        file.line("using System;");
        file.line("using System.Runtime.CompilerServices;");
        file.line("using System.Runtime.InteropServices;");
        if module.editor {
            file.line(format!("using {};", self.config.engine.managed_namespace));
        }
        file.blank();
        file.scope(
            format!("namespace {}", target.managed_namespace),
            Block::join(types),
        );
        Ok(file.render(self.config.indent))
    }

    // ── Parameters ──

    fn params(&self, method: &MethodInfo, interop: bool, context: &str) -> Result<Vec<String>> {
        let style = if interop {
            ManagedStyle::INTEROP
        } else {
            ManagedStyle::PARAMETER
        };
        method
            .params
            .iter()
            .map(|param| {
                let mut text = format!(
                    "{} {}",
                    self.managed_var(param, context)?.render(style),
                    param.name
                );
                if let Some(default) = param.default_value.as_ref().filter(|_| !interop) {
                    text.push_str(&format!(" = {default}"));
                }
                Ok(text)
            })
            .collect()
    }

    /// Arguments forwarded from a public member to its extern.
    fn args(&self, method: &MethodInfo, context: &str) -> Result<Vec<String>> {
        method
            .params
            .iter()
            .map(|param| {
                let var = self.managed_var(param, context)?;
                Ok(if param.flags.is_output() {
                    format!("out {}", param.name)
                } else if var.is_plain_struct() {
                    format!("ref {}", param.name)
                } else {
                    param.name.clone()
                })
            })
            .collect()
    }

    fn return_var(&self, method: &MethodInfo, context: &str) -> Result<Option<ManagedVar>> {
        match &method.return_value {
            Some(ret) if !method.is_constructor() => Ok(Some(self.managed_var(ret, context)?)),
            _ => Ok(None),
        }
    }

    // ── Classes ──

    /// `private static extern` declaration binding to `Internal_<name>`.
    fn extern_decl(&self, class: &ClassInfo, method: &MethodInfo) -> Result<Block> {
        let context = format!("{}::{}", class.name, method.source_name);
        let ret = self.return_var(method, &context)?;

        let mut params = Vec::new();
        if method.is_constructor() {
            params.push(format!(
                "{} managedInstance",
                self.table.types.managed_name(&class.name)
            ));
        } else if !method.is_static() && !class.is_module() {
            params.push("IntPtr thisPtr".to_string());
        }
        params.extend(self.params(method, true, &context)?);

        let return_type = match &ret {
            Some(var) if var.can_be_returned() => var.render(ManagedStyle::PLAIN),
            Some(var) => {
                params.push(format!("out {} {OUTPUT_NAME}", var.render(ManagedStyle::PLAIN)));
                "void".to_string()
            }
            None => "void".to_string(),
        };

        let mut block = Block::new();
        block.line(EXTERN_ATTRIBUTE);
        block.line(format!(
            "private static extern {return_type} Internal_{}({});",
            method.interop_name,
            params.join(", ")
        ));
        Ok(block)
    }

    fn constructor(&self, class: &ClassInfo, ctor: &MethodInfo) -> Result<Block> {
        let context = format!("{}::{}", class.name, ctor.source_name);
        let mut args = vec!["this".to_string()];
        args.extend(self.args(ctor, &context)?);

        let mut block = self.doc(&ctor.documentation, 2);
        block.scope(
            format!(
                "{} {}({})",
                ctor.visibility.keyword(),
                self.table.types.managed_name(&class.name),
                self.params(ctor, false, &context)?.join(", ")
            ),
            Block::from(vec![format!(
                "Internal_{}({});",
                ctor.interop_name,
                args.join(", ")
            )]),
        );
        Ok(block)
    }

    fn method(&self, class: &ClassInfo, method: &MethodInfo) -> Result<Block> {
        let context = format!("{}::{}", class.name, method.source_name);
        let ret = self.return_var(method, &context)?;
        let is_static = method.is_static() || class.is_module();
        let return_type = ret
            .as_ref()
            .map(|var| var.render(ManagedStyle::PLAIN))
            .unwrap_or_else(|| "void".to_string());

        let mut args = Vec::new();
        if !is_static {
            args.push("mCachedPtr".to_string());
        }
        args.extend(self.args(method, &context)?);

        let call = format!("Internal_{}", method.interop_name);
        let mut body = Block::new();
        match &ret {
            Some(var) if !var.can_be_returned() => {
                args.push("out temp".to_string());
                body.line(format!("{return_type} temp;"));
                body.line(format!("{call}({});", args.join(", ")));
                body.line("return temp;");
            }
            Some(_) => {
                body.line(format!("return {call}({});", args.join(", ")));
            }
            None => {
                body.line(format!("{call}({});", args.join(", ")));
            }
        }

        let mut block = self.doc(&method.documentation, 2);
        block.scope(
            format!(
                "{} {}{return_type} {}({})",
                method.visibility.keyword(),
                if is_static { "static " } else { "" },
                method.managed_name,
                self.params(method, false, &context)?.join(", ")
            ),
            body,
        );
        Ok(block)
    }

    fn property(&self, class: &ClassInfo, property: &PropertyInfo, is_component: bool) -> Result<Block> {
        let context = format!("{}::{}", class.name, property.name);
        let var = self.var(&property.type_name, property.flags, &context)?;
        let type_name = var.render(ManagedStyle::PLAIN);
        let is_static = property.is_static || class.is_module();
        let receiver = if is_static { "" } else { "mCachedPtr" };

        let mut body = Block::new();
        if let Some(getter) = &property.getter {
            if var.can_be_returned() {
                body.line(format!("get {{ return Internal_{getter}({receiver}); }}"));
            } else {
                let args = if is_static {
                    "out temp".to_string()
                } else {
                    format!("{receiver}, out temp")
                };
                let mut get = Block::new();
                get.line(format!("{type_name} temp;"));
                get.line(format!("Internal_{getter}({args});"));
                get.line("return temp;");
                body.scope("get", get);
            }
        }
        if let Some(setter) = &property.setter {
            let value = if var.is_plain_struct() { "ref value" } else { "value" };
            let args = if is_static {
                value.to_string()
            } else {
                format!("{receiver}, {value}")
            };
            body.line(format!("set {{ Internal_{setter}({args}); }}"));
        }

        let mut block = self.doc(&property.documentation, 2);
        if is_component && property.visibility == Visibility::Public {
            block.line("[ShowInInspector]");
        }
        block.scope(
            format!(
                "{} {}{type_name} {}",
                property.visibility.keyword(),
                if is_static { "static " } else { "" },
                property.name
            ),
            body,
        );
        Ok(block)
    }

    /// Event declaration and the relay method its native thunk invokes.
    fn event(&self, class: &ClassInfo, event: &MethodInfo) -> Result<(Block, Block)> {
        let context = format!("{}::{}", class.name, event.source_name);
        let is_static = event.is_static() || class.is_module();
        let modifier = if is_static { "static " } else { "" };

        let types = event
            .params
            .iter()
            .map(|p| Ok(self.managed_var(p, &context)?.render(ManagedStyle::PLAIN)))
            .collect::<Result<Vec<_>>>()?;
        let action = if types.is_empty() {
            "Action".to_string()
        } else {
            format!("Action<{}>", types.join(", "))
        };

        let mut decl = self.doc(&event.documentation, 2);
        decl.line(format!(
            "{} {modifier}event {action} {};",
            event.visibility.keyword(),
            event.managed_name
        ));

        let names: Vec<&str> = event.params.iter().map(|p| p.name.as_str()).collect();
        let mut relay = Block::new();
        relay.scope(
            format!(
                "private {modifier}void Internal_{}({})",
                event.interop_name,
                self.params(event, true, &context)?.join(", ")
            ),
            Block::from(vec![format!(
                "{}?.Invoke({});",
                event.managed_name,
                names.join(", ")
            )]),
        );
        Ok((decl, relay))
    }

    fn base_type(&self, class: &ClassInfo) -> String {
        if let Some(base) = &class.base_class {
            return self.table.types.managed_name(base).to_string();
        }
        match self.table.types.category(&class.name) {
            Some(TypeCategory::Resource) => "Resource".to_string(),
            Some(TypeCategory::Component) => "Component".to_string(),
            _ => "ScriptObject".to_string(),
        }
    }

    pub fn class(&self, class: &ClassInfo) -> Result<Block> {
        let name = self.table.types.managed_name(&class.name);
        let is_component = self.table.types.category(&class.name) == Some(TypeCategory::Component);

        let runtime_ctor = class.runtime_constructor();
        let mut ctors = vec![Block::from(vec![format!(
            "private {name}({}) {{ }}",
            self.params(&runtime_ctor, false, &class.name)?.join(", ")
        )])];
        let mut properties = Vec::new();
        let mut events = Vec::new();
        let mut methods = Vec::new();
        let mut interops = Vec::new();

        for ctor in &class.constructors {
            interops.push(self.extern_decl(class, ctor)?);
            if !ctor.is_interop_only() {
                ctors.push(self.constructor(class, ctor)?);
            }
        }
        for method in &class.methods {
            interops.push(self.extern_decl(class, method)?);
            if !method.is_interop_only() && !method.is_property() {
                methods.push(self.method(class, method)?);
            }
        }
        for property in &class.properties {
            properties.push(self.property(class, property, is_component)?);
        }
        for event in &class.events {
            let (decl, relay) = self.event(class, event)?;
            events.push(decl);
            interops.push(relay);
        }

        let body = Block::join(
            [ctors, properties, events, methods, interops]
                .into_iter()
                .flatten(),
        );
        let mut block = self.doc(&class.documentation, 1);
        block.scope(
            format!(
                "{} partial class {name} : {}",
                class.visibility.keyword(),
                self.base_type(class)
            ),
            body,
        );
        Ok(block)
    }

    // ── Structs ──

    /// Literal a field starts with when no constructor assigns it.
    fn default_value(&self, field: &VarInfo, context: &str) -> Result<String> {
        if let Some(value) = &field.default_value {
            return Ok(value.clone());
        }
        let var = self.managed_var(field, context)?;
        if field.flags.is_array() {
            return Ok("null".to_string());
        }
        Ok(match var.category {
            TypeCategory::Builtin if field.type_name == "bool" => "false".to_string(),
            TypeCategory::Builtin => "0".to_string(),
            TypeCategory::Enum => format!("({})0", var.managed_name),
            TypeCategory::Struct => format!("new {}()", var.managed_name),
            _ => "null".to_string(),
        })
    }

    fn struct_constructor(&self, info: &StructInfo, ctor: &StructConstructor) -> Result<Block> {
        let name = self.table.types.managed_name(&info.name);
        let parameterless = ctor.params.is_empty();
        let target = if parameterless { "value" } else { "this" };

        let mut body = Block::new();
        if parameterless {
            body.line(format!("{name} value = new {name}();"));
        }
        for field in &info.fields {
            let context = format!("{}::{}", info.name, field.name);
            let value = match ctor.field_assignments.get(&field.name) {
                Some(param) => param.clone(),
                None => self.default_value(field, &context)?,
            };
            body.line(format!("{target}.{} = {value};", field.name));
        }
        if parameterless {
            body.blank();
            body.line("return value;");
        }

        let mut block = Block::new();
        if !ctor.documentation.is_empty() {
            block.append(self.doc(&ctor.documentation, 2));
        } else if parameterless {
            block.line("/// <summary>Initializes the struct with default values.</summary>");
        }
        let header = if parameterless {
            format!("public static {name} Default()")
        } else {
            let params = ctor
                .params
                .iter()
                .map(|param| {
                    let var = self.managed_var(param, &info.name)?;
                    let mut text = format!("{} {}", var.render(ManagedStyle::PLAIN), param.name);
                    if let Some(default) = &param.default_value {
                        text.push_str(&format!(" = {default}"));
                    }
                    Ok(text)
                })
                .collect::<Result<Vec<_>>>()?;
            format!("public {name}({})", params.join(", "))
        };
        block.scope(header, body);
        Ok(block)
    }

    pub fn structure(&self, info: &StructInfo) -> Result<Block> {
        let name = self.table.types.managed_name(&info.name);

        let mut members = Vec::new();
        for ctor in &info.constructors {
            members.push(self.struct_constructor(info, ctor)?);
        }
        let mut fields = Block::new();
        for field in &info.fields {
            let context = format!("{}::{}", info.name, field.name);
            let var = self.managed_var(field, &context)?;
            fields.line(format!("public {} {};", var.render(ManagedStyle::PLAIN), field.name));
        }
        members.push(fields);

        let mut block = self.doc(&info.documentation, 1);
        block.line("[StructLayout(LayoutKind.Sequential), SerializeObject]");
        block.scope(
            format!("{} partial struct {name}", info.visibility.keyword()),
            Block::join(members),
        );
        Ok(block)
    }

    // ── Enums ──

    pub fn enumeration(&self, info: &EnumInfo) -> Block {
        let mut entries = Block::new();
        let count = info.entries.len();
        for (i, (value, entry)) in info.entries.iter().enumerate() {
            if !entry.documentation.is_empty() {
                entries.append(self.doc(&entry.documentation, 2));
            }
            let separator = if i + 1 < count { "," } else { "" };
            entries.line(format!("{} = {value}{separator}", entry.managed_name));
        }

        let mut header = format!("{} enum {}", info.visibility.keyword(), info.managed_name);
        if let Some(underlying) = &info.explicit_type {
            header.push_str(&format!(" : {underlying}"));
        }
        let mut block = self.doc(&info.documentation, 1);
        block.scope(header, entries);
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Indent;
    use crate::model::{ClassFlags, EnumEntry, MethodFlags};
    use crate::registry::TypeInfo;

    fn table() -> SymbolTable {
        let mut table = SymbolTable::new();
        let types = &mut table.types;
        types.register("Texture", TypeInfo::new(TypeCategory::Resource, "Texture"));
        types.register("Font", TypeInfo::new(TypeCategory::Class, "Font"));
        types.register("BitmapFont", TypeInfo::new(TypeCategory::Class, "BitmapFont"));
        types.register("CCamera", TypeInfo::new(TypeCategory::Component, "Camera"));
        types.register("Input", TypeInfo::new(TypeCategory::Class, "Input"));
        types.register("Vector2I", TypeInfo::new(TypeCategory::Struct, "Vector2I"));
        types.register("Color", TypeInfo::new(TypeCategory::Struct, "Color"));
        types.register("PixelFormat", TypeInfo::new(TypeCategory::Enum, "PixelFormat"));
        table
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            indent: Indent::Spaces(4),
            ..GeneratorConfig::default()
        }
    }

    fn render(block: &Block) -> String {
        block.render(Indent::Spaces(4))
    }

    fn named(mut class: ClassInfo) -> ClassInfo {
        crate::postprocess::assign_interop_names_for(&mut class);
        class
    }

    // ── Classes ──

    #[test]
    fn test_class_members_and_externs() {
        let table = table();
        let config = config();
        let emitter = ManagedEmitter::new(&table, &config);

        let mut font = ClassInfo::new("Font");
        font.constructors.push(
            MethodInfo::constructor("Font")
                .with_param(VarInfo::new("size", "UINT32").with_default("12")),
        );
        font.methods.push(
            MethodInfo::new("getGlyph")
                .with_managed_name("GetGlyph")
                .with_param(VarInfo::new("index", "UINT32"))
                .with_return(VarInfo::new("", "Vector2I")),
        );
        font.methods.push(
            MethodInfo::new("countGlyphs")
                .with_managed_name("CountGlyphs")
                .with_return(VarInfo::new("", "UINT32")),
        );
        let text = render(&emitter.class(&named(font)).unwrap());

        assert!(text.contains("public partial class Font : ScriptObject\n{\n"));
        assert!(text.contains("    private Font(bool __dummy0) { }\n"));
        assert!(text.contains(
            "    public Font(uint size = 12)\n    {\n        Internal_Font(this, size);\n    }\n"
        ));
        assert!(text.contains(
            "    public Vector2I GetGlyph(uint index)\n    {\n        \
             Vector2I temp;\n        \
             Internal_getGlyph(mCachedPtr, index, out temp);\n        \
             return temp;\n    }\n"
        ));
        assert!(text.contains("        return Internal_countGlyphs(mCachedPtr);\n"));
        assert!(text.contains(
            "    [MethodImpl(MethodImplOptions.InternalCall)]\n    \
             private static extern void Internal_Font(Font managedInstance, uint size);\n"
        ));
        assert!(text.contains(
            "private static extern void Internal_getGlyph(IntPtr thisPtr, uint index, out Vector2I __output);"
        ));
        assert!(text.contains("private static extern uint Internal_countGlyphs(IntPtr thisPtr);"));

        // Constructors come before methods, externs last
        let ctor = text.find("public Font(").unwrap();
        let method = text.find("public Vector2I GetGlyph").unwrap();
        let interop = text.find("[MethodImpl").unwrap();
        assert!(ctor < method && method < interop);
    }

    #[test]
    fn test_plain_struct_params_pass_by_ref() {
        let table = table();
        let config = config();
        let emitter = ManagedEmitter::new(&table, &config);

        let mut texture = ClassInfo::new("Texture");
        texture.methods.push(
            MethodInfo::new("clear")
                .with_managed_name("Clear")
                .with_param(VarInfo::new("color", "Color"))
                .with_param(VarInfo::new("mips", "UINT32").output()),
        );
        let block = emitter.class(&named(texture)).unwrap();

        assert!(block.has_line("public partial class Texture : Resource"));
        assert!(block.has_line("public void Clear(Color color, out uint mips)"));
        assert!(block.has_line("Internal_clear(mCachedPtr, ref color, out mips);"));
        assert!(block.has_line(
            "private static extern void Internal_clear(IntPtr thisPtr, ref Color color, out uint mips);"
        ));
    }

    #[test]
    fn test_module_members_are_static() {
        let table = table();
        let config = config();
        let emitter = ManagedEmitter::new(&table, &config);

        let mut input = ClassInfo::new("Input");
        input.flags |= ClassFlags::IS_SINGLETON_MODULE;
        input.methods.push(
            MethodInfo::new("isKeyDown")
                .with_managed_name("IsKeyDown")
                .with_param(VarInfo::new("key", "UINT32"))
                .with_return(VarInfo::new("", "bool")),
        );
        input.events.push(
            MethodInfo::new("onPointerMoved")
                .with_managed_name("OnPointerMoved")
                .with_param(VarInfo::new("pos", "Vector2I")),
        );
        input.events.push(MethodInfo::new("onFocusLost").with_managed_name("OnFocusLost"));
        let block = emitter.class(&named(input)).unwrap();

        assert!(block.has_line("public static bool IsKeyDown(uint key)"));
        assert!(block.has_line("return Internal_isKeyDown(key);"));
        assert!(block.has_line("private static extern bool Internal_isKeyDown(uint key);"));
        assert!(block.has_line("public static event Action<Vector2I> OnPointerMoved;"));
        assert!(block.has_line("public static event Action OnFocusLost;"));
        assert!(block.has_line("private static void Internal_onPointerMoved(ref Vector2I pos)"));
        assert!(block.has_line("OnPointerMoved?.Invoke(pos);"));
        assert!(block.has_line("OnFocusLost?.Invoke();"));
    }

    #[test]
    fn test_properties() {
        let table = table();
        let config = config();
        let emitter = ManagedEmitter::new(&table, &config);

        let mut camera = ClassInfo::new("CCamera");
        camera.methods.push(
            MethodInfo::new("getClearColor")
                .with_flags(MethodFlags::PROPERTY_GETTER)
                .with_return(VarInfo::new("", "Color")),
        );
        camera.methods.push(
            MethodInfo::new("setClearColor")
                .with_flags(MethodFlags::PROPERTY_SETTER)
                .with_param(VarInfo::new("color", "Color")),
        );
        camera.properties.push(PropertyInfo {
            name: "ClearColor".to_string(),
            type_name: "Color".to_string(),
            flags: TypeFlags::OWNED_BY_REFERENCE_OR_VALUE,
            is_static: false,
            visibility: Visibility::Public,
            getter: Some("getClearColor".to_string()),
            setter: Some("setClearColor".to_string()),
            documentation: CommentEntry::brief("Color the viewport is cleared to."),
        });
        camera.properties.push(PropertyInfo {
            name: "Priority".to_string(),
            type_name: "INT32".to_string(),
            flags: TypeFlags::OWNED_BY_REFERENCE_OR_VALUE,
            is_static: false,
            visibility: Visibility::Internal,
            getter: Some("getPriority".to_string()),
            setter: None,
            documentation: CommentEntry::default(),
        });
        let text = render(&emitter.class(&named(camera)).unwrap());

        assert!(text.contains("public partial class Camera : Component"));
        assert!(text.contains(
            "    /// <summary>\n    \
             /// Color the viewport is cleared to.\n    \
             /// </summary>\n    \
             [ShowInInspector]\n    \
             public Color ClearColor\n    {\n        \
             get\n        {\n            \
             Color temp;\n            \
             Internal_getClearColor(mCachedPtr, out temp);\n            \
             return temp;\n        }\n        \
             set { Internal_setClearColor(mCachedPtr, ref value); }\n    }\n"
        ));
        assert!(text.contains(
            "    /// <summary></summary>\n    internal int Priority\n    {\n        \
             get { return Internal_getPriority(mCachedPtr); }\n    }\n"
        ));
        // Accessors only surface through the property
        assert!(!text.contains("GetClearColor("));
        assert!(text.contains("private static extern void Internal_getClearColor(IntPtr thisPtr, out Color __output);"));
    }

    #[test]
    fn test_interop_only_methods_have_no_surface() {
        let table = table();
        let config = config();
        let emitter = ManagedEmitter::new(&table, &config);

        let mut font = ClassInfo::new("BitmapFont");
        font.base_class = Some("Font".to_string());
        font.methods.push(
            MethodInfo::new("rebuild")
                .with_managed_name("Rebuild")
                .with_flags(MethodFlags::INTEROP_ONLY),
        );
        let block = emitter.class(&named(font)).unwrap();

        assert!(block.has_line("public partial class BitmapFont : Font"));
        assert!(!block.has_line("public void Rebuild()"));
        assert!(block.has_line("private static extern void Internal_rebuild(IntPtr thisPtr);"));
    }

    // ── Structs and enums ──

    #[test]
    fn test_struct_surface() {
        let table = table();
        let config = config();
        let emitter = ManagedEmitter::new(&table, &config);

        let mut info = StructInfo::new("Vector2I");
        info.fields.push(VarInfo::new("x", "INT32"));
        info.fields.push(VarInfo::new("y", "INT32").with_default("1"));
        info.fields.push(VarInfo::new("format", "PixelFormat"));
        info.fields.push(VarInfo::new("tint", "Color"));
        info.fields.push(VarInfo::new("name", "String"));
        info.constructors.push(StructConstructor::default());
        let mut ctor = StructConstructor::default();
        ctor.params.push(VarInfo::new("x", "INT32"));
        ctor.field_assignments.insert("x".to_string(), "x".to_string());
        info.constructors.push(ctor);

        let text = render(&emitter.structure(&info).unwrap());
        assert!(text.contains(
            "[StructLayout(LayoutKind.Sequential), SerializeObject]\npublic partial struct Vector2I\n{\n"
        ));
        assert!(text.contains(
            "    /// <summary>Initializes the struct with default values.</summary>\n    \
             public static Vector2I Default()\n    {\n        \
             Vector2I value = new Vector2I();\n        \
             value.x = 0;\n        \
             value.y = 1;\n        \
             value.format = (PixelFormat)0;\n        \
             value.tint = new Color();\n        \
             value.name = null;\n\n        \
             return value;\n    }\n"
        ));
        assert!(text.contains("    public Vector2I(int x)\n    {\n        this.x = x;\n        this.y = 1;\n"));
        assert!(text.contains("    public int x;\n    public int y;\n    public PixelFormat format;\n"));
        assert!(text.contains("    public string name;\n}\n"));
    }

    #[test]
    fn test_enum_surface() {
        let table = table();
        let config = config();
        let emitter = ManagedEmitter::new(&table, &config);

        let mut info = EnumInfo {
            name: "PixelFormat".to_string(),
            managed_name: "PixelFormat".to_string(),
            explicit_type: Some("uint".to_string()),
            ..EnumInfo::default()
        };
        info.entries.insert(
            0,
            EnumEntry {
                managed_name: "R8".to_string(),
                documentation: CommentEntry::brief("8-bit red channel."),
            },
        );
        info.entries.insert(
            3,
            EnumEntry {
                managed_name: "RGBA8".to_string(),
                documentation: CommentEntry::default(),
            },
        );

        assert_eq!(
            render(&emitter.enumeration(&info)),
            "/// <summary></summary>\n\
             public enum PixelFormat : uint\n\
             {\n    \
             /// <summary>\n    \
             /// 8-bit red channel.\n    \
             /// </summary>\n    \
             R8 = 0,\n    \
             RGBA8 = 3\n\
             }\n"
        );
    }

    // ── Files ──

    #[test]
    fn test_editor_file_imports_engine_namespace() {
        let mut table = table();
        let mut module = ModuleInfo::new("Gizmos");
        module.editor = true;
        let mut info = EnumInfo {
            name: "PixelFormat".to_string(),
            managed_name: "PixelFormat".to_string(),
            ..EnumInfo::default()
        };
        info.entries.insert(0, EnumEntry::default());
        module.enums.push(info);
        table.modules.insert("Gizmos".to_string(), module);

        let config = GeneratorConfig::default();
        let emitter = ManagedEmitter::new(&table, &config);
        let text = emitter.file(&table.modules["Gizmos"]).unwrap();
        assert!(text.starts_with(
            "using System;\n\
             using System.Runtime.CompilerServices;\n\
             using System.Runtime.InteropServices;\n\
             using BansheeEngine;\n\
             \n\
             namespace BansheeEditor\n{\n\t/// <summary></summary>\n\tpublic enum PixelFormat\n"
        ));
        assert!(text.ends_with("\t}\n}\n"));
    }
}
