//! Native emitter: wrapper class declarations and definitions.
//!
//! Every module produces one header and one source file. Both hold the
//! wrappers of the module's classes followed by those of its structs, inside
//! the configured native namespace.

use crate::code::Block;
use crate::config::{GeneratorConfig, TargetConfig};
use crate::diagnostics::{GenerateError, Result};
use crate::marshal::Marshaler;
use crate::model::{ClassInfo, ModuleInfo, StructInfo, SymbolTable};
use crate::signature::InteropClass;
use crate::types::{ObjectHandle, TypeCategory, boundary_type, wrapper_name};

/// Renders native glue code from a postprocessed [`SymbolTable`].
#[derive(Debug, Clone, Copy)]
pub struct NativeEmitter<'a> {
    table: &'a SymbolTable,
    config: &'a GeneratorConfig,
}

/// Inheritance facts of one wrapped class.
struct Lineage {
    /// `Script<Name>Base` when other classes derive from this one.
    own_base: Option<String>,
    /// `Script<Parent>Base` when the parent class is wrapped too.
    parent_base: Option<String>,
}

impl Lineage {
    /// Extra template argument of the wrapper's base class.
    fn wrapper_base(&self) -> Option<&str> {
        self.own_base.as_deref().or(self.parent_base.as_deref())
    }

    /// Whether `mInternal` lives in a base wrapper rather than the wrapper itself.
    fn inherits_internal(&self) -> bool {
        self.wrapper_base().is_some()
    }
}

impl<'a> NativeEmitter<'a> {
    pub fn new(table: &'a SymbolTable, config: &'a GeneratorConfig) -> Self {
        Self { table, config }
    }

    fn lineage(&self, class: &ClassInfo) -> Lineage {
        let parent_base = class
            .base_class
            .as_deref()
            .and_then(|base| self.table.find_class(base))
            .filter(|parent| parent.is_base())
            .map(|parent| format!("{}Base", wrapper_name(&parent.name)));
        Lineage {
            own_base: class
                .is_base()
                .then(|| format!("{}Base", wrapper_name(&class.name))),
            parent_base,
        }
    }

    fn script_obj(&self, target: &TargetConfig, type_name: &str) -> String {
        format!(
            "SCRIPT_OBJ({}, \"{}\", \"{}\")",
            target.assembly,
            target.managed_namespace,
            self.table.types.managed_name(type_name)
        )
    }

    /// Everything inside the namespace of a module header.
    pub fn header_body(&self, module: &ModuleInfo) -> Result<Block> {
        let target = self.config.target(module.editor);
        let mut blocks = Vec::new();
        for class in &module.classes {
            blocks.push(self.class_header(class, target)?);
        }
        for info in &module.structs {
            blocks.push(self.struct_header(info, target)?);
        }

        let mut body = Block::new();
        for decl in &module.forward_decls {
            let keyword = if decl.is_struct { "struct" } else { "class" };
            body.line(format!("{keyword} {};", decl.name));
        }
        if !body.is_empty() {
            body.blank();
        }
        body.append(Block::join(blocks));
        Ok(body)
    }

    pub fn header(&self, module: &ModuleInfo) -> Result<String> {
        log::debug!("emitting native header of module {}", module.name);
        let mut file = Block::new();
        for line in self.config.banner("//") {
            file.line(line);
        }
        file.line("#pragma once");
        file.blank();
        for include in &module.header_includes {
            file.line(format!("#include \"{include}\""));
        }
        file.blank();
        file.scope(
            format!("namespace {}", self.config.native_namespace),
            self.header_body(module)?,
        );
        Ok(file.render(self.config.indent))
    }

    /// Everything inside the namespace of a module source file.
    pub fn source_body(&self, module: &ModuleInfo) -> Result<Block> {
        let mut blocks = Vec::new();
        for class in &module.classes {
            blocks.push(self.class_source(class)?);
        }
        for info in &module.structs {
            blocks.push(self.struct_source(info)?);
        }
        Ok(Block::join(blocks))
    }

    pub fn source(&self, module: &ModuleInfo) -> Result<String> {
        log::debug!("emitting native source of module {}", module.name);
        let mut file = Block::new();
        for line in self.config.banner("//") {
            file.line(line);
        }
        for include in &module.source_includes {
            file.line(format!("#include \"{include}\""));
        }
        file.blank();
        file.scope(
            format!("namespace {}", self.config.native_namespace),
            self.source_body(module)?,
        );
        Ok(file.render(self.config.indent))
    }

    // ── Classes ──

    fn wrapped(&self, class: &ClassInfo) -> Result<InteropClass<'a>> {
        let class = self
            .table
            .find_class(&class.name)
            .ok_or_else(|| GenerateError::fatal(&class.name, "class is not part of the symbol table"))?;
        let interop = InteropClass::new(class, &self.table.types)?;
        if interop.handle == ObjectHandle::SceneObject {
            return Err(GenerateError::fatal(
                &class.name,
                "scene objects are wrapped by the runtime and cannot be generated",
            ));
        }
        Ok(interop)
    }

    fn base_wrapper_decl(
        &self,
        interop: &InteropClass,
        lineage: &Lineage,
        export: &str,
    ) -> Option<Block> {
        let own_base = lineage.own_base.as_deref()?;
        let parent = match &lineage.parent_base {
            Some(parent) => parent.as_str(),
            None => match interop.handle {
                ObjectHandle::Resource => "ScriptResourceBase",
                ObjectHandle::Component => "ScriptComponentBase",
                ObjectHandle::Class | ObjectHandle::SceneObject => "ScriptObjectBase",
            },
        };

        let mut public = Block::new();
        public.line(format!("{own_base}(MonoObject* instance);"));
        public.line(format!("virtual ~{own_base}() {{}}"));

        let mut protected = Block::new();
        if interop.handle == ObjectHandle::Class && !interop.is_module() {
            let wrapped = interop.wrapped_type();
            public.blank();
            public.line(self.get_internal(interop, lineage.parent_base.is_some()));
            if lineage.parent_base.is_none() {
                protected.line(format!("{wrapped} mInternal;"));
            }
        }

        let mut body = Block::new();
        body.line("public:");
        body.nest(public);
        if !protected.is_empty() {
            body.line("protected:");
            body.nest(protected);
        }
        let mut block = Block::new();
        block.class_scope(format!("class {export} {own_base} : public {parent}"), body);
        Some(block)
    }

    /// `getInternal()` of a class wrapper; `cast` when `mInternal` holds a parent type.
    fn get_internal(&self, interop: &InteropClass, cast: bool) -> String {
        let wrapped = interop.wrapped_type();
        if cast {
            format!(
                "{wrapped} getInternal() const {{ return std::static_pointer_cast<{}>(mInternal); }}",
                interop.class.name
            )
        } else {
            format!("{wrapped} getInternal() const {{ return mInternal; }}")
        }
    }

    fn wrapper_parent(&self, interop: &InteropClass, lineage: &Lineage) -> String {
        let mut args = vec![interop.wrapper.clone()];
        let template = match interop.handle {
            ObjectHandle::Resource => {
                args.push(interop.class.name.clone());
                "TScriptResource"
            }
            ObjectHandle::Component => {
                args.push(interop.class.name.clone());
                "TScriptComponent"
            }
            ObjectHandle::Class | ObjectHandle::SceneObject => "ScriptObject",
        };
        args.extend(lineage.wrapper_base().map(str::to_string));
        format!("{template}<{}>", args.join(", "))
    }

    /// Declarations of the wrapper (and base wrapper) of a class.
    pub fn class_header(&self, class: &ClassInfo, target: &TargetConfig) -> Result<Block> {
        let interop = self.wrapped(class)?;
        let class = interop.class;
        let lineage = self.lineage(class);
        let export = &target.export_macro;
        let wrapper = &interop.wrapper;
        let wrapped = interop.wrapped_type();
        let is_class = interop.handle == ObjectHandle::Class && !interop.is_module();
        let has_static_events = class.static_events().next().is_some();

        let mut public = Block::new();
        public.line(self.script_obj(target, &class.name));
        public.blank();
        if interop.is_module() {
            public.line(format!("{wrapper}(MonoObject* managedInstance);"));
        } else {
            public.line(format!(
                "{wrapper}(MonoObject* managedInstance, const {wrapped}& value);"
            ));
        }
        public.blank();
        if is_class {
            if lineage.own_base.is_none() {
                public.line(self.get_internal(&interop, lineage.parent_base.is_some()));
            }
            public.line(format!("static MonoObject* create(const {wrapped}& value);"));
            public.blank();
        } else if interop.handle == ObjectHandle::Resource {
            public.line("static MonoObject* createInstance();");
            public.blank();
        }
        if has_static_events {
            public.line("static void startUp();");
            public.line("static void shutDown();");
            public.blank();
        }

        let mut private = Block::new();
        for event in &class.events {
            private.line(format!("{};", interop.callback_signature(event, false)?));
        }
        if !class.events.is_empty() {
            private.blank();
        }
        if is_class && !lineage.inherits_internal() {
            private.line(format!("{wrapped} mInternal;"));
            private.blank();
        }
        for event in &class.events {
            private.append(interop.thunk_decl(event)?);
        }
        if !class.events.is_empty() {
            private.blank();
        }
        for event in class.static_events() {
            private.line(format!("static HEvent {}Conn;", event.interop_name));
        }
        if has_static_events {
            private.blank();
        }
        for method in class.constructors.iter().chain(class.methods.iter()) {
            private.line(format!("static {};", interop.method_signature(method, false)?));
        }

        let mut body = Block::new();
        body.line("public:");
        body.nest(public);
        body.line("private:");
        body.nest(private);

        let mut block = Block::new();
        if let Some(base) = self.base_wrapper_decl(&interop, &lineage, export) {
            block.append(base);
            block.blank();
        }
        block.class_scope(
            format!(
                "class {export} {wrapper} : public {}",
                self.wrapper_parent(&interop, &lineage)
            ),
            body,
        );
        Ok(block)
    }

    /// `bool dummy` setup passed to the runtime-only managed constructor.
    fn dummy_ctor_params(class: &ClassInfo) -> (Block, String) {
        let ctor = class.runtime_constructor();
        let arity = ctor.params.len();
        let mut block = Block::new();
        block.line("bool dummy = false;");
        block.line(format!(
            "void* ctorParams[{arity}] = {{ {} }};",
            vec!["&dummy"; arity].join(", ")
        ));
        block.blank();
        let signature = ctor
            .params
            .iter()
            .map(|p| p.type_name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        (block, signature)
    }

    /// Definitions of the wrapper (and base wrapper) of a class.
    pub fn class_source(&self, class: &ClassInfo) -> Result<Block> {
        let interop = self.wrapped(class)?;
        let class = interop.class;
        let lineage = self.lineage(class);
        let wrapper = &interop.wrapper;
        let wrapped = interop.wrapped_type();
        let is_class = interop.handle == ObjectHandle::Class && !interop.is_module();
        let mut sections = Vec::new();

        // Static members
        let mut statics = Block::new();
        for event in &class.events {
            let name = &event.interop_name;
            statics.line(format!("{wrapper}::{name}ThunkDef {wrapper}::{name}Thunk;"));
        }
        for event in class.static_events() {
            statics.line(format!("HEvent {wrapper}::{}Conn;", event.interop_name));
        }
        sections.push(statics);

        if let Some(own_base) = &lineage.own_base {
            let parent = lineage.parent_base.as_deref().unwrap_or(match interop.handle {
                ObjectHandle::Resource => "ScriptResourceBase",
                ObjectHandle::Component => "ScriptComponentBase",
                ObjectHandle::Class | ObjectHandle::SceneObject => "ScriptObjectBase",
            });
            let mut ctor = Block::new();
            ctor.line(format!("{own_base}::{own_base}(MonoObject* managedInstance)"));
            ctor.nest(Block::from(vec![format!(":{parent}(managedInstance)")]));
            ctor.line("{ }");
            sections.push(ctor);
        }

        // Constructor
        let mut ctor = Block::new();
        let mut ctor_body = Block::new();
        if interop.is_module() {
            ctor.line(format!("{wrapper}::{wrapper}(MonoObject* managedInstance)"));
        } else {
            ctor.line(format!(
                "{wrapper}::{wrapper}(MonoObject* managedInstance, const {wrapped}& value)"
            ));
        }
        let initializer = match interop.handle {
            ObjectHandle::Resource => "TScriptResource(managedInstance, value)".to_string(),
            ObjectHandle::Component => "TScriptComponent(managedInstance, value)".to_string(),
            _ if !is_class => "ScriptObject(managedInstance)".to_string(),
            _ if lineage.inherits_internal() => {
                ctor_body.line("mInternal = value;");
                "ScriptObject(managedInstance)".to_string()
            }
            _ => "ScriptObject(managedInstance), mInternal(value)".to_string(),
        };
        ctor.nest(Block::from(vec![format!(":{initializer}")]));
        for event in class.instance_events() {
            ctor_body.line(interop.instance_connect(event));
        }
        if ctor_body.is_empty() {
            ctor.line("{ }");
        } else {
            ctor.line("{");
            ctor.nest(ctor_body);
            ctor.line("}");
        }
        sections.push(ctor);

        // Runtime registration
        let mut init = Block::new();
        for method in class.constructors.iter().chain(class.methods.iter()) {
            let name = &method.interop_name;
            init.line(format!(
                "metaData.scriptClass->addInternalCall(\"Internal_{name}\", &{wrapper}::Internal_{name});"
            ));
        }
        if !class.events.is_empty() {
            if !init.is_empty() {
                init.blank();
            }
            for event in &class.events {
                init.line(interop.thunk_init(event)?);
            }
        }
        let mut registration = Block::new();
        registration.scope(format!("void {wrapper}::initRuntimeData()"), init);
        sections.push(registration);

        // Factories
        if is_class {
            let (mut body, signature) = Self::dummy_ctor_params(class);
            body.line(format!(
                "MonoObject* managedInstance = metaData.scriptClass->createInstance(\"{signature}\", ctorParams);"
            ));
            body.line(format!(
                "{wrapper}* scriptInstance = new (bs_alloc<{wrapper}>()) {wrapper}(managedInstance, value);"
            ));
            body.line("return managedInstance;");
            let mut create = Block::new();
            create.scope(
                format!("MonoObject* {wrapper}::create(const {wrapped}& value)"),
                body,
            );
            sections.push(create);
        } else if interop.handle == ObjectHandle::Resource {
            let (mut body, signature) = Self::dummy_ctor_params(class);
            body.line(format!(
                "return metaData.scriptClass->createInstance(\"{signature}\", ctorParams);"
            ));
            let mut create = Block::new();
            create.scope(format!("MonoObject* {wrapper}::createInstance()"), body);
            sections.push(create);
        }

        // Static event lifecycle
        if class.static_events().next().is_some() {
            let mut start = Block::new();
            let mut stop = Block::new();
            for event in class.static_events() {
                start.line(interop.static_connect(event));
                stop.line(format!("{}Conn.disconnect();", event.interop_name));
            }
            let mut lifecycle = Block::new();
            lifecycle.scope(format!("void {wrapper}::startUp()"), start);
            lifecycle.blank();
            lifecycle.scope(format!("void {wrapper}::shutDown()"), stop);
            sections.push(lifecycle);
        }

        for event in &class.events {
            sections.push(interop.callback_definition(event)?);
        }
        for method in class.constructors.iter().chain(class.methods.iter()) {
            sections.push(interop.method_definition(method)?);
        }
        Ok(Block::join(sections))
    }

    // ── Structs ──

    /// Flattened layout (when required) and the boxing wrapper of a struct.
    pub fn struct_header(&self, info: &StructInfo, target: &TargetConfig) -> Result<Block> {
        let types = &self.table.types;
        let name = &info.name;
        let interop = &info.interop_name;
        let wrapper = wrapper_name(name);
        let mut block = Block::new();

        if info.requires_interop {
            let mut fields = Block::new();
            for field in &info.fields {
                let category = types.resolve(&field.type_name, name)?.category;
                fields.line(format!(
                    "{} {};",
                    boundary_type(&field.type_name, category, field.flags, true),
                    field.name
                ));
            }
            block.scope_with(format!("struct {interop}"), fields, "};");
            block.blank();
        }

        let mut public = Block::new();
        public.line(self.script_obj(target, name));
        public.blank();
        public.line(format!("static MonoObject* box(const {interop}& value);"));
        public.line(format!("static {interop} unbox(MonoObject* value);"));
        if info.requires_interop {
            public.line(format!("static {name} fromInterop(const {interop}& value);"));
            public.line(format!("static {interop} toInterop(const {name}& value);"));
        }

        let mut body = Block::new();
        body.line("public:");
        body.nest(public);
        body.line("private:");
        body.nest(Block::from(vec![format!("{wrapper}(MonoObject* managedInstance);")]));

        block.class_scope(
            format!(
                "class {} {wrapper} : public ScriptObject<{wrapper}>",
                target.export_macro
            ),
            body,
        );
        Ok(block)
    }

    pub fn struct_source(&self, info: &StructInfo) -> Result<Block> {
        let name = &info.name;
        let interop = &info.interop_name;
        let wrapper = wrapper_name(name);
        let marshaler = Marshaler::new(&self.table.types);
        let mut sections = Vec::new();

        let mut ctor = Block::new();
        ctor.line(format!("{wrapper}::{wrapper}(MonoObject* managedInstance)"));
        ctor.nest(Block::from(vec![":ScriptObject(managedInstance)".to_string()]));
        ctor.line("{ }");
        sections.push(ctor);

        let mut init = Block::new();
        init.line(format!("void {wrapper}::initRuntimeData()"));
        init.line("{ }");
        sections.push(init);

        let mut boxing = Block::new();
        boxing.scope(
            format!("MonoObject* {wrapper}::box(const {interop}& value)"),
            Block::from(vec![
                "return MonoUtil::box(metaData.scriptClass->_getInternalClass(), (void*)&value);"
                    .to_string(),
            ]),
        );
        sections.push(boxing);

        let mut unboxing = Block::new();
        unboxing.scope(
            format!("{interop} {wrapper}::unbox(MonoObject* value)"),
            Block::from(vec![format!("return *({interop}*)MonoUtil::unbox(value);")]),
        );
        sections.push(unboxing);

        if info.requires_interop {
            let mut from = Block::new();
            from.line(format!("{name} output;"));
            let mut to = Block::new();
            to.line(format!("{interop} output;"));
            for field in &info.fields {
                let context = format!("{name}::{}", field.name);
                let (pre, expr) = marshaler.field_from_interop(field, &context)?;
                from.append(pre);
                from.line(format!("output.{} = {expr};", field.name));

                let (pre, expr) = marshaler.field_to_interop(field, &context)?;
                to.append(pre);
                to.line(format!("output.{} = {expr};", field.name));
            }
            for block in [&mut from, &mut to] {
                block.blank();
                block.line("return output;");
            }

            let mut conversions = Block::new();
            conversions.scope(
                format!("{name} {wrapper}::fromInterop(const {interop}& value)"),
                from,
            );
            conversions.blank();
            conversions.scope(
                format!("{interop} {wrapper}::toInterop(const {name}& value)"),
                to,
            );
            sections.push(conversions);
        }
        Ok(Block::join(sections))
    }

    // ── Component lookup ──

    /// Global header mapping every builtin component to its wrapper.
    pub fn component_lookup(&self) -> String {
        let types = &self.table.types;
        let mut includes = Vec::new();
        let mut entries = Block::new();
        for module in self.table.modules.values() {
            let mut has_component = false;
            for class in &module.classes {
                let Some(info) = types.get(&class.name) else {
                    continue;
                };
                if info.category != TypeCategory::Component {
                    continue;
                }
                includes.extend(info.decl_file.clone());
                entries.line(format!("ADD_ENTRY({}, {})", class.name, wrapper_name(&class.name)));
                has_component = true;
            }
            if has_component {
                includes.push(self.config.native_header_file(&module.name));
            }
        }

        let mut lookup = Block::new();
        lookup.line("LOOKUP_BEGIN");
        lookup.nest(entries);
        lookup.line("LOOKUP_END");

        let mut file = Block::new();
        for line in self.config.banner("//") {
            file.line(line);
        }
        file.line("#pragma once");
        file.blank();
        file.line("#include \"BsBuiltinComponentLookup.h\"");
        file.line("#include \"BsRTTIType.h\"");
        for include in includes {
            file.line(format!("#include \"{include}\""));
        }
        file.blank();
        file.scope(format!("namespace {}", self.config.native_namespace), lookup);
        file.line("#undef LOOKUP_BEGIN");
        file.line("#undef ADD_ENTRY");
        file.line("#undef LOOKUP_END");
        file.render(self.config.indent)
    }
}
