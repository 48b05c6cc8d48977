//! Interop function signatures and bodies.
//!
//! Assembles the native entry points the managed runtime calls
//! (`Internal_<name>`) and the callbacks that forward native events to
//! managed thunks, from the fragments the [`Marshaler`] produces.

use crate::code::Block;
use crate::diagnostics::{GenerateError, Result};
use crate::marshal::{Direction, Marshaler};
use crate::model::{ClassInfo, MethodInfo, VarInfo};
use crate::registry::TypeRegistry;
use crate::types::{
    ArgShape, ManagedStyle, ObjectHandle, Ownership, TypeCategory, boundary_type,
    forward_to_native, managed_type, native_type, wrapper_name,
};

/// Name of the value returned by, or written out of, an interop function.
pub const OUTPUT_NAME: &str = "__output";

/// A class viewed through its wrapper, the unit interop code is built for.
#[derive(Debug, Clone)]
pub struct InteropClass<'a> {
    pub class: &'a ClassInfo,
    pub handle: ObjectHandle,
    /// `Script<Name>`.
    pub wrapper: String,
    /// Type of `thisPtr`; the base wrapper when other classes derive from this one.
    pub receiver: String,
    types: &'a TypeRegistry,
    marshaler: Marshaler<'a>,
}

/// How a method's return value reaches the managed side.
struct ReturnPlan {
    var: VarInfo,
    category: TypeCategory,
    direct: bool,
}

impl<'a> InteropClass<'a> {
    pub fn new(class: &'a ClassInfo, types: &'a TypeRegistry) -> Result<Self> {
        let category = types.resolve(&class.name, &class.name)?.category;
        let handle = category.object_handle().ok_or_else(|| {
            GenerateError::fatal(
                &class.name,
                format!("a {category:?} cannot be wrapped as a class"),
            )
        })?;
        let wrapper = wrapper_name(&class.name);
        let receiver = if class.is_base() {
            format!("{wrapper}Base")
        } else {
            wrapper.clone()
        };
        Ok(Self {
            class,
            handle,
            wrapper,
            receiver,
            types,
            marshaler: Marshaler::new(types),
        })
    }

    pub fn is_module(&self) -> bool {
        self.class.is_module()
    }

    /// Native value the wrapper holds.
    pub fn wrapped_type(&self) -> String {
        self.handle.wrapped_type(&self.class.name)
    }

    fn context(&self, method: &MethodInfo) -> String {
        format!("{}::{}", self.class.name, method.source_name)
    }

    fn category(&self, var: &VarInfo, context: &str) -> Result<TypeCategory> {
        Ok(self.types.resolve(&var.type_name, context)?.category)
    }

    fn boundary(&self, var: &VarInfo, context: &str) -> Result<String> {
        let category = self.category(var, context)?;
        Ok(boundary_type(&var.type_name, category, var.flags, false))
    }

    fn return_plan(&self, method: &MethodInfo, context: &str) -> Result<Option<ReturnPlan>> {
        if method.is_constructor() {
            return Ok(None);
        }
        let Some(ret) = &method.return_value else {
            return Ok(None);
        };
        let category = self.category(ret, context)?;
        let mut var = ret.clone();
        var.name = OUTPUT_NAME.to_string();
        Ok(Some(ReturnPlan {
            direct: category.can_be_returned(var.flags),
            var,
            category,
        }))
    }

    /// `RetType [ScriptT::]Internal_<name>(params)`.
    pub fn method_signature(&self, method: &MethodInfo, qualified: bool) -> Result<String> {
        let context = self.context(method);
        let ret = self.return_plan(method, &context)?;

        let return_type = match &ret {
            Some(plan) if plan.direct => {
                boundary_type(&plan.var.type_name, plan.category, plan.var.flags, false)
            }
            _ => "void".to_string(),
        };

        let mut params = Vec::new();
        if method.is_constructor() {
            params.push("MonoObject* managedInstance".to_string());
        } else if !method.is_static() && !self.is_module() {
            params.push(format!("{}* thisPtr", self.receiver));
        }
        for param in &method.params {
            params.push(format!("{} {}", self.boundary(param, &context)?, param.name));
        }
        if let Some(plan) = ret.as_ref().filter(|p| !p.direct) {
            params.push(format!(
                "{} {}",
                boundary_type(&plan.var.type_name, plan.category, plan.var.flags, false),
                OUTPUT_NAME
            ));
        }

        let scope = if qualified {
            format!("{}::", self.wrapper)
        } else {
            String::new()
        };
        Ok(format!(
            "{return_type} {scope}Internal_{}({})",
            method.interop_name,
            params.join(", ")
        ))
    }

    /// Statements of an interop function, without the enclosing braces.
    pub fn method_body(&self, method: &MethodInfo) -> Result<Block> {
        let context = self.context(method);
        let mut pre = Block::new();
        let mut param_posts = Vec::new();
        let mut args = Vec::new();

        for param in &method.params {
            let direction = if param.flags.is_output() {
                Direction::Output
            } else {
                Direction::Input
            };
            let marshaled = self.marshaler.marshal(param, direction, &context)?;
            args.push(self.marshaler.forward(param, &marshaled, &context)?);
            pre.append(marshaled.pre);
            param_posts.push(marshaled.post);
        }

        let mut post = Block::new();
        let mut assignment = String::new();
        let mut direct_return = false;
        if let Some(plan) = self.return_plan(method, &context)? {
            let direction = if plan.direct {
                Direction::Return
            } else {
                Direction::Output
            };
            let marshaled = self.marshaler.marshal(&plan.var, direction, &context)?;
            let lvalue = marshaled.lvalue();
            pre.append(marshaled.pre);

            let deref = plan.var.flags.ownership() == Some(Ownership::RawPointer)
                && !plan.var.flags.is_array()
                && matches!(
                    plan.category,
                    TypeCategory::Builtin
                        | TypeCategory::Enum
                        | TypeCategory::Struct
                        | TypeCategory::String
                        | TypeCategory::WideString
                );
            assignment = format!("{lvalue} = {}", if deref { "*" } else { "" });

            if plan.direct {
                direct_return = true;
                post.line(format!(
                    "{} {OUTPUT_NAME};",
                    boundary_type(&plan.var.type_name, plan.category, plan.var.flags, false)
                ));
            }
            post.append(marshaled.post);
        }
        for block in param_posts {
            post.append(block);
        }

        let mut body = pre;
        body.append(self.invocation(method, &args, &assignment, &context)?);
        if !post.is_empty() {
            body.blank();
            body.append(post);
        }
        if direct_return {
            body.blank();
            body.line(format!("return {OUTPUT_NAME};"));
        }
        Ok(body)
    }

    fn invocation(
        &self,
        method: &MethodInfo,
        args: &[String],
        assignment: &str,
        context: &str,
    ) -> Result<Block> {
        let name = &self.class.name;
        let source = &method.source_name;
        let wrapper = &self.wrapper;
        let mut block = Block::new();

        if method.is_constructor() {
            let args = args.join(", ");
            let factory = match &method.external_class {
                Some(external) if method.is_external() => format!("{external}::{source}({args})"),
                _ => format!("bs_shared_ptr_new<{name}>({args})"),
            };
            match (self.handle, method.is_external()) {
                (ObjectHandle::Class, _) => {
                    block.line(format!("SPtr<{name}> instance = {factory};"));
                    block.line(format!(
                        "{wrapper}* scriptInstance = new (bs_alloc<{wrapper}>()) {wrapper}(managedInstance, instance);"
                    ));
                }
                (ObjectHandle::Resource, true) => {
                    block.line(format!("ResourceHandle<{name}> instance = {factory};"));
                    block.line(
                        "ScriptResourceBase* scriptInstance = ScriptResourceManager::instance().createBuiltinScriptResource(instance, managedInstance);",
                    );
                }
                (handle, _) => {
                    return Err(GenerateError::fatal(
                        context,
                        format!("cannot generate a constructor for a {:?}", handle.category()),
                    ));
                }
            }
            return Ok(block);
        }

        let call = if method.is_external() {
            let external = method.external_class.as_deref().ok_or_else(|| {
                GenerateError::fatal(context, "external method has no external class")
            })?;
            let mut all_args = Vec::with_capacity(args.len() + 1);
            if !method.is_static() {
                all_args.push(self.external_receiver(method, context)?);
            }
            all_args.extend(args.iter().cloned());
            format!("{external}::{source}({})", all_args.join(", "))
        } else {
            let args = args.join(", ");
            if method.is_static() {
                format!("{name}::{source}({args})")
            } else if self.is_module() {
                format!("{name}::instance().{source}({args})")
            } else {
                format!("thisPtr->{}()->{source}({args})", self.handle.accessor())
            }
        };
        block.line(format!("{assignment}{call};"));
        Ok(block)
    }

    /// The object an external free function operates on, as its first argument.
    fn external_receiver(&self, method: &MethodInfo, context: &str) -> Result<String> {
        let receiver = method.receiver.as_ref().ok_or_else(|| {
            GenerateError::fatal(context, "external method has no receiver parameter")
        })?;
        if self.is_module() {
            let instance = format!("{}::instance()", self.class.name);
            return Ok(match receiver.flags.ownership() {
                Some(Ownership::RawPointer) => format!("&{instance}"),
                _ => instance,
            });
        }
        let native = format!("thisPtr->{}()", self.handle.accessor());
        forward_to_native(
            &native,
            self.handle.category(),
            receiver.flags,
            ArgShape::Value,
            context,
        )
    }

    /// Signature followed by the braced body.
    pub fn method_definition(&self, method: &MethodInfo) -> Result<Block> {
        let mut block = Block::new();
        block.scope(self.method_signature(method, true)?, self.method_body(method)?);
        Ok(block)
    }

    /// Native type of an event callback parameter.
    fn callback_param_type(&self, var: &VarInfo, context: &str) -> Result<String> {
        let category = self.category(var, context)?;
        let type_name = var.type_name.as_str();
        if var.flags.is_array() {
            return Ok(format!("const Vector<{}>&", native_type(type_name, category)));
        }
        let raw = var.flags.ownership() == Some(Ownership::RawPointer);
        Ok(match category {
            TypeCategory::Builtin | TypeCategory::Enum => {
                if raw {
                    format!("{type_name}*")
                } else {
                    type_name.to_string()
                }
            }
            TypeCategory::Struct | TypeCategory::String | TypeCategory::WideString => {
                if raw {
                    format!("{type_name}*")
                } else {
                    format!("const {type_name}&")
                }
            }
            TypeCategory::ManagedObject => native_type(type_name, category),
            TypeCategory::Class
            | TypeCategory::Resource
            | TypeCategory::Component
            | TypeCategory::SceneObject => format!("const {}&", native_type(type_name, category)),
        })
    }

    fn event_is_static(&self, event: &MethodInfo) -> bool {
        event.is_static() || self.is_module()
    }

    /// `[static ]void [ScriptT::]<name>(params)`.
    pub fn callback_signature(&self, event: &MethodInfo, qualified: bool) -> Result<String> {
        let context = self.context(event);
        let params = event
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| Ok(format!("{} p{i}", self.callback_param_type(p, &context)?)))
            .collect::<Result<Vec<_>>>()?;

        let (prefix, scope) = if qualified {
            (String::new(), format!("{}::", self.wrapper))
        } else if self.event_is_static(event) {
            ("static ".to_string(), String::new())
        } else {
            (String::new(), String::new())
        };
        Ok(format!(
            "{prefix}void {scope}{}({})",
            event.interop_name,
            params.join(", ")
        ))
    }

    /// Converts callback arguments and invokes the managed thunk.
    pub fn callback_body(&self, event: &MethodInfo) -> Result<Block> {
        let context = self.context(event);
        let mut body = Block::new();
        let mut args = Vec::new();
        if !self.event_is_static(event) {
            args.push("getManagedInstance()".to_string());
        }
        for (i, param) in event.params.iter().enumerate() {
            let (pre, arg) = self.marshaler.callback_arg(param, &format!("p{i}"), &context)?;
            body.append(pre);
            args.push(arg);
        }

        let mut call = vec![format!("{}Thunk", event.interop_name)];
        call.extend(args);
        body.line(format!("MonoUtil::invokeThunk({});", call.join(", ")));
        Ok(body)
    }

    pub fn callback_definition(&self, event: &MethodInfo) -> Result<Block> {
        let mut block = Block::new();
        block.scope(self.callback_signature(event, true)?, self.callback_body(event)?);
        Ok(block)
    }

    /// Thunk typedef and the static member holding the resolved pointer.
    pub fn thunk_decl(&self, event: &MethodInfo) -> Result<Block> {
        let context = self.context(event);
        let mut params = Vec::new();
        if !self.event_is_static(event) {
            params.push("MonoObject*".to_string());
        }
        for param in &event.params {
            params.push(format!("{} {}", self.boundary(param, &context)?, param.name));
        }
        params.push("MonoException**".to_string());

        let name = &event.interop_name;
        let mut block = Block::new();
        block.line(format!(
            "typedef void(__stdcall *{name}ThunkDef) ({});",
            params.join(", ")
        ));
        block.line(format!("static {name}ThunkDef {name}Thunk;"));
        Ok(block)
    }

    /// Managed parameter list used to look up the relay method of an event.
    pub fn thunk_lookup_signature(&self, event: &MethodInfo) -> Result<String> {
        let context = self.context(event);
        let types = event
            .params
            .iter()
            .map(|p| {
                let category = self.category(p, &context)?;
                Ok(managed_type(
                    self.types.managed_name(&p.type_name),
                    category,
                    p.flags,
                    ManagedStyle::PLAIN,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(types.join(", "))
    }

    /// Statement resolving an event thunk during runtime registration.
    pub fn thunk_init(&self, event: &MethodInfo) -> Result<String> {
        let name = &event.interop_name;
        Ok(format!(
            "{name}Thunk = ({name}ThunkDef)metaData.scriptClass->getMethodExact(\"Internal_{name}\", \"{}\")->getThunk();",
            self.thunk_lookup_signature(event)?
        ))
    }

    /// Subscription of a static or module event, made once at start-up.
    pub fn static_connect(&self, event: &MethodInfo) -> String {
        let source = if event.is_static() {
            format!("{}::{}", self.class.name, event.source_name)
        } else {
            format!("{}::instance().{}", self.class.name, event.source_name)
        };
        format!(
            "{}Conn = {source}.connect(&{}::{});",
            event.interop_name, self.wrapper, event.interop_name
        )
    }

    /// Subscription of an instance event, made in the wrapper constructor.
    pub fn instance_connect(&self, event: &MethodInfo) -> String {
        let mut bound = vec![format!("&{}::{}", self.wrapper, event.interop_name), "this".to_string()];
        bound.extend((1..=event.params.len()).map(|i| format!("std::placeholders::_{i}")));
        format!(
            "value->{}.connect(std::bind({}));",
            event.source_name,
            bound.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Indent;
    use crate::model::{ClassFlags, MethodFlags};
    use crate::registry::TypeInfo;
    use crate::types::TypeFlags;

    fn registry() -> TypeRegistry {
        let mut types = TypeRegistry::with_builtins();
        types.register("Texture", TypeInfo::new(TypeCategory::Resource, "Texture"));
        types.register("Font", TypeInfo::new(TypeCategory::Class, "Font"));
        types.register("CCamera", TypeInfo::new(TypeCategory::Component, "Camera"));
        types.register("Input", TypeInfo::new(TypeCategory::Class, "Input"));
        types.register("Vector2I", TypeInfo::new(TypeCategory::Struct, "Vector2I"));
        types.register("Bone", TypeInfo::new(TypeCategory::Struct, "Bone"));
        types.register(
            "TextureUtility",
            TypeInfo::new(TypeCategory::Class, "TextureUtility"),
        );
        types
    }

    fn named(mut method: MethodInfo) -> MethodInfo {
        method.interop_name = method.source_name.clone();
        method
    }

    fn render(block: &Block) -> String {
        block.render(Indent::Tab)
    }

    // ── Signatures ──

    #[test]
    fn test_instance_method_signature() {
        let types = registry();
        let class = ClassInfo::new("Texture");
        let interop = InteropClass::new(&class, &types).unwrap();
        let method = named(
            MethodInfo::new("getWidth").with_return(VarInfo::new("", "UINT32")),
        );
        assert_eq!(
            interop.method_signature(&method, false).unwrap(),
            "UINT32 Internal_getWidth(ScriptTexture* thisPtr)"
        );
        assert_eq!(
            interop.method_signature(&method, true).unwrap(),
            "UINT32 ScriptTexture::Internal_getWidth(ScriptTexture* thisPtr)"
        );
    }

    #[test]
    fn test_struct_return_becomes_output_parameter() {
        let types = registry();
        let class = ClassInfo::new("CCamera");
        let interop = InteropClass::new(&class, &types).unwrap();
        let method = named(
            MethodInfo::new("worldToScreen")
                .with_param(VarInfo::new("point", "Vector2I"))
                .with_return(VarInfo::new("", "Vector2I")),
        );
        assert_eq!(
            interop.method_signature(&method, false).unwrap(),
            "void Internal_worldToScreen(ScriptCCamera* thisPtr, Vector2I* point, Vector2I* __output)"
        );
        assert_eq!(
            render(&interop.method_body(&method).unwrap()),
            "*__output = thisPtr->getHandle()->worldToScreen(*point);\n"
        );
    }

    #[test]
    fn test_constructor_and_static_signatures() {
        let types = registry();
        let mut class = ClassInfo::new("Font");
        class.flags |= ClassFlags::IS_BASE_OF_SOMETHING;
        let interop = InteropClass::new(&class, &types).unwrap();

        let ctor = named(MethodInfo::constructor("Font").with_param(VarInfo::new("size", "UINT32")));
        assert_eq!(
            interop.method_signature(&ctor, false).unwrap(),
            "void Internal_Font(MonoObject* managedInstance, UINT32 size)"
        );

        let stat = named(MethodInfo::new("getDefault").with_flags(MethodFlags::STATIC));
        assert_eq!(
            interop.method_signature(&stat, false).unwrap(),
            "void Internal_getDefault()"
        );

        let inst = named(MethodInfo::new("reload"));
        assert_eq!(
            interop.method_signature(&inst, false).unwrap(),
            "void Internal_reload(ScriptFontBase* thisPtr)"
        );
    }

    // ── Bodies ──

    #[test]
    fn test_body_with_string_param_and_resource_return() {
        let types = registry();
        let class = ClassInfo::new("Font");
        let interop = InteropClass::new(&class, &types).unwrap();
        let method = named(
            MethodInfo::new("getTexture")
                .with_param(VarInfo::new("name", "String"))
                .with_return(VarInfo::new("", "Texture").with_ownership(Ownership::ResourceHandle)),
        );
        assert_eq!(
            render(&interop.method_body(&method).unwrap()),
            "String tmpname;\n\
             tmpname = MonoUtil::monoToString(name);\n\
             ResourceHandle<Texture> tmp__output;\n\
             tmp__output = thisPtr->getInternal()->getTexture(tmpname);\n\
             \n\
             MonoObject* __output;\n\
             ScriptResourceBase* script__output;\n\
             script__output = ScriptResourceManager::instance().getScriptResource(tmp__output, true);\n\
             __output = script__output->getManagedInstance();\n\
             \n\
             return __output;\n"
        );
    }

    #[test]
    fn test_body_output_params_follow_return() {
        let types = registry();
        let class = ClassInfo::new("Texture");
        let interop = InteropClass::new(&class, &types).unwrap();
        let method = named(
            MethodInfo::new("getName")
                .with_param(VarInfo::new("name", "String").output())
                .with_return(VarInfo::new("", "bool")),
        );
        let body = interop.method_body(&method).unwrap();
        let lines: Vec<String> = body.lines().into_iter().map(|(_, l)| l).collect();
        let ret = lines.iter().position(|l| l == "__output = tmp__output;").unwrap();
        let out = lines
            .iter()
            .position(|l| l == "*name = MonoUtil::stringToMono(tmpname);")
            .unwrap();
        assert!(ret < out);
        assert!(body.has_line("tmp__output = thisPtr->getHandle()->getName(tmpname);"));
    }

    #[test]
    fn test_raw_pointer_return_is_dereferenced() {
        let types = registry();
        let class = ClassInfo::new("Texture");
        let interop = InteropClass::new(&class, &types).unwrap();
        let method = named(MethodInfo::new("getCount").with_return(
            VarInfo::new("", "UINT32").with_ownership(Ownership::RawPointer),
        ));
        assert!(interop
            .method_body(&method)
            .unwrap()
            .has_line("tmp__output = *thisPtr->getHandle()->getCount();"));
    }

    #[test]
    fn test_constructor_bodies() {
        let types = registry();
        let class = ClassInfo::new("Font");
        let interop = InteropClass::new(&class, &types).unwrap();
        let ctor = named(MethodInfo::constructor("Font"));
        assert_eq!(
            render(&interop.method_body(&ctor).unwrap()),
            "SPtr<Font> instance = bs_shared_ptr_new<Font>();\n\
             ScriptFont* scriptInstance = new (bs_alloc<ScriptFont>()) ScriptFont(managedInstance, instance);\n"
        );

        let texture = ClassInfo::new("Texture");
        let interop = InteropClass::new(&texture, &types).unwrap();
        let mut ext = named(
            MethodInfo::new("create")
                .with_flags(MethodFlags::CONSTRUCTOR | MethodFlags::EXTERNAL)
                .with_param(VarInfo::new("width", "UINT32")),
        );
        ext.external_class = Some("TextureEx".to_string());
        assert_eq!(
            render(&interop.method_body(&ext).unwrap()),
            "ResourceHandle<Texture> instance = TextureEx::create(width);\n\
             ScriptResourceBase* scriptInstance = ScriptResourceManager::instance().createBuiltinScriptResource(instance, managedInstance);\n"
        );

        let plain = named(MethodInfo::constructor("Texture"));
        assert!(interop.method_body(&plain).is_err());
    }

    #[test]
    fn test_external_instance_method_injects_receiver() {
        let types = registry();
        let class = ClassInfo::new("Texture");
        let interop = InteropClass::new(&class, &types).unwrap();
        let mut method = named(
            MethodInfo::new("getPixels")
                .with_flags(MethodFlags::EXTERNAL)
                .with_param(VarInfo::new("mip", "UINT32")),
        );
        method.external_class = Some("TextureEx".to_string());
        method.receiver = Some(
            VarInfo::new("thisPtr", "Texture").with_ownership(Ownership::ResourceHandle),
        );
        assert!(interop
            .method_body(&method)
            .unwrap()
            .has_line("TextureEx::getPixels(thisPtr->getHandle(), mip);"));

        method.receiver = Some(VarInfo::new("thisPtr", "Texture").with_ownership(Ownership::RawPointer));
        assert!(interop
            .method_body(&method)
            .unwrap()
            .has_line("TextureEx::getPixels(thisPtr->getHandle().get(), mip);"));
    }

    #[test]
    fn test_module_calls_go_through_instance() {
        let types = registry();
        let mut class = ClassInfo::new("Input");
        class.flags |= ClassFlags::IS_SINGLETON_MODULE;
        let interop = InteropClass::new(&class, &types).unwrap();
        let method = named(MethodInfo::new("isButtonHeld").with_param(VarInfo::new("button", "UINT32")));
        assert_eq!(
            interop.method_signature(&method, false).unwrap(),
            "void Internal_isButtonHeld(UINT32 button)"
        );
        assert!(interop
            .method_body(&method)
            .unwrap()
            .has_line("Input::instance().isButtonHeld(button);"));
    }

    // ── Events ──

    #[test]
    fn test_instance_event_callback() {
        let types = registry();
        let class = ClassInfo::new("CCamera");
        let interop = InteropClass::new(&class, &types).unwrap();
        let event = named(
            MethodInfo::new("onResized")
                .with_param(VarInfo::new("width", "UINT32"))
                .with_param(VarInfo::new("bone", "Bone").with_flags(TypeFlags::COMPLEX_STRUCT)),
        );

        assert_eq!(
            interop.callback_signature(&event, false).unwrap(),
            "void onResized(UINT32 p0, const Bone& p1)"
        );
        assert_eq!(
            render(&interop.callback_body(&event).unwrap()),
            "__BoneInterop tmpp1;\n\
             tmpp1 = ScriptBone::toInterop(p1);\n\
             MonoUtil::invokeThunk(onResizedThunk, getManagedInstance(), p0, &tmpp1);\n"
        );
        assert_eq!(
            render(&interop.thunk_decl(&event).unwrap()),
            "typedef void(__stdcall *onResizedThunkDef) (MonoObject*, UINT32 width, __BoneInterop* bone, MonoException**);\n\
             static onResizedThunkDef onResizedThunk;\n"
        );
        assert_eq!(
            interop.instance_connect(&event),
            "value->onResized.connect(std::bind(&ScriptCCamera::onResized, this, std::placeholders::_1, std::placeholders::_2));"
        );
        assert_eq!(
            interop.thunk_init(&event).unwrap(),
            "onResizedThunk = (onResizedThunkDef)metaData.scriptClass->getMethodExact(\"Internal_onResized\", \"uint, Bone\")->getThunk();"
        );
    }

    #[test]
    fn test_static_event_callback() {
        let types = registry();
        let mut class = ClassInfo::new("Input");
        class.flags |= ClassFlags::IS_SINGLETON_MODULE;
        let interop = InteropClass::new(&class, &types).unwrap();
        let event = named(MethodInfo::new("onFocusLost"));

        assert_eq!(
            interop.callback_signature(&event, false).unwrap(),
            "static void onFocusLost()"
        );
        assert_eq!(
            interop.callback_signature(&event, true).unwrap(),
            "void ScriptInput::onFocusLost()"
        );
        assert!(interop
            .callback_body(&event)
            .unwrap()
            .has_line("MonoUtil::invokeThunk(onFocusLostThunk);"));
        assert_eq!(
            interop.static_connect(&event),
            "onFocusLostConn = Input::instance().onFocusLost.connect(&ScriptInput::onFocusLost);"
        );
    }

    #[test]
    fn test_non_object_class_is_rejected() {
        let types = registry();
        let class = ClassInfo::new("Vector2I");
        assert!(InteropClass::new(&class, &types).is_err());
    }
}
