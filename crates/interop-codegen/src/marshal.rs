//! Marshaling engine: per-value conversion code around an interop call.
//!
//! For every parameter, return value or struct field the engine produces a
//! pre-call block (declare native temporaries and convert inputs), the
//! argument handed to the native call, and a post-call block (convert native
//! results back and store them in the output slot or return value).

use crate::code::Block;
use crate::diagnostics::{GenerateError, Result};
use crate::model::VarInfo;
use crate::registry::{TypeInfo, TypeRegistry};
use crate::types::{
    ArgShape, ObjectHandle, Ownership, TypeCategory, forward_to_managed, forward_to_native,
    native_type, struct_interop_name, wrapper_name,
};

/// Which way a value travels relative to the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Managed value passed into the native call.
    Input,
    /// Native result written through an output pointer.
    Output,
    /// Native result returned directly from the interop function.
    Return,
}

impl Direction {
    /// Expression the converted result is stored into.
    fn target(self, name: &str) -> String {
        match self {
            Direction::Output => format!("*{name}"),
            Direction::Input | Direction::Return => name.to_string(),
        }
    }
}

/// How a native handle is turned into its managed wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleResolution {
    /// Find the existing wrapper or create one (resources, scene objects).
    LookupOrCreate,
    /// The wrapper must already exist (builtin components).
    LookupOnly,
    /// A new wrapper is constructed every time (classes).
    AlwaysCreate,
}

impl HandleResolution {
    pub fn of(handle: ObjectHandle) -> Self {
        match handle {
            ObjectHandle::Resource | ObjectHandle::SceneObject => HandleResolution::LookupOrCreate,
            ObjectHandle::Component => HandleResolution::LookupOnly,
            ObjectHandle::Class => HandleResolution::AlwaysCreate,
        }
    }
}

/// Generated code for a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marshaled {
    pub pre: Block,
    /// Variable holding the native-side value.
    pub arg: String,
    pub shape: ArgShape,
    pub post: Block,
}

impl Marshaled {
    fn direct(arg: &str, shape: ArgShape) -> Self {
        Self {
            pre: Block::new(),
            arg: arg.to_string(),
            shape,
            post: Block::new(),
        }
    }

    fn temp(arg: String, pre: Block, post: Block) -> Self {
        Self {
            pre,
            arg,
            shape: ArgShape::Value,
            post,
        }
    }

    /// Expression a native result can be assigned to.
    pub fn lvalue(&self) -> String {
        match self.shape {
            ArgShape::Pointer => format!("*{}", self.arg),
            ArgShape::Value => self.arg.clone(),
        }
    }
}

/// Produces marshaling code using the categories in a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Marshaler<'a> {
    types: &'a TypeRegistry,
}

impl<'a> Marshaler<'a> {
    pub fn new(types: &'a TypeRegistry) -> Self {
        Self { types }
    }

    fn info(&self, var: &VarInfo, context: &str) -> Result<&'a TypeInfo> {
        self.types.resolve(&var.type_name, context)
    }

    pub fn category(&self, var: &VarInfo, context: &str) -> Result<TypeCategory> {
        Ok(self.info(var, context)?.category)
    }

    /// Conversion code for a parameter or return value named `var.name`.
    pub fn marshal(&self, var: &VarInfo, direction: Direction, context: &str) -> Result<Marshaled> {
        let info = self.info(var, context)?;
        log::trace!(
            "{context}: marshaling `{}` ({:?}, {:?}) as {direction:?}",
            var.name,
            info.category,
            var.flags
        );

        if var.flags.is_array() {
            return self.marshal_array(var, info, direction, context);
        }

        let category = info.category;
        // Plain structs never come back by value; they are written through a pointer.
        let direction = if category.is_plain_struct(var.flags) && direction == Direction::Return {
            Direction::Output
        } else {
            direction
        };

        let name = var.name.as_str();
        let type_name = var.type_name.as_str();
        let tmp = format!("tmp{name}");
        let target = direction.target(name);
        let mut pre = Block::new();
        let mut post = Block::new();

        let marshaled = match category {
            TypeCategory::Builtin | TypeCategory::Enum => match direction {
                Direction::Input => Marshaled::direct(name, ArgShape::Value),
                Direction::Output => Marshaled::direct(name, ArgShape::Pointer),
                Direction::Return => {
                    pre.line(format!("{type_name} {tmp};"));
                    post.line(format!("{target} = {tmp};"));
                    Marshaled::temp(tmp, pre, post)
                }
            },
            TypeCategory::Struct if var.flags.is_complex() => {
                let script = wrapper_name(type_name);
                pre.line(format!("{type_name} {tmp};"));
                match direction {
                    Direction::Input => {
                        pre.line(format!("{tmp} = {script}::fromInterop(*{name});"));
                    }
                    Direction::Output | Direction::Return => {
                        post.line(format!("{target} = {script}::toInterop({tmp});"));
                    }
                }
                Marshaled::temp(tmp, pre, post)
            }
            TypeCategory::Struct => Marshaled::direct(name, ArgShape::Pointer),
            TypeCategory::String | TypeCategory::WideString => {
                let (native, to_native, to_managed) = string_conversions(category);
                pre.line(format!("{native} {tmp};"));
                match direction {
                    Direction::Input => {
                        pre.line(format!("{tmp} = MonoUtil::{to_native}({name});"));
                    }
                    Direction::Output | Direction::Return => {
                        post.line(format!("{target} = MonoUtil::{to_managed}({tmp});"));
                    }
                }
                Marshaled::temp(tmp, pre, post)
            }
            TypeCategory::ManagedObject => {
                if direction == Direction::Input {
                    return Err(GenerateError::fatal(
                        context,
                        format!("`{name}` of type {type_name} cannot be passed as an input"),
                    ));
                }
                pre.line(format!("{} {tmp};", native_type(type_name, category)));
                post.line(format!("{target} = {tmp}->getManagedInstance();"));
                Marshaled::temp(tmp, pre, post)
            }
            TypeCategory::Class
            | TypeCategory::Resource
            | TypeCategory::Component
            | TypeCategory::SceneObject => {
                let handle = category
                    .object_handle()
                    .ok_or_else(|| GenerateError::fatal(context, "expected an object handle"))?;
                match direction {
                    Direction::Input => {
                        pre.append(managed_to_native(handle, type_name, name, name));
                    }
                    Direction::Output | Direction::Return => {
                        pre.line(format!("{} {tmp};", handle.wrapped_type(type_name)));
                        let (lines, managed) =
                            native_to_managed(handle, type_name, &format!("script{name}"), &tmp);
                        post.append(lines);
                        post.line(format!("{target} = {managed};"));
                    }
                }
                Marshaled::temp(tmp, pre, post)
            }
        };
        Ok(marshaled)
    }

    fn marshal_array(
        &self,
        var: &VarInfo,
        info: &TypeInfo,
        direction: Direction,
        context: &str,
    ) -> Result<Marshaled> {
        let name = var.name.as_str();
        let vec = format!("vec{name}");
        let mut pre = Block::new();
        let mut post = Block::new();

        match direction {
            Direction::Input => {
                pre.append(array_from_managed(var, info, name, context)?);
            }
            Direction::Output | Direction::Return => {
                pre.line(format!(
                    "Vector<{}> {vec};",
                    native_type(&var.type_name, info.category)
                ));
                post.append(array_to_managed(var, info, &vec)?);
                post.line(format!(
                    "{} = array{name}.getInternal();",
                    direction.target(name)
                ));
            }
        }
        Ok(Marshaled::temp(vec, pre, post))
    }

    /// The argument passed to the native call for a marshaled value.
    pub fn forward(&self, var: &VarInfo, marshaled: &Marshaled, context: &str) -> Result<String> {
        let category = self.category(var, context)?;
        forward_to_native(&marshaled.arg, category, var.flags, marshaled.shape, context)
    }

    /// Convert field `value.<name>` of a native struct into its flattened
    /// layout. Returns the setup lines and the converted expression.
    pub fn field_to_interop(&self, field: &VarInfo, context: &str) -> Result<(Block, String)> {
        let info = self.info(field, context)?;
        let name = field.name.as_str();
        let type_name = field.type_name.as_str();
        let source = format!("value.{name}");
        let tmp = format!("tmp{name}");
        let mut pre = Block::new();

        if field.flags.is_array() {
            pre.append(array_to_managed(field, info, &source)?);
            return Ok((pre, format!("array{name}.getInternal()")));
        }

        let expr = match info.category {
            TypeCategory::Builtin | TypeCategory::Enum => source,
            TypeCategory::Struct if field.flags.is_complex() => {
                pre.line(format!("{} {tmp};", struct_interop_name(type_name)));
                pre.line(format!(
                    "{tmp} = {}::toInterop({source});",
                    wrapper_name(type_name)
                ));
                tmp
            }
            TypeCategory::Struct => source,
            TypeCategory::String | TypeCategory::WideString => {
                let (_, _, to_managed) = string_conversions(info.category);
                pre.line(format!("MonoString* {tmp};"));
                pre.line(format!("{tmp} = MonoUtil::{to_managed}({source});"));
                tmp
            }
            TypeCategory::ManagedObject => {
                return Err(invalid_field(context, field));
            }
            TypeCategory::Class
            | TypeCategory::Resource
            | TypeCategory::Component
            | TypeCategory::SceneObject => {
                let handle = handle_of(info.category, context)?;
                let (lines, managed) =
                    native_to_managed(handle, type_name, &format!("script{name}"), &source);
                pre.append(lines);
                pre.line(format!("MonoObject* {tmp};"));
                pre.line(format!("{tmp} = {managed};"));
                tmp
            }
        };
        Ok((pre, expr))
    }

    /// Convert field `value.<name>` of a flattened struct back to native.
    pub fn field_from_interop(&self, field: &VarInfo, context: &str) -> Result<(Block, String)> {
        let info = self.info(field, context)?;
        let name = field.name.as_str();
        let type_name = field.type_name.as_str();
        let source = format!("value.{name}");
        let tmp = format!("tmp{name}");
        let mut pre = Block::new();

        if field.flags.is_array() {
            pre.append(array_from_managed(field, info, &source, context)?);
            return Ok((pre, format!("vec{name}")));
        }

        let expr = match info.category {
            TypeCategory::Builtin | TypeCategory::Enum => source,
            TypeCategory::Struct if field.flags.is_complex() => {
                pre.line(format!("{type_name} {tmp};"));
                pre.line(format!(
                    "{tmp} = {}::fromInterop({source});",
                    wrapper_name(type_name)
                ));
                tmp
            }
            TypeCategory::Struct => source,
            TypeCategory::String | TypeCategory::WideString => {
                let (native, to_native, _) = string_conversions(info.category);
                pre.line(format!("{native} {tmp};"));
                pre.line(format!("{tmp} = MonoUtil::{to_native}({source});"));
                tmp
            }
            TypeCategory::ManagedObject => {
                return Err(invalid_field(context, field));
            }
            TypeCategory::Class
            | TypeCategory::Resource
            | TypeCategory::Component
            | TypeCategory::SceneObject => {
                let handle = handle_of(info.category, context)?;
                pre.append(managed_to_native(handle, type_name, &source, name));
                tmp
            }
        };
        Ok((pre, expr))
    }

    /// Convert native callback argument `name` into the value passed to the
    /// managed thunk. Returns the setup lines and the thunk argument.
    pub fn callback_arg(&self, var: &VarInfo, name: &str, context: &str) -> Result<(Block, String)> {
        let info = self.info(var, context)?;
        let type_name = var.type_name.as_str();
        let tmp = format!("tmp{name}");
        let mut pre = Block::new();

        if var.flags.is_array() {
            let vec = format!("vec{name}");
            pre.append(array_to_managed(var, info, name)?);
            pre.line(format!("MonoArray* {vec};"));
            pre.line(format!("{vec} = array{name}.getInternal();"));
            return Ok((pre, vec));
        }

        let is_raw = var.flags.ownership() == Some(Ownership::RawPointer);
        let source = if is_raw && !matches!(info.category, TypeCategory::Builtin | TypeCategory::Enum)
        {
            format!("*{name}")
        } else {
            name.to_string()
        };

        let arg = match info.category {
            TypeCategory::Builtin | TypeCategory::Enum => {
                forward_to_managed(name, info.category, var.flags, context)?
            }
            TypeCategory::Struct if var.flags.is_complex() => {
                pre.line(format!("{} {tmp};", struct_interop_name(type_name)));
                pre.line(format!(
                    "{tmp} = {}::toInterop({source});",
                    wrapper_name(type_name)
                ));
                format!("&{tmp}")
            }
            TypeCategory::Struct => forward_to_managed(name, info.category, var.flags, context)?,
            TypeCategory::String | TypeCategory::WideString => {
                let (_, _, to_managed) = string_conversions(info.category);
                pre.line(format!("MonoString* {tmp};"));
                pre.line(format!("{tmp} = MonoUtil::{to_managed}({source});"));
                tmp
            }
            TypeCategory::ManagedObject => {
                pre.line(format!("MonoObject* {tmp};"));
                pre.line(format!("{tmp} = {name}->getManagedInstance();"));
                tmp
            }
            TypeCategory::Class
            | TypeCategory::Resource
            | TypeCategory::Component
            | TypeCategory::SceneObject => {
                let handle = handle_of(info.category, context)?;
                let (lines, managed) =
                    native_to_managed(handle, type_name, &format!("script{name}"), name);
                pre.append(lines);
                pre.line(format!("MonoObject* {tmp};"));
                pre.line(format!("{tmp} = {managed};"));
                tmp
            }
        };
        Ok((pre, arg))
    }
}

fn handle_of(category: TypeCategory, context: &str) -> Result<ObjectHandle> {
    category
        .object_handle()
        .ok_or_else(|| GenerateError::fatal(context, format!("{category:?} is not an object handle")))
}

fn invalid_field(context: &str, field: &VarInfo) -> GenerateError {
    GenerateError::fatal(
        context,
        format!(
            "field `{}` of type {} cannot be stored in a struct",
            field.name, field.type_name
        ),
    )
}

/// Native string type and the conversions to and from it.
fn string_conversions(category: TypeCategory) -> (&'static str, &'static str, &'static str) {
    match category {
        TypeCategory::WideString => ("WString", "monoToWString", "wstringToMono"),
        _ => ("String", "monoToString", "stringToMono"),
    }
}

/// Lines that resolve managed wrapper `source` into native temporary `tmp<name>`.
/// A null wrapper leaves the temporary default-constructed.
fn managed_to_native(handle: ObjectHandle, type_name: &str, source: &str, name: &str) -> Block {
    let tmp = format!("tmp{name}");
    let script = format!("script{name}");
    let script_type = wrapper_name(type_name);

    let mut block = Block::new();
    block.line(format!("{} {tmp};", handle.wrapped_type(type_name)));
    block.line(format!("{script_type}* {script};"));
    block.line(format!("{script} = {script_type}::toNative({source});"));
    block.line(format!("if({script} != nullptr)"));
    let mut assign = Block::new();
    assign.line(format!("{tmp} = {script}->{}();", handle.accessor()));
    block.nest(assign);
    block
}

/// Lines that find or create the managed wrapper of `native`, and the
/// expression yielding the managed object.
pub fn native_to_managed(
    handle: ObjectHandle,
    type_name: &str,
    script: &str,
    native: &str,
) -> (Block, String) {
    let script_type = wrapper_name(type_name);
    let mut block = Block::new();
    match handle {
        ObjectHandle::Resource => {
            block.line(format!("ScriptResourceBase* {script};"));
            block.line(format!(
                "{script} = ScriptResourceManager::instance().getScriptResource({native}, true);"
            ));
        }
        ObjectHandle::Component => {
            block.line(format!("{script_type}* {script};"));
            block.line(format!(
                "{script} = ScriptGameObjectManager::instance().getBuiltinScriptComponent({native});"
            ));
        }
        ObjectHandle::SceneObject => {
            block.line(format!("{script_type}* {script};"));
            block.line(format!(
                "{script} = ScriptGameObjectManager::instance().getOrCreateScriptSceneObject({native});"
            ));
        }
        ObjectHandle::Class => {
            return (block, format!("{script_type}::create({native})"));
        }
    }
    (block, format!("{script}->getManagedInstance()"))
}

/// Element type of the managed array holding values of `info`.
fn entry_type(type_name: &str, category: TypeCategory) -> String {
    match category {
        TypeCategory::Builtin
        | TypeCategory::Enum
        | TypeCategory::String
        | TypeCategory::WideString => type_name.to_string(),
        TypeCategory::ManagedObject => "MonoObject*".to_string(),
        TypeCategory::Struct
        | TypeCategory::Class
        | TypeCategory::Resource
        | TypeCategory::Component
        | TypeCategory::SceneObject => wrapper_name(type_name),
    }
}

fn counted_loop(count: &str, body: Block) -> Block {
    let mut block = Block::new();
    block.scope(format!("for(int i = 0; i < (int){count}; i++)"), body);
    block
}

/// Build native `vec<name>` from the managed array `source`.
fn array_from_managed(var: &VarInfo, info: &TypeInfo, source: &str, context: &str) -> Result<Block> {
    let name = var.name.as_str();
    let type_name = var.type_name.as_str();
    let category = info.category;
    let array = format!("array{name}");
    let vec = format!("vec{name}");
    let entry = entry_type(type_name, category);

    let mut body = Block::new();
    match category {
        TypeCategory::Builtin | TypeCategory::String | TypeCategory::WideString => {
            body.line(format!("{vec}[i] = {array}.get<{entry}>(i);"));
        }
        TypeCategory::Enum => {
            body.line(format!(
                "{vec}[i] = ({type_name}){array}.get<{}>(i);",
                info.enum_underlying_type()
            ));
        }
        TypeCategory::Struct => {
            let unboxed = format!("{entry}::unbox({array}.get<MonoObject*>(i))");
            if var.flags.is_complex() {
                body.line(format!("{vec}[i] = {entry}::fromInterop({unboxed});"));
            } else {
                body.line(format!("{vec}[i] = {unboxed};"));
            }
        }
        TypeCategory::ManagedObject => {
            return Err(GenerateError::fatal(
                context,
                format!("array `{name}` of {type_name} cannot be passed as an input"),
            ));
        }
        TypeCategory::Class
        | TypeCategory::Resource
        | TypeCategory::Component
        | TypeCategory::SceneObject => {
            let handle = handle_of(category, context)?;
            let script = format!("script{name}");
            body.line(format!("{entry}* {script};"));
            body.line(format!(
                "{script} = {entry}::toNative({array}.get<MonoObject*>(i));"
            ));
            body.line(format!("if({script} != nullptr)"));
            let mut assign = Block::new();
            assign.line(format!("{vec}[i] = {script}->{}();", handle.accessor()));
            body.nest(assign);
        }
    }

    let mut block = Block::new();
    block.line(format!("ScriptArray {array}({source});"));
    block.line(format!(
        "Vector<{}> {vec}({array}.size());",
        native_type(type_name, category)
    ));
    block.append(counted_loop(&format!("{array}.size()"), body));
    Ok(block)
}

/// Build managed `array<name>` from the native sequence `source`.
fn array_to_managed(var: &VarInfo, info: &TypeInfo, source: &str) -> Result<Block> {
    let name = var.name.as_str();
    let type_name = var.type_name.as_str();
    let category = info.category;
    let array = format!("array{name}");
    let entry = entry_type(type_name, category);
    let element = format!("{source}[i]");

    let mut body = Block::new();
    match category {
        TypeCategory::Builtin | TypeCategory::String | TypeCategory::WideString => {
            body.line(format!("{array}.set(i, {element});"));
        }
        TypeCategory::Enum => {
            body.line(format!(
                "{array}.set(i, ({}){element});",
                info.enum_underlying_type()
            ));
        }
        TypeCategory::Struct => {
            if var.flags.is_complex() {
                body.line(format!(
                    "{array}.set(i, {entry}::box({entry}::toInterop({element})));"
                ));
            } else {
                body.line(format!("{array}.set(i, {entry}::box({element}));"));
            }
        }
        TypeCategory::ManagedObject => {
            body.line(format!("{array}.set(i, {element}->getManagedInstance());"));
        }
        TypeCategory::Class
        | TypeCategory::Resource
        | TypeCategory::Component
        | TypeCategory::SceneObject => {
            let handle = handle_of(category, "array element")?;
            let script = format!("script{name}");
            let (lines, managed) = native_to_managed(handle, type_name, &script, &element);
            if HandleResolution::of(handle) == HandleResolution::AlwaysCreate {
                body.line(format!("{array}.set(i, {managed});"));
            } else {
                // Elements without a wrapper are left unset
                body.append(lines);
                body.line(format!("if({script} != nullptr)"));
                let mut assign = Block::new();
                assign.line(format!("{array}.set(i, {managed});"));
                body.nest(assign);
            }
        }
    }

    let mut block = Block::new();
    block.line(format!(
        "ScriptArray {array} = ScriptArray::create<{entry}>((int){source}.size());"
    ));
    block.append(counted_loop(&format!("{source}.size()"), body));
    Ok(block)
}
