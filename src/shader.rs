// Shader programs, stage builders and uniforms
//
// Thin owners of GL names. Nothing here is freed on drop: call
// `Shader::delete` before the backend goes away.

use anyhow::{Context, Result};
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::collections::HashMap;
use std::path::Path;

use crate::backend::{RenderBackend, ShaderType, INVALID_LOCATION};

/// Value type of a uniform variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformType {
    /// GLSL spelling of the type.
    pub fn glsl_name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat4 => "mat4",
        }
    }

    pub fn from_glsl_name(name: &str) -> Option<Self> {
        match name {
            "int" | "sampler2D" | "samplerCube" => Some(Self::Int),
            "float" => Some(Self::Float),
            "vec2" => Some(Self::Vec2),
            "vec3" => Some(Self::Vec3),
            "vec4" => Some(Self::Vec4),
            "mat4" => Some(Self::Mat4),
            _ => None,
        }
    }

    /// Zero value of this type, matching GL's initial uniform state.
    pub fn zero(self) -> UniformValue {
        match self {
            Self::Int => UniformValue::Int(0),
            Self::Float => UniformValue::Float(0.0),
            Self::Vec2 => UniformValue::Vec2(Vec2::ZERO),
            Self::Vec3 => UniformValue::Vec3(Vec3::ZERO),
            Self::Vec4 => UniformValue::Vec4(Vec4::ZERO),
            Self::Mat4 => UniformValue::Mat4(Mat4::ZERO),
        }
    }
}

/// A value that can be uploaded with `glUniform*`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Int(_) => UniformType::Int,
            Self::Float(_) => UniformType::Float,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }
}

/// A uniform of a linked program: location, type, and a staged value that is
/// only sent to the backend when it changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderUniform {
    location: i32,
    ty: UniformType,
    value: UniformValue,
    dirty: bool,
}

impl ShaderUniform {
    pub fn new(location: i32, ty: UniformType) -> Self {
        Self {
            location,
            ty,
            value: ty.zero(),
            dirty: false,
        }
    }

    pub fn location(&self) -> i32 {
        self.location
    }

    pub fn ty(&self) -> UniformType {
        self.ty
    }

    pub fn value(&self) -> &UniformValue {
        &self.value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Stage a new value. Fails if its type differs from the uniform's type.
    pub fn set(&mut self, value: UniformValue) -> Result<()> {
        if value.ty() != self.ty {
            anyhow::bail!(
                "Uniform at location {} is {}, cannot set {}",
                self.location,
                self.ty.glsl_name(),
                value.ty().glsl_name()
            );
        }
        if value != self.value {
            self.value = value;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn set_int(&mut self, v: i32) -> Result<()> {
        self.set(UniformValue::Int(v))
    }

    pub fn set_float(&mut self, v: f32) -> Result<()> {
        self.set(UniformValue::Float(v))
    }

    pub fn set_vec2(&mut self, v: Vec2) -> Result<()> {
        self.set(UniformValue::Vec2(v))
    }

    pub fn set_vec3(&mut self, v: Vec3) -> Result<()> {
        self.set(UniformValue::Vec3(v))
    }

    pub fn set_vec4(&mut self, v: Vec4) -> Result<()> {
        self.set(UniformValue::Vec4(v))
    }

    pub fn set_mat4(&mut self, v: Mat4) -> Result<()> {
        self.set(UniformValue::Mat4(v))
    }

    /// Upload the staged value if it changed. The owning program must be active.
    pub fn upload(&mut self, gl: &dyn RenderBackend) {
        if self.dirty {
            gl.uniform(self.location, &self.value);
            self.dirty = false;
        }
    }
}

/// Compiles a single shader stage.
#[derive(Debug, Clone)]
pub struct ShaderBuilder {
    ty: ShaderType,
    source: Option<String>,
    label: String,
}

impl ShaderBuilder {
    pub fn new(ty: ShaderType) -> Self {
        Self {
            ty,
            source: None,
            label: format!("{:?}", ty),
        }
    }

    pub fn ty(&self) -> ShaderType {
        self.ty
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Read GLSL source from `path`. The path becomes the label in errors.
    pub fn load_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read shader source: {:?}", path))?;
        self.source = Some(source);
        self.label = path.display().to_string();
        Ok(self)
    }

    /// Compile the stage and return its shader object name.
    ///
    /// On failure the shader object is deleted and the error carries the
    /// backend's info log.
    pub fn compile(self, gl: &dyn RenderBackend) -> Result<u32> {
        let source = self
            .source
            .with_context(|| format!("No source set for shader {}", self.label))?;

        let shader = gl.create_shader_object(self.ty);
        gl.shader_source(shader, &source);
        gl.compile_shader(shader);

        if !gl.shader_compiled(shader) {
            let info_log = gl.shader_info_log(shader);
            gl.delete_shader_object(shader);
            anyhow::bail!("Failed to compile shader {}: {}", self.label, info_log.trim());
        }

        log::debug!("Compiled shader {} -> {}", self.label, shader);
        Ok(shader)
    }
}

/// A program object plus the uniforms registered on it.
#[derive(Debug)]
pub struct Shader {
    program: u32,
    stages: Vec<u32>,
    uniforms: HashMap<String, ShaderUniform>,
    linked: bool,
}

impl Shader {
    pub fn new(program: u32) -> Self {
        Self {
            program,
            stages: Vec::new(),
            uniforms: HashMap::new(),
            linked: false,
        }
    }

    /// Compile every stage, attach and link them into a new program.
    /// Nothing leaks on failure.
    pub fn build<I>(gl: &dyn RenderBackend, stages: I) -> Result<Self>
    where
        I: IntoIterator<Item = ShaderBuilder>,
    {
        Self::build_with_bindings(gl, stages, &[])
    }

    /// Like [`build`](Self::build), binding `(index, name)` attribute
    /// locations before the link.
    pub fn build_with_bindings<I>(
        gl: &dyn RenderBackend,
        stages: I,
        bindings: &[(u32, &str)],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = ShaderBuilder>,
    {
        let mut shader = gl.create_shader();
        for builder in stages {
            match builder.compile(gl) {
                Ok(stage) => shader.attach(gl, stage),
                Err(e) => {
                    shader.delete(gl);
                    return Err(e);
                }
            }
        }
        for &(index, name) in bindings {
            shader.bind_attrib_location(gl, index, name);
        }
        if let Err(e) = shader.link(gl) {
            shader.delete(gl);
            return Err(e);
        }
        Ok(shader)
    }

    pub fn id(&self) -> u32 {
        self.program
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn attach(&mut self, gl: &dyn RenderBackend, stage: u32) {
        gl.attach_shader(self.program, stage);
        self.stages.push(stage);
    }

    /// Link the program. Attached stages are detached and deleted either way.
    pub fn link(&mut self, gl: &dyn RenderBackend) -> Result<()> {
        gl.link_program(self.program);
        for stage in self.stages.drain(..) {
            gl.detach_shader(self.program, stage);
            gl.delete_shader_object(stage);
        }

        self.linked = gl.program_linked(self.program);
        if !self.linked {
            let info_log = gl.program_info_log(self.program);
            anyhow::bail!("Failed to link program {}: {}", self.program, info_log.trim());
        }

        log::debug!("Linked program {}", self.program);
        Ok(())
    }

    pub fn bind(&self, gl: &dyn RenderBackend) {
        gl.use_program(self.program);
    }

    pub fn unbind(&self, gl: &dyn RenderBackend) {
        gl.use_program(0);
    }

    pub fn uniform_location(&self, gl: &dyn RenderBackend, name: &str) -> i32 {
        gl.get_uniform_location(self.program, name)
    }

    pub fn attrib_location(&self, gl: &dyn RenderBackend, name: &str) -> i32 {
        gl.get_attrib_location(self.program, name)
    }

    /// Must be called before [`link`](Self::link) to have any effect.
    pub fn bind_attrib_location(&self, gl: &dyn RenderBackend, index: u32, name: &str) {
        gl.bind_attrib_location(self.program, index, name);
    }

    /// Look up `name` and create a uniform for it.
    ///
    /// Binds this program as a side effect. Returns `Ok(false)` when the name
    /// is not an active uniform (e.g. optimized out by the compiler).
    pub fn register_uniform(
        &mut self,
        gl: &dyn RenderBackend,
        name: &str,
        ty: UniformType,
    ) -> Result<bool> {
        let location = self.uniform_location(gl, name);
        if location == INVALID_LOCATION {
            log::debug!("Uniform '{}' is not active in program {}", name, self.program);
            return Ok(false);
        }

        self.bind(gl);
        let uniform = gl
            .create_uniform(location, ty)
            .with_context(|| format!("Failed to create uniform '{}'", name))?;
        self.uniforms.insert(name.to_string(), uniform);
        Ok(true)
    }

    pub fn uniform(&self, name: &str) -> Option<&ShaderUniform> {
        self.uniforms.get(name)
    }

    pub fn uniform_mut(&mut self, name: &str) -> Option<&mut ShaderUniform> {
        self.uniforms.get_mut(name)
    }

    /// Push every changed uniform. The program must be active.
    pub fn upload_uniforms(&mut self, gl: &dyn RenderBackend) {
        for uniform in self.uniforms.values_mut() {
            uniform.upload(gl);
        }
    }

    /// Delete the program and any stage objects still attached to it.
    pub fn delete(mut self, gl: &dyn RenderBackend) {
        for stage in self.stages.drain(..) {
            gl.detach_shader(self.program, stage);
            gl.delete_shader_object(stage);
        }
        gl.delete_program(self.program);
    }
}
