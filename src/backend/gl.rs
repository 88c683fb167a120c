// Render backend interface
//
// One method per native GL entry point. The trait owns no state: every call
// acts on the backend's implicit current context (active program, bound
// vertex array, bound buffers, viewport). Callers serialize access to a
// single backend instance.

use anyhow::Result;

use super::enums::{BufferTarget, ClearFlags, DataType, DrawMode, ShaderType};
use crate::shader::{Shader, ShaderBuilder, ShaderUniform, UniformType, UniformValue};

/// Location returned by name lookups when the name is not active in the program.
pub const INVALID_LOCATION: i32 = -1;

/// The "no object" name. Binding it unbinds the target.
pub const NO_OBJECT: u32 = 0;

/// A native rendering backend.
///
/// Handles are plain GL object names. The backend owns the objects; callers
/// hold non-owning names and must `delete_*` them explicitly.
pub trait RenderBackend {
    // -------------------------------------------------------------------------
    // Framebuffer
    // -------------------------------------------------------------------------

    /// `glClear`: clears the buffers selected by `flags` on the bound target.
    fn clear(&self, flags: ClearFlags);

    /// `glViewport`.
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    // -------------------------------------------------------------------------
    // Shaders and programs
    // -------------------------------------------------------------------------

    /// Creates a uniform handle for `location` in the currently bound program.
    ///
    /// Fails if no program is bound or `location` is not one of its active
    /// uniform locations.
    fn create_uniform(&self, location: i32, ty: UniformType) -> Result<ShaderUniform>;

    /// `glGetUniformLocation`. Returns [`INVALID_LOCATION`] when `name` is not
    /// an active uniform; never fails.
    fn get_uniform_location(&self, program: u32, name: &str) -> i32;

    /// Allocates a new program object wrapped in a [`Shader`].
    fn create_shader(&self) -> Shader {
        Shader::new(self.create_program())
    }

    /// Returns a builder that compiles one shader stage of type `ty`.
    fn create_shader_builder(&self, ty: ShaderType) -> ShaderBuilder {
        ShaderBuilder::new(ty)
    }

    /// `glAttachShader`.
    fn attach_shader(&self, program: u32, shader: u32);

    /// `glDetachShader`.
    fn detach_shader(&self, program: u32, shader: u32);

    /// `glUseProgram`. `0` deactivates.
    fn use_program(&self, program: u32);

    /// `glCreateProgram`.
    fn create_program(&self) -> u32;

    /// `glDeleteProgram`.
    fn delete_program(&self, program: u32);

    /// `glLinkProgram`. Check the outcome with [`program_linked`](Self::program_linked).
    fn link_program(&self, program: u32);

    /// `GL_LINK_STATUS`.
    fn program_linked(&self, program: u32) -> bool;

    /// `glGetProgramInfoLog`.
    fn program_info_log(&self, program: u32) -> String;

    /// `glCreateShader`.
    fn create_shader_object(&self, ty: ShaderType) -> u32;

    /// `glDeleteShader`.
    fn delete_shader_object(&self, shader: u32);

    /// `glShaderSource`.
    fn shader_source(&self, shader: u32, source: &str);

    /// `glCompileShader`. Check the outcome with [`shader_compiled`](Self::shader_compiled).
    fn compile_shader(&self, shader: u32);

    /// `GL_COMPILE_STATUS`.
    fn shader_compiled(&self, shader: u32) -> bool;

    /// `glGetShaderInfoLog`.
    fn shader_info_log(&self, shader: u32) -> String;

    /// `glUniform*` on the active program. Location `-1` is silently ignored.
    fn uniform(&self, location: i32, value: &UniformValue);

    // -------------------------------------------------------------------------
    // Vertex arrays and buffers
    // -------------------------------------------------------------------------

    /// `glGenVertexArrays` for a single name. Never returns `0`.
    fn gen_vertex_array(&self) -> u32;

    /// `glBindVertexArray`.
    fn bind_vertex_array(&self, array: u32);

    /// `glDeleteVertexArrays` for a single name.
    fn delete_vertex_array(&self, array: u32);

    /// `glGenBuffers` for a single name. Never returns `0`.
    fn gen_buffer(&self) -> u32;

    /// `glBindBuffer`.
    fn bind_buffer(&self, target: BufferTarget, buffer: u32);

    /// `glDeleteBuffers` for a single name.
    fn delete_buffer(&self, buffer: u32);

    // -------------------------------------------------------------------------
    // Vertex attributes
    // -------------------------------------------------------------------------

    /// `glGetAttribLocation`. Returns [`INVALID_LOCATION`] when `name` is not
    /// an active attribute; never fails.
    fn get_attrib_location(&self, program: u32, name: &str) -> i32;

    /// `glBindAttribLocation`. Only takes effect at the next link.
    fn bind_attrib_location(&self, program: u32, index: u32, name: &str);

    /// `glEnableVertexAttribArray`.
    fn enable_vertex_attrib_array(&self, index: u32);

    /// `glDisableVertexAttribArray`.
    fn disable_vertex_attrib_array(&self, index: u32);

    /// `glVertexAttribPointer`.
    ///
    /// * `size` - components per vertex, 1 to 4
    /// * `stride` - byte pitch between vertices, `0` for tightly packed
    /// * `pointer` - byte offset into the buffer bound to [`BufferTarget::Array`]
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        ty: DataType,
        normalized: bool,
        stride: i32,
        pointer: usize,
    );

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    /// `glDrawElements`: draws `count` indices of type `ty` starting at byte
    /// offset `indices` into the bound element buffer.
    fn draw_elements(&self, mode: DrawMode, count: i32, ty: DataType, indices: usize);
}
