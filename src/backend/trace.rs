// Call tracing decorator
//
// Wraps any backend, logs every call under the `gl` target at trace level
// and counts calls per entry point. Enable with RUST_LOG=gl=trace.

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::enums::{BufferTarget, ClearFlags, DataType, DrawMode, ShaderType};
use super::gl::RenderBackend;
use crate::shader::{ShaderUniform, UniformType, UniformValue};

const TARGET: &str = "gl";

pub struct TracingGl<B> {
    inner: B,
    calls: Mutex<BTreeMap<&'static str, u64>>,
}

impl<B: RenderBackend> TracingGl<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            calls: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    /// Number of times `name` was called.
    pub fn call_count(&self, name: &str) -> u64 {
        self.calls.lock().get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.calls.lock().values().sum()
    }

    /// Log per-call counts at debug level.
    pub fn log_summary(&self) {
        let calls = self.calls.lock();
        log::debug!(target: TARGET, "{} backend calls", calls.values().sum::<u64>());
        for (name, count) in calls.iter() {
            log::debug!(target: TARGET, "  {:<28} {}", name, count);
        }
    }

    fn record(&self, name: &'static str) {
        *self.calls.lock().entry(name).or_insert(0) += 1;
    }
}

impl<B: RenderBackend> RenderBackend for TracingGl<B> {
    fn clear(&self, flags: ClearFlags) {
        self.record("clear");
        log::trace!(target: TARGET, "clear({:#x})", flags.bits());
        self.inner.clear(flags);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record("viewport");
        log::trace!(target: TARGET, "viewport({}, {}, {}, {})", x, y, width, height);
        self.inner.viewport(x, y, width, height);
    }

    fn create_uniform(&self, location: i32, ty: UniformType) -> Result<ShaderUniform> {
        self.record("create_uniform");
        let result = self.inner.create_uniform(location, ty);
        log::trace!(target: TARGET, "create_uniform({}, {:?}) -> ok={}", location, ty, result.is_ok());
        result
    }

    fn get_uniform_location(&self, program: u32, name: &str) -> i32 {
        self.record("get_uniform_location");
        let location = self.inner.get_uniform_location(program, name);
        log::trace!(target: TARGET, "get_uniform_location({}, {:?}) -> {}", program, name, location);
        location
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record("attach_shader");
        log::trace!(target: TARGET, "attach_shader({}, {})", program, shader);
        self.inner.attach_shader(program, shader);
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record("detach_shader");
        log::trace!(target: TARGET, "detach_shader({}, {})", program, shader);
        self.inner.detach_shader(program, shader);
    }

    fn use_program(&self, program: u32) {
        self.record("use_program");
        log::trace!(target: TARGET, "use_program({})", program);
        self.inner.use_program(program);
    }

    fn create_program(&self) -> u32 {
        self.record("create_program");
        let program = self.inner.create_program();
        log::trace!(target: TARGET, "create_program() -> {}", program);
        program
    }

    fn delete_program(&self, program: u32) {
        self.record("delete_program");
        log::trace!(target: TARGET, "delete_program({})", program);
        self.inner.delete_program(program);
    }

    fn link_program(&self, program: u32) {
        self.record("link_program");
        log::trace!(target: TARGET, "link_program({})", program);
        self.inner.link_program(program);
    }

    fn program_linked(&self, program: u32) -> bool {
        self.record("program_linked");
        self.inner.program_linked(program)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.record("program_info_log");
        self.inner.program_info_log(program)
    }

    fn create_shader_object(&self, ty: ShaderType) -> u32 {
        self.record("create_shader_object");
        let shader = self.inner.create_shader_object(ty);
        log::trace!(target: TARGET, "create_shader_object({:?}) -> {}", ty, shader);
        shader
    }

    fn delete_shader_object(&self, shader: u32) {
        self.record("delete_shader_object");
        log::trace!(target: TARGET, "delete_shader_object({})", shader);
        self.inner.delete_shader_object(shader);
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.record("shader_source");
        log::trace!(target: TARGET, "shader_source({}, <{} bytes>)", shader, source.len());
        self.inner.shader_source(shader, source);
    }

    fn compile_shader(&self, shader: u32) {
        self.record("compile_shader");
        log::trace!(target: TARGET, "compile_shader({})", shader);
        self.inner.compile_shader(shader);
    }

    fn shader_compiled(&self, shader: u32) -> bool {
        self.record("shader_compiled");
        self.inner.shader_compiled(shader)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.record("shader_info_log");
        self.inner.shader_info_log(shader)
    }

    fn uniform(&self, location: i32, value: &UniformValue) {
        self.record("uniform");
        log::trace!(target: TARGET, "uniform({}, {:?})", location, value);
        self.inner.uniform(location, value);
    }

    fn gen_vertex_array(&self) -> u32 {
        self.record("gen_vertex_array");
        let array = self.inner.gen_vertex_array();
        log::trace!(target: TARGET, "gen_vertex_array() -> {}", array);
        array
    }

    fn bind_vertex_array(&self, array: u32) {
        self.record("bind_vertex_array");
        log::trace!(target: TARGET, "bind_vertex_array({})", array);
        self.inner.bind_vertex_array(array);
    }

    fn delete_vertex_array(&self, array: u32) {
        self.record("delete_vertex_array");
        log::trace!(target: TARGET, "delete_vertex_array({})", array);
        self.inner.delete_vertex_array(array);
    }

    fn gen_buffer(&self) -> u32 {
        self.record("gen_buffer");
        let buffer = self.inner.gen_buffer();
        log::trace!(target: TARGET, "gen_buffer() -> {}", buffer);
        buffer
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: u32) {
        self.record("bind_buffer");
        log::trace!(target: TARGET, "bind_buffer({:?}, {})", target, buffer);
        self.inner.bind_buffer(target, buffer);
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record("delete_buffer");
        log::trace!(target: TARGET, "delete_buffer({})", buffer);
        self.inner.delete_buffer(buffer);
    }

    fn get_attrib_location(&self, program: u32, name: &str) -> i32 {
        self.record("get_attrib_location");
        let location = self.inner.get_attrib_location(program, name);
        log::trace!(target: TARGET, "get_attrib_location({}, {:?}) -> {}", program, name, location);
        location
    }

    fn bind_attrib_location(&self, program: u32, index: u32, name: &str) {
        self.record("bind_attrib_location");
        log::trace!(target: TARGET, "bind_attrib_location({}, {}, {:?})", program, index, name);
        self.inner.bind_attrib_location(program, index, name);
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record("enable_vertex_attrib_array");
        log::trace!(target: TARGET, "enable_vertex_attrib_array({})", index);
        self.inner.enable_vertex_attrib_array(index);
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        self.record("disable_vertex_attrib_array");
        log::trace!(target: TARGET, "disable_vertex_attrib_array({})", index);
        self.inner.disable_vertex_attrib_array(index);
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        ty: DataType,
        normalized: bool,
        stride: i32,
        pointer: usize,
    ) {
        self.record("vertex_attrib_pointer");
        log::trace!(
            target: TARGET,
            "vertex_attrib_pointer({}, {}, {:?}, {}, {}, {})",
            index,
            size,
            ty,
            normalized,
            stride,
            pointer
        );
        self.inner
            .vertex_attrib_pointer(index, size, ty, normalized, stride, pointer);
    }

    fn draw_elements(&self, mode: DrawMode, count: i32, ty: DataType, indices: usize) {
        self.record("draw_elements");
        log::trace!(target: TARGET, "draw_elements({:?}, {}, {:?}, {})", mode, count, ty, indices);
        self.inner.draw_elements(mode, count, ty, indices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessGl;

    #[test]
    fn forwards_and_counts() {
        let gl = TracingGl::new(HeadlessGl::new(32, 32));
        let a = gl.gen_buffer();
        let b = gl.gen_buffer();
        gl.bind_buffer(BufferTarget::Array, b);
        gl.viewport(0, 0, 16, 16);

        assert_ne!(a, b);
        assert_eq!(gl.inner().bound_buffer(BufferTarget::Array), b);
        assert_eq!(gl.inner().viewport_rect(), [0, 0, 16, 16]);
        assert_eq!(gl.call_count("gen_buffer"), 2);
        assert_eq!(gl.call_count("draw_elements"), 0);
        assert_eq!(gl.total_calls(), 4);
    }

    #[test]
    fn default_methods_route_through_wrapper() {
        let gl = TracingGl::new(HeadlessGl::new(32, 32));
        let shader = gl.create_shader();
        assert_eq!(gl.call_count("create_program"), 1);
        let headless = gl.into_inner();
        assert_eq!(headless.live_programs(), 1);
        shader.delete(&headless);
        assert_eq!(headless.live_programs(), 0);
    }
}
