// End-to-end: build the bundled cube program and draw it on the headless backend.

use fork_renderer::backend::{
    BufferTarget, ClearFlags, DataType, DrawMode, GlError, ShaderType, INVALID_LOCATION,
};
use fork_renderer::util::{color_float_to_byte, normal_float_to_byte, pack_normal};
use fork_renderer::{HeadlessGl, RenderBackend, Shader, TracingGl, UniformType, UniformValue};
use glam::{Mat4, Vec3, Vec4};
use std::path::PathBuf;

fn shader_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders").join(name)
}

fn cube_shader(gl: &dyn RenderBackend) -> Shader {
    let stages = [
        gl.create_shader_builder(ShaderType::Vertex)
            .load_file(shader_path("cube.vert"))
            .unwrap(),
        gl.create_shader_builder(ShaderType::Fragment)
            .load_file(shader_path("cube.frag"))
            .unwrap(),
    ];
    Shader::build_with_bindings(gl, stages, &[(0, "a_position"), (1, "a_normal"), (2, "a_color")])
        .unwrap()
}

#[test]
fn bundled_shaders_link_with_expected_interface() {
    let gl = HeadlessGl::new(320, 240);
    let shader = cube_shader(&gl);

    assert_eq!(shader.attrib_location(&gl, "a_position"), 0);
    assert_eq!(shader.attrib_location(&gl, "a_normal"), 1);
    assert_eq!(shader.attrib_location(&gl, "a_color"), 2);
    for name in ["u_mvp", "u_tint", "u_time"] {
        assert_ne!(shader.uniform_location(&gl, name), INVALID_LOCATION, "{}", name);
    }
    assert_eq!(shader.uniform_location(&gl, "v_color"), INVALID_LOCATION);
    assert_eq!(gl.take_error(), None);
}

#[test]
fn full_frame_through_tracing_backend() {
    let gl = TracingGl::new(HeadlessGl::new(320, 240));
    let mut shader = cube_shader(&gl);
    assert!(shader.register_uniform(&gl, "u_mvp", UniformType::Mat4).unwrap());

    let vao = gl.gen_vertex_array();
    let vbo = gl.gen_buffer();
    let ebo = gl.gen_buffer();
    gl.bind_vertex_array(vao);
    gl.bind_buffer(BufferTarget::Array, vbo);
    gl.bind_buffer(BufferTarget::ElementArray, ebo);
    gl.enable_vertex_attrib_array(0);
    gl.vertex_attrib_pointer(0, 3, DataType::Float, false, 20, 0);
    gl.enable_vertex_attrib_array(1);
    gl.vertex_attrib_pointer(1, 3, DataType::Byte, true, 20, 12);
    gl.disable_vertex_attrib_array(1);

    gl.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
    let mvp = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
    shader.uniform_mut("u_mvp").unwrap().set_mat4(mvp).unwrap();
    shader.bind(&gl);
    shader.upload_uniforms(&gl);
    gl.draw_elements(DrawMode::Triangles, 36, DataType::UnsignedShort, 0);

    let headless = gl.inner();
    assert_eq!(headless.take_error(), None);
    let frame = headless.take_frame();
    assert_eq!(frame.clears, vec![ClearFlags::COLOR | ClearFlags::DEPTH]);
    assert_eq!(frame.draws.len(), 1);
    let draw = &frame.draws[0];
    assert_eq!(draw.program, shader.id());
    assert_eq!(draw.attribs.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0]);

    let location = shader.uniform("u_mvp").unwrap().location();
    assert_eq!(headless.uniform_value(shader.id(), location), Some(UniformValue::Mat4(mvp)));
    assert_eq!(gl.call_count("draw_elements"), 1);
    assert_eq!(gl.call_count("uniform"), 1);

    gl.use_program(0);
    shader.delete(&gl);
    gl.delete_vertex_array(vao);
    gl.delete_buffer(vbo);
    gl.delete_buffer(ebo);
    assert_eq!(headless.object_counts(), Default::default());
}

#[test]
fn misuse_surfaces_as_gl_errors_not_panics() {
    let gl = HeadlessGl::new(16, 16);
    gl.use_program(12345);
    assert_eq!(gl.take_error(), Some(GlError::InvalidValue));
    assert_eq!(gl.get_attrib_location(12345, "a_position"), INVALID_LOCATION);
    assert_eq!(gl.take_error(), Some(GlError::InvalidValue));
    gl.draw_elements(DrawMode::Points, 1, DataType::UnsignedInt, 0);
    assert_eq!(gl.take_error(), Some(GlError::InvalidOperation));
}

#[test]
fn tint_uniform_round_trips_with_packed_colors() {
    let gl = HeadlessGl::new(16, 16);
    let mut shader = cube_shader(&gl);
    shader.register_uniform(&gl, "u_tint", UniformType::Vec4).unwrap();

    // Tint quantized the way vertex colors are stored
    let quantized = Vec4::new(1.0, 0.5, 0.25, 1.0)
        .to_array()
        .map(|c| color_float_to_byte(c) as u8 as f32 / 255.0);
    let tint = Vec4::from_array(quantized);
    shader.uniform_mut("u_tint").unwrap().set_vec4(tint).unwrap();
    shader.upload_uniforms(&gl);

    let location = shader.uniform("u_tint").unwrap().location();
    assert_eq!(gl.uniform_value(shader.id(), location), Some(UniformValue::Vec4(tint)));
    assert_eq!(color_float_to_byte(0.25) as u8, 64);
}

#[test]
fn normal_packing_matches_scalar_helper() {
    let n = Vec3::new(0.267, -0.535, 0.802);
    assert_eq!(
        pack_normal(n),
        [normal_float_to_byte(0.267), normal_float_to_byte(-0.535), normal_float_to_byte(0.802)]
    );
}
