// =============================================================================
// FORK RENDERER - Headless demo driver
// =============================================================================
//
// Drives the GL-style backend through a complete frame sequence without a
// window: shader build, vertex array setup, per-frame clears, uniform
// updates and indexed draws.
//
// FRAME FLOW:
// ┌─────────────────────────────────────────────────────────────────┐
// │  poll shader watcher ── rebuild program on change               │
// │  clear ── use program ── upload dirty uniforms                  │
// │  bind vertex array ── draw_elements                             │
// │  collect recorded frame + sticky GL error from the backend      │
// └─────────────────────────────────────────────────────────────────┘
//
// =============================================================================

use anyhow::Result;
use fork_renderer::backend::{BufferTarget, DataType, DrawMode, ShaderType};
use fork_renderer::config::Config;
use fork_renderer::watch::ShaderWatcher;
use fork_renderer::{HeadlessGl, RenderBackend, Shader, TracingGl, UniformType};
use glam::{Mat4, Vec3, Vec4};
use std::time::Duration;

/// Fixed animation step between frames
const FRAME_TIME: f32 = 1.0 / 60.0;

/// Cube: 6 faces x 2 triangles x 3 indices
const CUBE_INDEX_COUNT: i32 = 36;

// Vertex layout: position f32x3 | normal i8x3 + pad | color u8x4
const VERTEX_STRIDE: i32 = 20;
const NORMAL_OFFSET: usize = 12;
const COLOR_OFFSET: usize = 16;

const ATTRIB_POSITION: u32 = 0;
const ATTRIB_NORMAL: u32 = 1;
const ATTRIB_COLOR: u32 = 2;

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    // Load configuration from config.toml
    let config = Config::load();

    // Initialize logging
    init_logging(&config)?;
    log::info!("Starting headless renderer");
    log::info!(
        "Viewport: {}x{}, {} frames",
        config.viewport.width,
        config.viewport.height,
        config.graphics.frames
    );
    let [r, g, b, a] = config.clear_color_bytes();
    log::info!("Clear color: #{:02x}{:02x}{:02x}{:02x}", r, g, b, a);

    // Reject sizes glViewport cannot take before any backend call
    config.viewport_size()?;
    let headless = HeadlessGl::new(config.viewport.width, config.viewport.height);

    if config.debug.trace_calls {
        let gl = TracingGl::new(headless);
        run(&gl, gl.inner(), &config)?;
        gl.log_summary();
    } else {
        run(&headless, &headless, &config)?;
    }

    Ok(())
}

/// Initialize logging with optional file output
fn init_logging(config: &Config) -> Result<()> {
    use env_logger::{Builder, Env, Target};

    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    // Records go to the log file instead of stderr when enabled
    if let Some(file) = config.open_log_file()? {
        eprintln!("Logging to {}", config.debug.log_file);
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Render the configured number of frames, then release everything.
///
/// `gl` issues the calls; `headless` is the same backend seen without any
/// decorator, used to read back recorded frames and errors.
fn run(gl: &dyn RenderBackend, headless: &HeadlessGl, config: &Config) -> Result<()> {
    let mut app = App::new(config)?;
    app.init(gl)?;

    for frame in 0..config.graphics.frames {
        app.poll_hot_reload(gl);
        app.render_frame(gl, frame as f32 * FRAME_TIME)?;

        let recorded = headless.take_frame();
        log::debug!(
            "Frame {}: {} clears, {} draws",
            frame,
            recorded.clears.len(),
            recorded.draws.len()
        );
        for draw in &recorded.draws {
            for (index, attrib) in &draw.attribs {
                log::trace!(
                    "  attrib {}: {}x{:?} stride {} offset {}",
                    index,
                    attrib.size,
                    attrib.ty,
                    attrib.effective_stride(),
                    attrib.offset
                );
            }
        }
        if let Some(error) = headless.take_error() {
            log::warn!("GL error during frame {}: {:?} ({:#06x})", frame, error, error.to_raw());
        }

        if app.watcher.is_some() {
            std::thread::sleep(Duration::from_secs_f32(FRAME_TIME));
        }
    }

    app.destroy(gl);

    let counts = headless.object_counts();
    if counts == Default::default() {
        log::info!("All backend objects released");
    } else {
        log::warn!("Leaked backend objects: {:?}", counts);
    }
    Ok(())
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Everything the demo allocates on the backend.
///
/// Handles are plain names: `destroy` must run before the backend is dropped.
struct App<'a> {
    config: &'a Config,
    shader: Option<Shader>,
    vertex_array: u32,
    vertex_buffer: u32,
    index_buffer: u32,
    watcher: Option<ShaderWatcher>,
}

impl<'a> App<'a> {
    fn new(config: &'a Config) -> Result<Self> {
        let watcher = if config.shaders.hot_reload {
            Some(ShaderWatcher::new(&config.shaders.directory)?)
        } else {
            None
        };

        Ok(Self {
            config,
            shader: None,
            vertex_array: 0,
            vertex_buffer: 0,
            index_buffer: 0,
            watcher,
        })
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    fn init(&mut self, gl: &dyn RenderBackend) -> Result<()> {
        log::info!("Initializing backend resources...");

        let (width, height) = self.config.viewport_size()?;
        gl.viewport(0, 0, width, height);

        self.shader = Some(self.build_shader(gl)?);

        // ─────────────────────────────────────────────────────────────────────
        // Vertex array: attribute layout + element buffer binding
        // ─────────────────────────────────────────────────────────────────────
        self.vertex_array = gl.gen_vertex_array();
        self.vertex_buffer = gl.gen_buffer();
        self.index_buffer = gl.gen_buffer();

        gl.bind_vertex_array(self.vertex_array);
        gl.bind_buffer(BufferTarget::Array, self.vertex_buffer);
        gl.bind_buffer(BufferTarget::ElementArray, self.index_buffer);

        gl.enable_vertex_attrib_array(ATTRIB_POSITION);
        gl.vertex_attrib_pointer(ATTRIB_POSITION, 3, DataType::Float, false, VERTEX_STRIDE, 0);
        // Normals and colors are byte-packed (see util::math)
        gl.enable_vertex_attrib_array(ATTRIB_NORMAL);
        gl.vertex_attrib_pointer(ATTRIB_NORMAL, 3, DataType::Byte, true, VERTEX_STRIDE, NORMAL_OFFSET);
        gl.enable_vertex_attrib_array(ATTRIB_COLOR);
        gl.vertex_attrib_pointer(
            ATTRIB_COLOR,
            4,
            DataType::UnsignedByte,
            true,
            VERTEX_STRIDE,
            COLOR_OFFSET,
        );

        gl.bind_vertex_array(0);
        gl.bind_buffer(BufferTarget::Array, 0);

        log::info!("Backend resources initialized");
        Ok(())
    }

    fn build_shader(&self, gl: &dyn RenderBackend) -> Result<Shader> {
        let stages = [
            gl.create_shader_builder(ShaderType::Vertex)
                .load_file(self.config.vertex_shader_path())?,
            gl.create_shader_builder(ShaderType::Fragment)
                .load_file(self.config.fragment_shader_path())?,
        ];
        let bindings = [
            (ATTRIB_POSITION, "a_position"),
            (ATTRIB_NORMAL, "a_normal"),
            (ATTRIB_COLOR, "a_color"),
        ];
        let mut shader = Shader::build_with_bindings(gl, stages, &bindings)?;

        for (name, ty) in [
            ("u_mvp", UniformType::Mat4),
            ("u_tint", UniformType::Vec4),
            ("u_time", UniformType::Float),
        ] {
            shader.register_uniform(gl, name, ty)?;
        }
        if let Some(tint) = shader.uniform_mut("u_tint") {
            tint.set_vec4(Vec4::ONE)?;
        }

        log::info!("Built shader program {}", shader.id());
        Ok(shader)
    }

    /// Rebuild the program if a watched shader changed. A broken edit keeps
    /// the previous program.
    fn poll_hot_reload(&mut self, gl: &dyn RenderBackend) {
        let changed = match &self.watcher {
            Some(watcher) => watcher.poll(),
            None => return,
        };
        if changed.is_empty() {
            return;
        }

        log::info!("Shader sources changed: {:?}", changed);
        match self.build_shader(gl) {
            Ok(shader) => {
                if let Some(old) = self.shader.replace(shader) {
                    old.delete(gl);
                }
            }
            Err(e) => log::error!("Shader reload failed, keeping previous program: {:?}", e),
        }
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    fn render_frame(&mut self, gl: &dyn RenderBackend, time: f32) -> Result<()> {
        let shader = match self.shader.as_mut() {
            Some(shader) => shader,
            None => anyhow::bail!("Shader not initialized"),
        };

        gl.clear(self.config.clear_flags());

        let aspect = self.config.viewport.width as f32 / self.config.viewport.height.max(1) as f32;
        let projection = Mat4::perspective_rh_gl(60f32.to_radians(), aspect, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.5, 4.0), Vec3::ZERO, Vec3::Y);
        let model = Mat4::from_rotation_y(time) * Mat4::from_rotation_x(time * 0.5);

        if let Some(mvp) = shader.uniform_mut("u_mvp") {
            mvp.set_mat4(projection * view * model)?;
        }
        if let Some(t) = shader.uniform_mut("u_time") {
            t.set_float(time)?;
        }

        shader.bind(gl);
        shader.upload_uniforms(gl);

        gl.bind_vertex_array(self.vertex_array);
        gl.draw_elements(DrawMode::Triangles, CUBE_INDEX_COUNT, DataType::UnsignedShort, 0);
        gl.bind_vertex_array(0);

        Ok(())
    }

    // =========================================================================
    // CLEANUP
    // =========================================================================

    fn destroy(&mut self, gl: &dyn RenderBackend) {
        log::info!("Cleaning up backend resources...");

        gl.use_program(0);
        if let Some(shader) = self.shader.take() {
            shader.delete(gl);
        }
        gl.delete_vertex_array(self.vertex_array);
        gl.delete_buffer(self.vertex_buffer);
        gl.delete_buffer(self.index_buffer);
        self.vertex_array = 0;
        self.vertex_buffer = 0;
        self.index_buffer = 0;

        log::info!("Cleanup complete");
    }
}
