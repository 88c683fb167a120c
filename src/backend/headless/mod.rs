// Headless backend - software GL state machine
//
// Implements `RenderBackend` without a GPU. It tracks objects, bindings and
// program interfaces the way a core-profile context does, records clears and
// draw calls instead of rasterizing, and keeps a sticky GL error code.
// Useful for tests and for running the engine on machines without a display.

mod glsl;
mod store;

pub use glsl::{Declaration, ShaderInterface};
pub use store::{VertexAttrib, MAX_UNIFORM_LOCATIONS, MAX_VERTEX_ATTRIBS};

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::BTreeSet;

use super::enums::{BufferTarget, ClearFlags, DataType, DrawMode, GlError, ShaderType};
use super::gl::{RenderBackend, INVALID_LOCATION};
use crate::shader::{ShaderUniform, UniformType, UniformValue};
use store::{AttribSlot, GlBuffer, GlProgram, GlShader, ObjectTable, UniformSlot, VertexArray};

/// One recorded `draw_elements` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: DrawMode,
    pub count: i32,
    pub index_type: DataType,
    /// Byte offset into the element buffer.
    pub offset: usize,
    pub program: u32,
    pub vertex_array: u32,
    pub element_buffer: u32,
    /// Enabled attribute arrays at the time of the call.
    pub attribs: Vec<(u32, VertexAttrib)>,
}

/// Everything recorded since the last [`HeadlessGl::take_frame`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub clears: Vec<ClearFlags>,
    pub draws: Vec<DrawCall>,
}

/// Live object counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    pub buffers: usize,
    pub vertex_arrays: usize,
    pub programs: usize,
    pub shaders: usize,
}

/// Software implementation of [`RenderBackend`].
pub struct HeadlessGl {
    state: Mutex<GlState>,
}

struct GlState {
    viewport: [i32; 4],
    current_program: u32,
    bound_vertex_array: u32,
    array_buffer: u32,
    uniform_buffer: u32,

    /// Vertex array 0.
    default_vao: VertexArray,
    buffers: ObjectTable<GlBuffer>,
    vertex_arrays: ObjectTable<VertexArray>,
    // Shaders and programs share one namespace
    next_shader_name: u32,
    shaders: ObjectTable<GlShader>,
    programs: ObjectTable<GlProgram>,

    frame: Frame,
    error: Option<GlError>,
}

impl HeadlessGl {
    /// Create a context whose default framebuffer is `width` x `height`.
    pub fn new(width: u32, height: u32) -> Self {
        log::debug!("Creating headless GL context {}x{}", width, height);
        Self {
            state: Mutex::new(GlState {
                viewport: [0, 0, clamp_size(width), clamp_size(height)],
                current_program: 0,
                bound_vertex_array: 0,
                array_buffer: 0,
                uniform_buffer: 0,
                default_vao: VertexArray::default(),
                buffers: ObjectTable::default(),
                vertex_arrays: ObjectTable::default(),
                next_shader_name: 1,
                shaders: ObjectTable::default(),
                programs: ObjectTable::default(),
                frame: Frame::default(),
                error: None,
            }),
        }
    }

    /// `glGetError`: returns and clears the first error since the last call.
    pub fn take_error(&self) -> Option<GlError> {
        self.state.lock().error.take()
    }

    /// Clears and draws recorded since the previous call.
    pub fn take_frame(&self) -> Frame {
        std::mem::take(&mut self.state.lock().frame)
    }

    /// `[x, y, width, height]`.
    pub fn viewport_rect(&self) -> [i32; 4] {
        self.state.lock().viewport
    }

    pub fn current_program(&self) -> u32 {
        self.state.lock().current_program
    }

    pub fn bound_vertex_array(&self) -> u32 {
        self.state.lock().bound_vertex_array
    }

    /// Buffer bound to `target`. The element binding belongs to the bound vertex array.
    pub fn bound_buffer(&self, target: BufferTarget) -> u32 {
        let mut state = self.state.lock();
        match target {
            BufferTarget::Array => state.array_buffer,
            BufferTarget::Uniform => state.uniform_buffer,
            BufferTarget::ElementArray => state.current_vao_mut().element_buffer,
        }
    }

    /// Target `buffer` was first bound to, or `None` if it was never bound.
    pub fn buffer_target(&self, buffer: u32) -> Option<BufferTarget> {
        self.state.lock().buffers.get(buffer).and_then(|b| b.target)
    }

    /// Attribute state of the bound vertex array.
    pub fn vertex_attrib(&self, index: u32) -> Option<VertexAttrib> {
        let mut state = self.state.lock();
        state.current_vao_mut().attribs.get(index as usize).copied()
    }

    /// Last value uploaded to `location` of `program`, if any.
    pub fn uniform_value(&self, program: u32, location: i32) -> Option<UniformValue> {
        let state = self.state.lock();
        state
            .programs
            .get(program)
            .and_then(|p| p.uniform(location))
            .and_then(|u| u.value)
    }

    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.lock().vertex_arrays.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.lock().programs.len()
    }

    pub fn live_shader_objects(&self) -> usize {
        self.state.lock().shaders.len()
    }

    pub fn object_counts(&self) -> ObjectCounts {
        let state = self.state.lock();
        ObjectCounts {
            buffers: state.buffers.len(),
            vertex_arrays: state.vertex_arrays.len(),
            programs: state.programs.len(),
            shaders: state.shaders.len(),
        }
    }
}

impl GlState {
    /// Keep only the first error until it is read.
    fn set_error(&mut self, error: GlError, call: &str) {
        log::debug!("{} raised {:?}", call, error);
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn current_vao_mut(&mut self) -> &mut VertexArray {
        match self.vertex_arrays.get_mut(self.bound_vertex_array) {
            Some(vao) => vao,
            None => &mut self.default_vao,
        }
    }

    /// Program names that are shader names are INVALID_OPERATION, unknown names INVALID_VALUE.
    fn check_program(&mut self, program: u32, call: &str) -> bool {
        if self.programs.contains(program) {
            return true;
        }
        let error = if self.shaders.contains(program) {
            GlError::InvalidOperation
        } else {
            GlError::InvalidValue
        };
        self.set_error(error, call);
        false
    }

    fn check_shader(&mut self, shader: u32, call: &str) -> bool {
        if self.shaders.contains(shader) {
            return true;
        }
        let error = if self.programs.contains(shader) {
            GlError::InvalidOperation
        } else {
            GlError::InvalidValue
        };
        self.set_error(error, call);
        false
    }

    fn is_attached(&self, shader: u32) -> bool {
        self.programs.iter().any(|(_, p)| p.attached.contains(&shader))
    }

    /// Free a delete-pending shader once nothing references it.
    fn collect_shader(&mut self, shader: u32) {
        let pending = self.shaders.get(shader).is_some_and(|s| s.delete_pending);
        if pending && !self.is_attached(shader) {
            self.shaders.remove(shader);
            log::trace!("Freed shader {}", shader);
        }
    }

    fn free_program(&mut self, program: u32) {
        if let Some(p) = self.programs.remove(program) {
            for shader in p.attached {
                self.collect_shader(shader);
            }
            log::trace!("Freed program {}", program);
        }
    }

    fn link(&mut self, program: u32) {
        let (attached, bindings) = match self.programs.get(program) {
            Some(p) => (p.attached.clone(), p.attrib_bindings.clone()),
            None => return,
        };

        let result = link_interfaces(&self.shaders, &attached, &bindings);
        let p = match self.programs.get_mut(program) {
            Some(p) => p,
            None => return,
        };
        match result {
            Ok((uniforms, attributes)) => {
                log::trace!(
                    "Linked program {}: {} uniforms, {} attributes",
                    program,
                    uniforms.len(),
                    attributes.len()
                );
                p.linked = true;
                p.info_log.clear();
                p.uniforms = uniforms;
                p.attributes = attributes;
            }
            Err(log) => {
                p.linked = false;
                p.info_log = log;
                p.uniforms.clear();
                p.attributes.clear();
            }
        }
    }
}

/// Assign uniform and attribute locations for the attached stages.
fn link_interfaces(
    shaders: &ObjectTable<GlShader>,
    attached: &[u32],
    bindings: &std::collections::BTreeMap<String, u32>,
) -> std::result::Result<(Vec<UniformSlot>, Vec<AttribSlot>), String> {
    let mut has_vertex = false;
    let mut has_fragment = false;
    let mut declared: Vec<&Declaration> = Vec::new();
    let mut inputs: Vec<&Declaration> = Vec::new();

    for &id in attached {
        let shader = shaders
            .get(id)
            .ok_or_else(|| format!("ERROR: shader {} does not exist", id))?;
        let interface = match (&shader.interface, shader.compiled) {
            (Some(interface), true) => interface,
            _ => return Err(format!("ERROR: shader {} is not compiled", id)),
        };
        match shader.ty {
            ShaderType::Vertex => has_vertex = true,
            ShaderType::Fragment => has_fragment = true,
            _ => {}
        }

        for decl in &interface.uniforms {
            let prev = declared.iter().find(|d| d.name == decl.name).copied();
            match prev {
                Some(prev) if prev.ty != decl.ty => {
                    return Err(format!(
                        "ERROR: uniform '{}' declared as both {} and {}",
                        decl.name, prev.ty, decl.ty
                    ));
                }
                Some(prev) if prev.location != decl.location => {
                    return Err(format!(
                        "ERROR: uniform '{}' declared with different locations",
                        decl.name
                    ));
                }
                Some(_) => {}
                None => declared.push(decl),
            }
        }
        inputs.extend(interface.attributes.iter());
    }

    if !has_vertex {
        return Err("ERROR: no compiled vertex shader attached".to_string());
    }
    if !has_fragment {
        return Err("ERROR: no compiled fragment shader attached".to_string());
    }

    // Layout locations are reserved first, the rest fill the lowest free location
    let mut used = explicit_locations(&declared, MAX_UNIFORM_LOCATIONS, "uniform")?;
    let mut uniforms = Vec::with_capacity(declared.len());
    for decl in declared {
        let location = match decl.location {
            Some(location) => location,
            None => lowest_free(&mut used, MAX_UNIFORM_LOCATIONS, "uniform")?,
        };
        let ty = UniformType::from_glsl_name(&decl.ty);
        uniforms.push(UniformSlot {
            name: decl.name.clone(),
            location: location as i32,
            ty,
            value: ty.map(UniformType::zero),
        });
    }

    // Attributes: layout location, then glBindAttribLocation, then the lowest free index
    let mut seen = BTreeSet::new();
    inputs.retain(|&d| seen.insert(d.name.as_str()));
    let mut used = explicit_locations(&inputs, MAX_VERTEX_ATTRIBS as u32, "vertex attribute")?;
    used.extend(
        inputs
            .iter()
            .filter(|d| d.location.is_none())
            .filter_map(|d| bindings.get(&d.name).copied()),
    );
    let mut attributes = Vec::with_capacity(inputs.len());
    for decl in inputs {
        let location = match (decl.location, bindings.get(&decl.name)) {
            (Some(location), _) => location,
            (None, Some(&index)) => index,
            (None, None) => {
                lowest_free(&mut used, MAX_VERTEX_ATTRIBS as u32, "vertex attribute")?
            }
        };
        attributes.push(AttribSlot {
            name: decl.name.clone(),
            location: location as i32,
        });
    }

    Ok((uniforms, attributes))
}

/// Framebuffer sizes past `i32::MAX` clamp like an oversized viewport.
fn clamp_size(size: u32) -> i32 {
    i32::try_from(size).unwrap_or(i32::MAX)
}

/// Locations fixed by `layout(location = N)`. Two names on one location fail the link.
fn explicit_locations(
    decls: &[&Declaration],
    limit: u32,
    kind: &str,
) -> std::result::Result<BTreeSet<u32>, String> {
    let mut used = BTreeSet::new();
    for decl in decls {
        let location = match decl.location {
            Some(location) => location,
            None => continue,
        };
        if location >= limit {
            return Err(format!(
                "ERROR: {} '{}' location {} exceeds the maximum of {}",
                kind,
                decl.name,
                location,
                limit - 1
            ));
        }
        if !used.insert(location) {
            return Err(format!(
                "ERROR: {} '{}' reuses location {}",
                kind, decl.name, location
            ));
        }
    }
    Ok(used)
}

fn lowest_free(
    used: &mut BTreeSet<u32>,
    limit: u32,
    kind: &str,
) -> std::result::Result<u32, String> {
    let free = (0..limit)
        .find(|i| !used.contains(i))
        .ok_or_else(|| format!("ERROR: too many {}s (max {})", kind, limit))?;
    used.insert(free);
    Ok(free)
}

impl RenderBackend for HeadlessGl {
    fn clear(&self, flags: ClearFlags) {
        let mut state = self.state.lock();
        if !flags.is_valid() {
            state.set_error(GlError::InvalidValue, "clear");
            return;
        }
        state.frame.clears.push(flags);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut state = self.state.lock();
        if width < 0 || height < 0 {
            state.set_error(GlError::InvalidValue, "viewport");
            return;
        }
        state.viewport = [x, y, width, height];
    }

    fn create_uniform(&self, location: i32, ty: UniformType) -> Result<ShaderUniform> {
        let state = self.state.lock();
        let program = state.current_program;
        let p = match state.programs.get(program) {
            Some(p) => p,
            None => anyhow::bail!("No program is bound"),
        };
        let slot = match p.uniform(location) {
            Some(slot) => slot,
            None => anyhow::bail!(
                "Location {} is not an active uniform of program {}",
                location,
                program
            ),
        };
        if let Some(declared) = slot.ty {
            if declared != ty {
                anyhow::bail!(
                    "Uniform '{}' is {}, requested {}",
                    slot.name,
                    declared.glsl_name(),
                    ty.glsl_name()
                );
            }
        }
        Ok(ShaderUniform::new(location, ty))
    }

    fn get_uniform_location(&self, program: u32, name: &str) -> i32 {
        let mut state = self.state.lock();
        if !state.check_program(program, "get_uniform_location") {
            return INVALID_LOCATION;
        }
        let location = state.programs.get(program).filter(|p| p.linked).map(|p| {
            p.uniforms
                .iter()
                .find(|u| u.name == name)
                .map_or(INVALID_LOCATION, |u| u.location)
        });
        match location {
            Some(location) => location,
            None => {
                state.set_error(GlError::InvalidOperation, "get_uniform_location");
                INVALID_LOCATION
            }
        }
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.lock();
        if !state.check_program(program, "attach_shader")
            || !state.check_shader(shader, "attach_shader")
        {
            return;
        }
        let already = state
            .programs
            .get(program)
            .is_some_and(|p| p.attached.contains(&shader));
        if already {
            state.set_error(GlError::InvalidOperation, "attach_shader");
            return;
        }
        if let Some(p) = state.programs.get_mut(program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.lock();
        if !state.check_program(program, "detach_shader")
            || !state.check_shader(shader, "detach_shader")
        {
            return;
        }
        let detached = match state.programs.get_mut(program) {
            Some(p) => match p.attached.iter().position(|&s| s == shader) {
                Some(i) => {
                    p.attached.remove(i);
                    true
                }
                None => false,
            },
            None => false,
        };
        if !detached {
            state.set_error(GlError::InvalidOperation, "detach_shader");
            return;
        }
        state.collect_shader(shader);
    }

    fn use_program(&self, program: u32) {
        let mut state = self.state.lock();
        if program != 0 {
            if !state.check_program(program, "use_program") {
                return;
            }
            if !state.programs.get(program).is_some_and(|p| p.linked) {
                state.set_error(GlError::InvalidOperation, "use_program");
                return;
            }
        }

        let previous = std::mem::replace(&mut state.current_program, program);
        if previous != program && state.programs.get(previous).is_some_and(|p| p.delete_pending) {
            state.free_program(previous);
        }
    }

    fn create_program(&self) -> u32 {
        let mut state = self.state.lock();
        let id = state.next_shader_name;
        state.next_shader_name += 1;
        state.programs.insert_at(id, GlProgram::default());
        id
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.lock();
        if program == 0 || !state.check_program(program, "delete_program") {
            return;
        }
        if state.current_program == program {
            if let Some(p) = state.programs.get_mut(program) {
                p.delete_pending = true;
            }
            return;
        }
        state.free_program(program);
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.lock();
        if !state.check_program(program, "link_program") {
            return;
        }
        state.link(program);
    }

    fn program_linked(&self, program: u32) -> bool {
        let mut state = self.state.lock();
        if !state.check_program(program, "program_linked") {
            return false;
        }
        state.programs.get(program).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        let mut state = self.state.lock();
        if !state.check_program(program, "program_info_log") {
            return String::new();
        }
        state
            .programs
            .get(program)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn create_shader_object(&self, ty: ShaderType) -> u32 {
        let mut state = self.state.lock();
        let id = state.next_shader_name;
        state.next_shader_name += 1;
        state.shaders.insert_at(id, GlShader::new(ty));
        id
    }

    fn delete_shader_object(&self, shader: u32) {
        let mut state = self.state.lock();
        if shader == 0 || !state.check_shader(shader, "delete_shader_object") {
            return;
        }
        if let Some(s) = state.shaders.get_mut(shader) {
            s.delete_pending = true;
        }
        state.collect_shader(shader);
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.lock();
        if !state.check_shader(shader, "shader_source") {
            return;
        }
        if let Some(s) = state.shaders.get_mut(shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut state = self.state.lock();
        if !state.check_shader(shader, "compile_shader") {
            return;
        }
        if let Some(s) = state.shaders.get_mut(shader) {
            match glsl::scan(&s.source, s.ty) {
                Ok(interface) => {
                    s.compiled = true;
                    s.info_log.clear();
                    s.interface = Some(interface);
                }
                Err(log) => {
                    s.compiled = false;
                    s.info_log = log;
                    s.interface = None;
                }
            }
        }
    }

    fn shader_compiled(&self, shader: u32) -> bool {
        let mut state = self.state.lock();
        if !state.check_shader(shader, "shader_compiled") {
            return false;
        }
        state.shaders.get(shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        let mut state = self.state.lock();
        if !state.check_shader(shader, "shader_info_log") {
            return String::new();
        }
        state
            .shaders
            .get(shader)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn uniform(&self, location: i32, value: &UniformValue) {
        if location == INVALID_LOCATION {
            return;
        }
        let mut state = self.state.lock();
        let program = state.current_program;
        let stored = match state.programs.get_mut(program).and_then(|p| p.uniform_mut(location)) {
            Some(slot) if slot.ty == Some(value.ty()) => {
                slot.value = Some(*value);
                true
            }
            _ => false,
        };
        if !stored {
            state.set_error(GlError::InvalidOperation, "uniform");
        }
    }

    fn gen_vertex_array(&self) -> u32 {
        self.state.lock().vertex_arrays.insert(VertexArray::default())
    }

    fn bind_vertex_array(&self, array: u32) {
        let mut state = self.state.lock();
        if array != 0 && !state.vertex_arrays.contains(array) {
            state.set_error(GlError::InvalidOperation, "bind_vertex_array");
            return;
        }
        state.bound_vertex_array = array;
    }

    fn delete_vertex_array(&self, array: u32) {
        let mut state = self.state.lock();
        // Unused names are silently ignored
        if state.vertex_arrays.remove(array).is_some() && state.bound_vertex_array == array {
            state.bound_vertex_array = 0;
        }
    }

    fn gen_buffer(&self) -> u32 {
        self.state.lock().buffers.insert(GlBuffer::default())
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: u32) {
        let mut state = self.state.lock();
        if buffer != 0 {
            match state.buffers.get_mut(buffer) {
                Some(b) => {
                    b.target.get_or_insert(target);
                }
                None => {
                    state.set_error(GlError::InvalidOperation, "bind_buffer");
                    return;
                }
            }
        }
        match target {
            BufferTarget::Array => state.array_buffer = buffer,
            BufferTarget::Uniform => state.uniform_buffer = buffer,
            BufferTarget::ElementArray => state.current_vao_mut().element_buffer = buffer,
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.lock();
        if state.buffers.remove(buffer).is_none() {
            return;
        }
        // Bindings in the current context revert to 0
        if state.array_buffer == buffer {
            state.array_buffer = 0;
        }
        if state.uniform_buffer == buffer {
            state.uniform_buffer = 0;
        }
        let vao = state.current_vao_mut();
        if vao.element_buffer == buffer {
            vao.element_buffer = 0;
        }
        for attrib in vao.attribs.iter_mut().filter(|a| a.buffer == buffer) {
            attrib.buffer = 0;
        }
    }

    fn get_attrib_location(&self, program: u32, name: &str) -> i32 {
        let mut state = self.state.lock();
        if !state.check_program(program, "get_attrib_location") {
            return INVALID_LOCATION;
        }
        let location = state.programs.get(program).filter(|p| p.linked).map(|p| {
            p.attributes
                .iter()
                .find(|a| a.name == name)
                .map_or(INVALID_LOCATION, |a| a.location)
        });
        match location {
            Some(location) => location,
            None => {
                state.set_error(GlError::InvalidOperation, "get_attrib_location");
                INVALID_LOCATION
            }
        }
    }

    fn bind_attrib_location(&self, program: u32, index: u32, name: &str) {
        let mut state = self.state.lock();
        if !state.check_program(program, "bind_attrib_location") {
            return;
        }
        if index as usize >= MAX_VERTEX_ATTRIBS {
            state.set_error(GlError::InvalidValue, "bind_attrib_location");
            return;
        }
        if name.starts_with("gl_") {
            state.set_error(GlError::InvalidOperation, "bind_attrib_location");
            return;
        }
        if let Some(p) = state.programs.get_mut(program) {
            p.attrib_bindings.insert(name.to_string(), index);
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.lock();
        match state.current_vao_mut().attribs.get_mut(index as usize) {
            Some(attrib) => attrib.enabled = true,
            None => state.set_error(GlError::InvalidValue, "enable_vertex_attrib_array"),
        }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.lock();
        match state.current_vao_mut().attribs.get_mut(index as usize) {
            Some(attrib) => attrib.enabled = false,
            None => state.set_error(GlError::InvalidValue, "disable_vertex_attrib_array"),
        }
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
        let mut state = self.state.lock();
        if index as usize >= MAX_VERTEX_ATTRIBS || !(1..=4).contains(&size) || stride < 0 {
            state.set_error(GlError::InvalidValue, "vertex_attrib_pointer");
            return;
        }
        let buffer = state.array_buffer;
        if buffer == 0 && pointer != 0 {
            state.set_error(GlError::InvalidOperation, "vertex_attrib_pointer");
            return;
        }
        let attrib = &mut state.current_vao_mut().attribs[index as usize];
        attrib.size = size;
        attrib.ty = ty;
        attrib.normalized = normalized;
        attrib.stride = stride;
        attrib.offset = pointer;
        attrib.buffer = buffer;
    }

    fn draw_elements(&self, mode: DrawMode, count: i32, ty: DataType, indices: usize) {
        let mut state = self.state.lock();
        if count < 0 {
            state.set_error(GlError::InvalidValue, "draw_elements");
            return;
        }
        if !ty.is_index_type() {
            state.set_error(GlError::InvalidEnum, "draw_elements");
            return;
        }
        let program = state.current_program;
        let vertex_array = state.bound_vertex_array;
        let vao = state.current_vao_mut();
        let element_buffer = vao.element_buffer;
        let attribs: Vec<(u32, VertexAttrib)> = vao
            .attribs
            .iter()
            .enumerate()
            .filter(|(_, a)| a.enabled)
            .map(|(i, a)| (i as u32, *a))
            .collect();
        if program == 0 || element_buffer == 0 {
            state.set_error(GlError::InvalidOperation, "draw_elements");
            return;
        }
        if count == 0 {
            return;
        }
        match state.buffers.get(element_buffer).and_then(|b| b.target) {
            Some(BufferTarget::ElementArray) => {}
            first => log::debug!(
                "draw_elements: index buffer {} was first bound as {:?}",
                element_buffer,
                first
            ),
        }
        state.frame.draws.push(DrawCall {
            mode,
            count,
            index_type: ty,
            offset: indices,
            program,
            vertex_array,
            element_buffer,
            attribs,
        });
    }
}
