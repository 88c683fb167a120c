// Object storage for the headless backend
//
// Names start at 1 and only ever grow, so a name is never handed out twice.
// Name 0 is the "no object" name and is never occupied. Only live objects
// are stored; deleted names leave nothing behind.

use std::collections::BTreeMap;

use super::glsl::ShaderInterface;
use crate::backend::{DataType, ShaderType};
use crate::shader::{UniformType, UniformValue};

/// Vertex attribute slots per vertex array.
pub const MAX_VERTEX_ATTRIBS: usize = 16;

/// Highest explicit uniform location plus one.
pub const MAX_UNIFORM_LOCATIONS: u32 = 1024;

/// Live objects of one object class, keyed by name.
#[derive(Debug)]
pub struct ObjectTable<T> {
    live: BTreeMap<u32, T>,
    next_id: u32,
}

impl<T> Default for ObjectTable<T> {
    fn default() -> Self {
        Self {
            live: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> ObjectTable<T> {
    /// Store `value` under a fresh name.
    pub fn insert(&mut self, value: T) -> u32 {
        let id = self.next_id;
        self.insert_at(id, value);
        id
    }

    /// Store `value` under a name allocated elsewhere (shared namespaces).
    pub fn insert_at(&mut self, id: u32, value: T) {
        debug_assert!(id != 0);
        self.live.insert(id, value);
        self.next_id = self.next_id.max(id + 1);
    }

    pub fn remove(&mut self, id: u32) -> Option<T> {
        self.live.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.live.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.live.get_mut(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.live.contains_key(&id)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.live.iter().map(|(&id, v)| (id, v))
    }
}

/// Per-attribute state set by `glVertexAttribPointer` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttrib {
    pub enabled: bool,
    /// Components per vertex (1 to 4).
    pub size: i32,
    pub ty: DataType,
    pub normalized: bool,
    pub stride: i32,
    /// Byte offset into `buffer`.
    pub offset: usize,
    /// Array buffer bound when the pointer was specified.
    pub buffer: u32,
}

impl Default for VertexAttrib {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 4,
            ty: DataType::Float,
            normalized: false,
            stride: 0,
            offset: 0,
            buffer: 0,
        }
    }
}

impl VertexAttrib {
    /// Byte distance between consecutive vertices, resolving `stride == 0`.
    pub fn effective_stride(&self) -> usize {
        if self.stride == 0 {
            self.size as usize * self.ty.size_bytes()
        } else {
            self.stride as usize
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VertexArray {
    pub attribs: [VertexAttrib; MAX_VERTEX_ATTRIBS],
    pub element_buffer: u32,
}

#[derive(Debug, Clone, Default)]
pub struct GlBuffer {
    /// Target of the first bind, which fixes the buffer's kind.
    pub target: Option<crate::backend::BufferTarget>,
}

#[derive(Debug)]
pub struct GlShader {
    pub ty: ShaderType,
    pub source: String,
    pub compiled: bool,
    pub info_log: String,
    pub interface: Option<ShaderInterface>,
    /// `glDeleteShader` was called while attached; freed on last detach.
    pub delete_pending: bool,
}

impl GlShader {
    pub fn new(ty: ShaderType) -> Self {
        Self {
            ty,
            source: String::new(),
            compiled: false,
            info_log: String::new(),
            interface: None,
            delete_pending: false,
        }
    }
}

/// An active uniform of a linked program.
#[derive(Debug, Clone)]
pub struct UniformSlot {
    pub name: String,
    pub location: i32,
    /// `None` for GLSL types the crate cannot upload (e.g. `mat3`).
    pub ty: Option<UniformType>,
    pub value: Option<UniformValue>,
}

#[derive(Debug, Clone)]
pub struct AttribSlot {
    pub name: String,
    pub location: i32,
}

#[derive(Debug, Default)]
pub struct GlProgram {
    pub attached: Vec<u32>,
    pub linked: bool,
    pub info_log: String,
    pub uniforms: Vec<UniformSlot>,
    pub attributes: Vec<AttribSlot>,
    /// `glBindAttribLocation` requests, applied at the next link.
    pub attrib_bindings: BTreeMap<String, u32>,
    /// `glDeleteProgram` was called while current; freed when unbound.
    pub delete_pending: bool,
}

impl GlProgram {
    pub fn uniform(&self, location: i32) -> Option<&UniformSlot> {
        self.uniforms.iter().find(|u| u.location == location)
    }

    pub fn uniform_mut(&mut self, location: i32) -> Option<&mut UniformSlot> {
        self.uniforms.iter_mut().find(|u| u.location == location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_never_reused() {
        let mut table = ObjectTable::default();
        let a = table.insert("a");
        let b = table.insert("b");
        assert_eq!((a, b), (1, 2));
        table.remove(a);
        let c = table.insert("c");
        assert_eq!(c, 3);
        assert_eq!(table.len(), 2);
        assert!(!table.contains(a));
    }

    #[test]
    fn deleted_names_leave_nothing_behind() {
        let mut table = ObjectTable::default();
        let kept = table.insert(VertexArray::default());
        for _ in 0..10_000 {
            let id = table.insert(VertexArray::default());
            assert!(table.remove(id).is_some());
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![kept]);
        assert_eq!(table.live.len(), 1);
        assert_eq!(table.insert(VertexArray::default()), 10_002);
    }

    #[test]
    fn zero_is_never_an_object() {
        let mut table: ObjectTable<u8> = ObjectTable::default();
        table.insert(1);
        assert!(table.get(0).is_none());
        assert!(table.remove(0).is_none());
    }

    #[test]
    fn insert_at_advances_the_counter() {
        let mut table = ObjectTable::default();
        table.insert_at(5, ());
        assert_eq!(table.insert(()), 6);
        assert_eq!(table.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![5, 6]);
    }

    #[test]
    fn effective_stride_resolves_packed_layout() {
        let attrib = VertexAttrib {
            size: 3,
            ty: DataType::Float,
            ..Default::default()
        };
        assert_eq!(attrib.effective_stride(), 12);
        let attrib = VertexAttrib { stride: 32, ..attrib };
        assert_eq!(attrib.effective_stride(), 32);
    }
}
