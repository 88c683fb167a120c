// Backend module - GL-style rendering abstraction
//
// Design: one trait mirroring the native entry points, one implementation
// per native backend. Enum values are the native ones, passed through as-is.

pub mod enums;
pub mod gl;
pub mod headless;
pub mod trace;

pub use enums::{BufferTarget, ClearFlags, DataType, DrawMode, GlError, ShaderType};
pub use gl::{RenderBackend, INVALID_LOCATION, NO_OBJECT};
pub use headless::HeadlessGl;
pub use trace::TracingGl;
