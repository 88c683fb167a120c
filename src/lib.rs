// =============================================================================
// FORK RENDERER - GL-style backend abstraction
// =============================================================================
//
// LAYOUT:
// ┌─────────────────────────────────────────────────────────────────┐
// │  shader   Shader / ShaderBuilder / ShaderUniform                │
// │    └── backend::RenderBackend (one trait, native enum values)   │
// │          ├── HeadlessGl   software state machine, no GPU        │
// │          └── TracingGl    logging + call counting decorator     │
// │  util::math   color / normal byte packing                       │
// │  config, watch   config.toml loading, shader hot reload         │
// └─────────────────────────────────────────────────────────────────┘
//
// All backend calls act on an implicit current context and must be issued
// from one thread at a time.
//
// =============================================================================

pub mod backend;
pub mod config;
pub mod shader;
pub mod util;
pub mod watch;

pub use backend::{HeadlessGl, RenderBackend, TracingGl};
pub use shader::{Shader, ShaderBuilder, ShaderUniform, UniformType, UniformValue};
