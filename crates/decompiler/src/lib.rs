// Best-effort reconstruction of straight-line Java source from decoded
// bytecode. No control flow is modeled; anything outside the supported
// instruction subset fails loudly rather than guessing.

pub mod descriptor;
mod error;
mod interp;
mod render;

pub use error::DecompileError;
pub use interp::decompile_method;
pub use render::generate_java;

pub type Result<T, E = DecompileError> = std::result::Result<T, E>;
