//! Greeting card core: the stage flow, the memory game and the session
//! that hosts both. State lives in WASM memory (thread_local) for the
//! lifetime of the Web Worker.

pub mod flow;
pub mod memory;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod typewriter;
