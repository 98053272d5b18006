//! Decoder and interpreter configuration
//!
//! A [`Config`] is handed to [`crate::parser::Decoder::new`] and
//! [`crate::runtime::Interpreter::new`]; there is no process-wide state.

/// Default bound on nested guest function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Default bound on nested `block`/`loop`/`if` in one expression.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

/// Default native stack budget for one host call into the guest. Leaves
/// headroom on a 2 MiB thread stack.
pub const DEFAULT_MAX_STACK_BYTES: usize = 1024 * 1024;

/// Settings shared by the decoder and the interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Emit `log` records for decoded sections, instantiation phases and
    /// executed instructions
    pub debug: bool,
    /// Maximum depth of nested guest calls before trapping with
    /// [`crate::runtime::RuntimeError::CallStackOverflow`]
    pub max_call_depth: usize,
    /// Deepest structured-instruction nesting the decoder accepts
    pub max_nesting_depth: usize,
    /// Native stack the interpreter may use below the outermost guest call
    /// before trapping with
    /// [`crate::runtime::RuntimeError::CallStackOverflow`]. Calls and nested
    /// blocks both count against it.
    pub max_stack_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_stack_bytes: DEFAULT_MAX_STACK_BYTES,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_max_stack_bytes(mut self, bytes: usize) -> Self {
        self.max_stack_bytes = bytes;
        self
    }
}
