//! Call frame
//!
//! One activation record per in-flight function call. The frame pins the
//! module instance that is executing, which decides how memory indices resolve.

use super::{ModuleInstance, Value};
use std::rc::Rc;

/// Call frame for managing function calls
#[derive(Debug, Clone)]
pub struct CallFrame {
    /// Module instance executing in this frame
    pub module: Rc<ModuleInstance>,
    /// Function index in the module
    pub function_idx: u32,
    /// Local variables (parameters + declared locals)
    pub locals: Vec<Value>,
    /// Operand stack height when the frame was entered; set by `Stack::push_frame`
    pub value_base: usize,
}

impl CallFrame {
    pub fn new(module: Rc<ModuleInstance>, function_idx: u32, locals: Vec<Value>) -> Self {
        CallFrame {
            module,
            function_idx,
            locals,
            value_base: 0,
        }
    }
}
