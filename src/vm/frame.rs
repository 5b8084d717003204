use std::rc::Rc;

use super::code::Instructions;
use super::value::CompiledFunction;

/// An activation record: the function being executed and where in it we are.
/// Only the main frame is ever pushed.
#[derive(Debug, Clone)]
pub struct Frame {
    function: Rc<CompiledFunction>,
    pub(super) ip: usize,
}

impl Frame {
    pub(super) fn new(function: Rc<CompiledFunction>) -> Self {
        Frame { function, ip: 0 }
    }

    pub(super) fn instructions(&self) -> &Instructions {
        &self.function.instructions
    }
}
