//! `Closure` wraps a compiled `Function` with the upvalues it captured at
//! the point `OP_CLOSURE` ran. Grounded in the teacher's
//! `common::closure::Closure { lambda, captureds }` shape, generalized to
//! hold live `Upvalue` handles instead of raw captured data.

use std::rc::Rc;

use crate::{common::function::Function, vm::upvalue::Upvalue};

#[derive(Debug)]
pub struct Closure {
    pub function: Rc<Function>,
    pub upvalues: Vec<Rc<Upvalue>>,
}

impl Closure {
    pub fn new(function: Rc<Function>, upvalues: Vec<Rc<Upvalue>>) -> Closure {
        Closure { function, upvalues }
    }
}
