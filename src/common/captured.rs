//! Describes, at compile time, where a function's Nth upvalue comes from:
//! a local slot of the immediately-enclosing function, or an upvalue the
//! enclosing function itself already captures. Grounded in the teacher's
//! `common::captured::Captured { index, is_local }`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Captured {
    pub index: u8,
    pub is_local: bool,
}

impl Captured {
    pub fn local(index: u8) -> Captured {
        Captured { index, is_local: true }
    }

    pub fn upvalue(index: u8) -> Captured {
        Captured { index, is_local: false }
    }
}
