//! A `Chunk` is a flat, linear unit of bytecode: the code stream itself, a
//! constant pool, and a source-line table parallel to the code stream.

use crate::common::{opcode::Opcode, value::Value};

#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub lines: Vec<usize>,
    pub constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Chunk { Chunk::default() }

    pub fn emit(&mut self, op: Opcode, line: usize) -> usize {
        self.emit_byte(op as u8, line)
    }

    pub fn emit_byte(&mut self, byte: u8, line: usize) -> usize {
        self.code.push(byte);
        self.lines.push(line);
        self.code.len() - 1
    }

    pub fn emit_short(&mut self, value: u16, line: usize) {
        self.emit_byte((value >> 8) as u8, line);
        self.emit_byte((value & 0xFF) as u8, line);
    }

    /// Patches a previously-emitted 2-byte placeholder (at `offset`) with the
    /// distance from just past the placeholder to the current end of code.
    pub fn patch_jump(&mut self, offset: usize) -> Result<(), String> {
        let jump = self.code.len() - offset - 2;
        if jump > u16::MAX as usize {
            return Err("jump too far to encode (over 65535 bytes)".to_string());
        }
        self.code[offset] = ((jump >> 8) & 0xFF) as u8;
        self.code[offset + 1] = (jump & 0xFF) as u8;
        Ok(())
    }

    /// Adds `value` to the constant pool, returning its index. String
    /// constants are deduplicated so repeated global names share one slot.
    pub fn add_constant(&mut self, value: Value) -> Result<u16, String> {
        if let Value::Str(s) = &value {
            if let Some(index) = self.constants.iter().position(|c| {
                matches!(c, Value::Str(existing) if existing == s)
            }) {
                return Ok(index as u16);
            }
        }

        if self.constants.len() >= u16::MAX as usize {
            return Err("too many constants in one chunk (over 65535)".to_string());
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u16)
    }

    pub fn line_at(&self, ip: usize) -> usize {
        self.lines.get(ip).copied().unwrap_or(0)
    }

    /// Disassembles the whole chunk into a human-readable listing, used by
    /// the `--disasm` CLI flag.
    pub fn disassemble(&self, name: &str) -> String {
        let mut out = format!("== {name} ==\n");
        let mut offset = 0;
        while offset < self.code.len() {
            offset = self.disassemble_instruction(&mut out, offset);
        }
        out
    }

    fn disassemble_instruction(&self, out: &mut String, offset: usize) -> usize {
        use std::fmt::Write;
        write!(out, "{:04} {:4} ", offset, self.lines[offset]).ok();

        let op = Opcode::from_byte(self.code[offset]);
        match op {
            Opcode::Constant | Opcode::DefineGlobal | Opcode::GetGlobal | Opcode::SetGlobal => {
                let idx = self.read_u16(offset + 1);
                writeln!(out, "{:?} {} ({:?})", op, idx, self.constants[idx as usize]).ok();
                offset + 3
            },
            Opcode::Jump | Opcode::JumpIfFalse => {
                let jump = self.read_u16(offset + 1);
                writeln!(out, "{:?} -> {}", op, offset + 3 + jump as usize).ok();
                offset + 3
            },
            Opcode::Loop => {
                let jump = self.read_u16(offset + 1);
                writeln!(out, "{:?} -> {}", op, (offset + 3).saturating_sub(jump as usize)).ok();
                offset + 3
            },
            Opcode::GetLocal | Opcode::SetLocal | Opcode::GetUpvalue | Opcode::SetUpvalue
            | Opcode::Call | Opcode::ArrayLiteral | Opcode::MapLiteral => {
                let arg = self.code[offset + 1];
                writeln!(out, "{:?} {}", op, arg).ok();
                offset + 2
            },
            Opcode::Closure => {
                let idx = self.read_u16(offset + 1);
                writeln!(out, "{:?} {} ({:?})", op, idx, self.constants[idx as usize]).ok();
                let mut next = offset + 3;
                if let Value::Callable(c) = &self.constants[idx as usize] {
                    if let crate::common::value::Callable::Function(function) = c.as_ref() {
                        for _ in 0..function.upvalue_count {
                            let is_local = self.code[next];
                            let index = self.code[next + 1];
                            writeln!(out, "        |  {} {}", if is_local == 1 { "local" } else { "upvalue" }, index).ok();
                            next += 2;
                        }
                    }
                }
                next
            },
            _ => {
                writeln!(out, "{:?}", op).ok();
                offset + 1
            },
        }
    }

    fn read_u16(&self, offset: usize) -> u16 {
        ((self.code[offset] as u16) << 8) | self.code[offset + 1] as u16
    }
}
