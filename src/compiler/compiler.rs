//! Single-pass bytecode compiler: walks the AST once, resolving lexical
//! captures (locals/upvalues/globals) as it goes and emitting bytecode
//! directly — no separate resolver pass, no intermediate IR.

use std::rc::Rc;

use crate::{
    common::{
        captured::Captured,
        closure::Closure,
        function::{Function, FunctionKind},
        opcode::Opcode,
        value::Callable,
        Source, Span, Value,
    },
    compiler::{ast::*, error::Syntax},
};

#[derive(Debug, Clone)]
struct Local {
    name: String,
    /// `-1` (modeled as `Option::None`) marks "declared but not yet
    /// defined" — the window between pushing a local and finishing its
    /// initializer, during which referencing it by name is an error.
    depth: Option<usize>,
    is_captured: bool,
}

struct LoopContext {
    loop_start: usize,
    continue_jumps: Vec<usize>,
    break_jumps: Vec<usize>,
    locals_count_at_entry: usize,
}

/// Per-function compiler state. A `Vec` of these models a chain of nested
/// compilers with an "enclosing" pointer: index `i - 1` is the enclosing
/// compiler of index `i`.
struct FunctionState {
    function: Function,
    locals: Vec<Local>,
    scope_depth: usize,
    upvalues: Vec<Captured>,
    loop_stack: Vec<LoopContext>,
}

impl FunctionState {
    fn new(name: impl Into<String>, kind: FunctionKind) -> FunctionState {
        FunctionState {
            function: Function::new(name, kind),
            locals: vec![],
            scope_depth: 0,
            upvalues: vec![],
            loop_stack: vec![],
        }
    }
}

enum Resolved { Local(u8), Upvalue(u8), Global }

pub struct Compiler {
    source: Rc<Source>,
    states: Vec<FunctionState>,
}

impl Compiler {
    /// Compiles a top-level program into the `Script` function, wrapped in
    /// a `Closure` with no upvalues (it has none — nothing encloses it).
    pub fn compile(source: Rc<Source>, program: Vec<Stmt>) -> Result<Closure, Syntax> {
        let mut compiler = Compiler { source, states: vec![FunctionState::new("script", FunctionKind::Script)] };

        for stmt in &program {
            compiler.statement(stmt)?;
        }

        let line = program.last().map(|s| s.line()).unwrap_or(1);
        compiler.emit(Opcode::Nil, line);
        compiler.emit(Opcode::Return, line);

        let state = compiler.states.pop().expect("script state always present");
        Ok(Closure::new(Rc::new(state.function), vec![]))
    }

    // --- state/emit helpers ---

    fn state(&mut self) -> &mut FunctionState { self.states.last_mut().expect("at least one function state") }

    fn chunk_len(&mut self) -> usize { self.state().function.chunk.code.len() }

    fn emit(&mut self, op: Opcode, line: usize) -> usize { self.state().function.chunk.emit(op, line) }

    fn emit_byte(&mut self, byte: u8, line: usize) { self.state().function.chunk.emit_byte(byte, line); }

    fn emit_short(&mut self, value: u16, line: usize) { self.state().function.chunk.emit_short(value, line); }

    fn emit_jump(&mut self, op: Opcode, line: usize) -> usize {
        self.emit(op, line);
        let offset = self.chunk_len();
        self.emit_short(0xFFFF, line);
        offset
    }

    fn patch_jump(&mut self, offset: usize) -> Result<(), Syntax> {
        self.state().function.chunk.patch_jump(offset).map_err(|e| self.err(0, e))
    }

    fn emit_loop(&mut self, loop_start: usize, line: usize) -> Result<(), Syntax> {
        self.emit(Opcode::Loop, line);
        let distance = self.chunk_len() + 2 - loop_start;
        if distance > u16::MAX as usize {
            return Err(self.err(line, "loop body too large to encode"));
        }
        self.emit_short(distance as u16, line);
        Ok(())
    }

    fn make_constant(&mut self, value: Value, line: usize) -> Result<u16, Syntax> {
        self.state().function.chunk.add_constant(value).map_err(|e| self.err(line, e))
    }

    fn emit_constant(&mut self, value: Value, line: usize) -> Result<(), Syntax> {
        let index = self.make_constant(value, line)?;
        self.emit(Opcode::Constant, line);
        self.emit_short(index, line);
        Ok(())
    }

    fn err(&self, line: usize, reason: impl Into<String>) -> Syntax {
        Syntax::error(Span::new(&self.source, line), reason)
    }

    // --- scope discipline ---

    fn begin_scope(&mut self) { self.state().scope_depth += 1; }

    fn end_scope(&mut self, line: usize) {
        self.state().scope_depth -= 1;
        let depth = self.state().scope_depth;
        while let Some(local) = self.state().locals.last() {
            if local.depth.map(|d| d > depth).unwrap_or(false) {
                let local = self.state().locals.pop().unwrap();
                if local.is_captured {
                    self.emit(Opcode::CloseUpvalue, line);
                } else {
                    self.emit(Opcode::Pop, line);
                }
            } else {
                break;
            }
        }
    }

    /// Declares a local in the current scope (does nothing at global scope,
    /// where variables live in the VM's global map instead).
    fn declare_local(&mut self, name: &str, line: usize) -> Result<(), Syntax> {
        let depth = self.state().scope_depth;
        if depth == 0 { return Ok(()); }

        for local in self.state().locals.iter().rev() {
            if local.depth.map(|d| d < depth).unwrap_or(false) { break; }
            if local.name == name {
                return Err(self.err(line, format!("'{name}' is already declared in this scope")));
            }
        }

        self.state().locals.push(Local { name: name.to_string(), depth: None, is_captured: false });
        Ok(())
    }

    fn mark_initialized(&mut self) {
        let depth = self.state().scope_depth;
        if depth == 0 { return; }
        if let Some(local) = self.state().locals.last_mut() {
            local.depth = Some(depth);
        }
    }

    /// Defines a variable after its initializer has been compiled: locally
    /// this just marks the local as initialized (its value is already on
    /// the stack); globally it emits `DEFINE_GLOBAL`.
    fn define_variable(&mut self, name: &str, line: usize) -> Result<(), Syntax> {
        if self.state().scope_depth > 0 {
            self.mark_initialized();
            return Ok(());
        }
        let index = self.make_constant(Value::string(name), line)?;
        self.emit(Opcode::DefineGlobal, line);
        self.emit_short(index, line);
        Ok(())
    }

    // --- variable resolution ---

    fn resolve_local(state: &FunctionState, name: &str) -> Result<Option<usize>, String> {
        for (slot, local) in state.locals.iter().enumerate().rev() {
            if local.name == name {
                return match local.depth {
                    Some(_) => Ok(Some(slot)),
                    None => Err(format!("cannot read local '{name}' in its own initializer")),
                };
            }
        }
        Ok(None)
    }

    fn add_upvalue(state: &mut FunctionState, captured: Captured) -> Result<u8, String> {
        if let Some(index) = state.upvalues.iter().position(|u| *u == captured) {
            return Ok(index as u8);
        }
        if state.upvalues.len() >= u8::MAX as usize {
            return Err("too many closure variables captured in one function (over 255)".to_string());
        }
        state.upvalues.push(captured);
        state.function.upvalue_count = state.upvalues.len();
        Ok((state.upvalues.len() - 1) as u8)
    }

    /// Resolves `name` as an upvalue of `states[index]`, recursing outward
    /// through enclosing compiler states as needed.
    fn resolve_upvalue(states: &mut [FunctionState], index: usize, name: &str) -> Result<Option<u8>, String> {
        if index == 0 { return Ok(None); }
        let enclosing = index - 1;

        if let Some(slot) = Self::resolve_local(&states[enclosing], name)? {
            states[enclosing].locals[slot].is_captured = true;
            return Ok(Some(Self::add_upvalue(&mut states[index], Captured::local(slot as u8))?));
        }

        if let Some(up) = Self::resolve_upvalue(states, enclosing, name)? {
            return Ok(Some(Self::add_upvalue(&mut states[index], Captured::upvalue(up))?));
        }

        Ok(None)
    }

    fn resolve_variable(&mut self, name: &str, line: usize) -> Result<Resolved, Syntax> {
        let top = self.states.len() - 1;
        match Self::resolve_local(&self.states[top], name).map_err(|e| self.err(line, e))? {
            Some(slot) => return Ok(Resolved::Local(slot as u8)),
            None => {},
        }
        match Self::resolve_upvalue(&mut self.states, top, name).map_err(|e| self.err(line, e))? {
            Some(slot) => return Ok(Resolved::Upvalue(slot)),
            None => {},
        }
        Ok(Resolved::Global)
    }

    // --- statements ---

    fn statement(&mut self, stmt: &Stmt) -> Result<(), Syntax> {
        match stmt {
            Stmt::Expression { expr, line } => {
                self.expression(expr)?;
                self.emit(Opcode::Pop, *line);
            },
            Stmt::Print { expr, line } => {
                self.expression(expr)?;
                self.emit(Opcode::Print, *line);
            },
            Stmt::Var { name, initializer, line } => {
                self.declare_local(name, *line)?;
                match initializer {
                    Some(expr) => self.expression(expr)?,
                    None => { self.emit(Opcode::Nil, *line); },
                }
                self.define_variable(name, *line)?;
            },
            Stmt::Block { statements, line } => {
                self.begin_scope();
                for s in statements { self.statement(s)?; }
                self.end_scope(*line);
            },
            Stmt::If { condition, then_branch, else_branch, line } => {
                self.expression(condition)?;
                let then_jump = self.emit_jump(Opcode::JumpIfFalse, *line);
                self.emit(Opcode::Pop, *line);
                self.statement(then_branch)?;
                let else_jump = self.emit_jump(Opcode::Jump, *line);
                self.patch_jump(then_jump)?;
                self.emit(Opcode::Pop, *line);
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch)?;
                }
                self.patch_jump(else_jump)?;
            },
            Stmt::While(w) => self.while_statement(w)?,
            Stmt::Function { name, function, line } => {
                self.declare_local(name, *line)?;
                self.mark_initialized();
                self.function_expr(function, FunctionKind::Function)?;
                self.define_variable(name, *line)?;
            },
            Stmt::Return { value, line } => {
                match value {
                    Some(expr) => self.expression(expr)?,
                    None => { self.emit(Opcode::Nil, *line); },
                }
                self.emit(Opcode::Return, *line);
            },
            Stmt::Break { line } => self.loop_jump(*line, true)?,
            Stmt::Continue { line } => self.loop_jump(*line, false)?,
        }
        Ok(())
    }

    fn loop_jump(&mut self, line: usize, is_break: bool) -> Result<(), Syntax> {
        let Some(ctx) = self.state().loop_stack.last() else {
            let what = if is_break { "break" } else { "continue" };
            return Err(self.err(line, format!("'{what}' outside of a loop")));
        };
        let entry = ctx.locals_count_at_entry;

        // Pop locals declared since the loop was entered, without mutating
        // the static scope (the block(s) containing this break/continue are
        // still lexically open; only the runtime stack needs cleanup).
        let to_close: Vec<bool> = self.state().locals[entry..].iter().rev().map(|l| l.is_captured).collect();
        for captured in to_close {
            self.emit(if captured { Opcode::CloseUpvalue } else { Opcode::Pop }, line);
        }

        let jump = self.emit_jump(Opcode::Jump, line);
        let ctx = self.state().loop_stack.last_mut().expect("checked above");
        if is_break { ctx.break_jumps.push(jump); } else { ctx.continue_jumps.push(jump); }
        Ok(())
    }

    fn while_statement(&mut self, w: &WhileStmt) -> Result<(), Syntax> {
        let loop_start = self.chunk_len();
        self.state().loop_stack.push(LoopContext {
            loop_start,
            continue_jumps: vec![],
            break_jumps: vec![],
            locals_count_at_entry: self.state().locals.len(),
        });

        self.expression(&w.condition)?;
        let exit_jump = self.emit_jump(Opcode::JumpIfFalse, w.line);
        self.emit(Opcode::Pop, w.line);

        self.statement(&w.body)?;

        let continue_target = self.chunk_len();
        if let Some(increment) = &w.increment {
            self.expression(increment)?;
            self.emit(Opcode::Pop, w.line);
        }
        self.emit_loop(loop_start, w.line)?;

        self.patch_jump(exit_jump)?;
        self.emit(Opcode::Pop, w.line);

        let ctx = self.state().loop_stack.pop().expect("pushed above");
        for jump in ctx.continue_jumps {
            self.state().function.chunk.code[jump] = ((continue_target.saturating_sub(jump + 2) >> 8) & 0xFF) as u8;
            self.state().function.chunk.code[jump + 1] = (continue_target.saturating_sub(jump + 2) & 0xFF) as u8;
        }
        for jump in ctx.break_jumps {
            self.patch_jump(jump)?;
        }
        Ok(())
    }

    // --- expressions ---

    fn expression(&mut self, expr: &Expr) -> Result<(), Syntax> {
        match expr {
            Expr::Literal { value, line } => self.emit_constant_or_nil(value, *line)?,
            Expr::Grouping { inner, .. } => self.expression(inner)?,
            Expr::Variable { name, line } => self.variable_get(name, *line)?,
            Expr::Unary { op, operand, line } => {
                self.expression(operand)?;
                self.emit(match op { UnaryOp::Negate => Opcode::Negate, UnaryOp::Not => Opcode::Not }, *line);
            },
            Expr::Binary { op, left, right, line } => {
                self.expression(left)?;
                self.expression(right)?;
                self.binary_op(*op, *line);
            },
            Expr::Logical { op, left, right, line } => self.logical(*op, left, right, *line)?,
            Expr::Ternary { condition, then_branch, else_branch, line } => {
                self.expression(condition)?;
                let then_jump = self.emit_jump(Opcode::JumpIfFalse, *line);
                self.emit(Opcode::Pop, *line);
                self.expression(then_branch)?;
                let else_jump = self.emit_jump(Opcode::Jump, *line);
                self.patch_jump(then_jump)?;
                self.emit(Opcode::Pop, *line);
                self.expression(else_branch)?;
                self.patch_jump(else_jump)?;
            },
            Expr::Assignment { name, value, line } => {
                self.expression(value)?;
                self.variable_set(name, *line)?;
            },
            Expr::Call { callee, args, line } => {
                self.expression(callee)?;
                if args.len() > 255 {
                    return Err(self.err(*line, "cannot call a function with more than 255 arguments"));
                }
                for arg in args { self.expression(arg)?; }
                self.emit(Opcode::Call, *line);
                self.emit_byte(args.len() as u8, *line);
            },
            Expr::ArrayLiteral { elements, line } => {
                for el in elements { self.expression(el)?; }
                if elements.len() > 255 {
                    return Err(self.err(*line, "array literal cannot have more than 255 elements"));
                }
                self.emit(Opcode::ArrayLiteral, *line);
                self.emit_byte(elements.len() as u8, *line);
            },
            Expr::MapLiteral { entries, line } => {
                for (k, v) in entries {
                    self.expression(k)?;
                    self.expression(v)?;
                }
                if entries.len() > 255 {
                    return Err(self.err(*line, "map literal cannot have more than 255 entries"));
                }
                self.emit(Opcode::MapLiteral, *line);
                self.emit_byte(entries.len() as u8, *line);
            },
            Expr::Subscript { object, index, line } => {
                self.expression(object)?;
                self.expression(index)?;
                self.emit(Opcode::Subscript, *line);
            },
            Expr::SubscriptAssignment { object, index, value, line } => {
                self.expression(object)?;
                self.expression(index)?;
                self.expression(value)?;
                self.emit(Opcode::SubscriptAssignment, *line);
            },
            Expr::PropertyAccess { object, name, line } => {
                self.expression(object)?;
                self.emit_constant(Value::string(name.clone()), *line)?;
                self.emit(Opcode::Subscript, *line);
            },
            Expr::FunctionExpr(f) => self.function_expr(f, FunctionKind::Function)?,
            Expr::Postfix { line, .. } => {
                return Err(self.err(*line, "postfix increment/decrement is not supported"));
            },
        }
        Ok(())
    }

    fn emit_constant_or_nil(&mut self, value: &Value, line: usize) -> Result<(), Syntax> {
        match value {
            Value::Nil => { self.emit(Opcode::Nil, line); Ok(()) },
            other => self.emit_constant(other.clone(), line),
        }
    }

    fn binary_op(&mut self, op: BinaryOp, line: usize) {
        match op {
            BinaryOp::Add => { self.emit(Opcode::Add, line); },
            BinaryOp::Subtract => { self.emit(Opcode::Subtract, line); },
            BinaryOp::Multiply => { self.emit(Opcode::Multiply, line); },
            BinaryOp::Divide => { self.emit(Opcode::Divide, line); },
            BinaryOp::Modulo => { self.emit(Opcode::Modulo, line); },
            BinaryOp::Equal => { self.emit(Opcode::Equal, line); },
            BinaryOp::NotEqual => { self.emit(Opcode::Equal, line); self.emit(Opcode::Not, line); },
            BinaryOp::Greater => { self.emit(Opcode::Greater, line); },
            BinaryOp::GreaterEqual => { self.emit(Opcode::Less, line); self.emit(Opcode::Not, line); },
            BinaryOp::Less => { self.emit(Opcode::Less, line); },
            BinaryOp::LessEqual => { self.emit(Opcode::Greater, line); self.emit(Opcode::Not, line); },
        }
    }

    fn logical(&mut self, op: LogicalOp, left: &Expr, right: &Expr, line: usize) -> Result<(), Syntax> {
        self.expression(left)?;
        match op {
            LogicalOp::And => {
                let end = self.emit_jump(Opcode::JumpIfFalse, line);
                self.emit(Opcode::Pop, line);
                self.expression(right)?;
                self.patch_jump(end)?;
            },
            LogicalOp::Or => {
                let else_jump = self.emit_jump(Opcode::JumpIfFalse, line);
                let end_jump = self.emit_jump(Opcode::Jump, line);
                self.patch_jump(else_jump)?;
                self.emit(Opcode::Pop, line);
                self.expression(right)?;
                self.patch_jump(end_jump)?;
            },
        }
        Ok(())
    }

    fn variable_get(&mut self, name: &str, line: usize) -> Result<(), Syntax> {
        match self.resolve_variable(name, line)? {
            Resolved::Local(slot) => { self.emit(Opcode::GetLocal, line); self.emit_byte(slot, line); },
            Resolved::Upvalue(slot) => { self.emit(Opcode::GetUpvalue, line); self.emit_byte(slot, line); },
            Resolved::Global => {
                let index = self.make_constant(Value::string(name), line)?;
                self.emit(Opcode::GetGlobal, line);
                self.emit_short(index, line);
            },
        }
        Ok(())
    }

    fn variable_set(&mut self, name: &str, line: usize) -> Result<(), Syntax> {
        match self.resolve_variable(name, line)? {
            Resolved::Local(slot) => { self.emit(Opcode::SetLocal, line); self.emit_byte(slot, line); },
            Resolved::Upvalue(slot) => { self.emit(Opcode::SetUpvalue, line); self.emit_byte(slot, line); },
            Resolved::Global => {
                let index = self.make_constant(Value::string(name), line)?;
                self.emit(Opcode::SetGlobal, line);
                self.emit_short(index, line);
            },
        }
        Ok(())
    }

    /// Compiles a function (declaration body or expression) with a fresh
    /// nested `FunctionState`, then emits `CLOSURE` in the parent to bind
    /// its upvalues.
    fn function_expr(&mut self, f: &FunctionExpr, kind: FunctionKind) -> Result<(), Syntax> {
        let name = f.name.clone().unwrap_or_else(|| "anonymous".to_string());
        self.states.push(FunctionState::new(&name, kind));
        self.begin_scope();

        if f.params.len() > 255 {
            return Err(self.err(f.line, "cannot have more than 255 parameters"));
        }
        self.state().function.arity = f.params.len() as u8;
        for param in &f.params {
            self.declare_local(param, f.line)?;
            self.mark_initialized();
        }

        for stmt in &f.body {
            self.statement(stmt)?;
        }
        let end_line = f.body.last().map(|s| s.line()).unwrap_or(f.line);
        self.emit(Opcode::Nil, end_line);
        self.emit(Opcode::Return, end_line);

        let state = self.states.pop().expect("pushed at top of this function");
        let upvalues = state.upvalues.clone();
        let function = Rc::new(state.function);

        let constant = self.make_constant(
            Value::Callable(Rc::new(Callable::Function(Rc::clone(&function)))),
            f.line,
        )?;
        self.emit(Opcode::Closure, f.line);
        self.emit_short(constant, f.line);
        for captured in &upvalues {
            self.emit_byte(if captured.is_local { 1 } else { 0 }, f.line);
            self.emit_byte(captured.index, f.line);
        }
        Ok(())
    }
}
