//! C-style `printf`/`sprintf` formatting shared by `native::io::printf` and
//! `sprintf`, plus the string utilities `substring` and `split` that operate
//! on the same raw, not-yet-unescaped string representation.

use std::rc::Rc;

use crate::{common::Value, vm::{trace::Trace, vm::VM}};

/// Escapes are interpreted lazily here rather than by the scanner: a string
/// literal stores its raw text, and only `printf`/`sprintf` unescape
/// `\n \t \r \\` on the way out.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => { out.push('\\'); out.push(other); },
            None => out.push('\\'),
        }
    }
    out
}

/// Renders `fmt` against `args` (args[0] is the format string itself, not
/// consumed by a spec). Shared by `printf` (writes to stdout) and `sprintf`
/// (returns the string).
pub fn render(vm: &VM, args: &[Value]) -> Result<String, Trace> {
    let raw = match args.first() {
        Some(Value::Str(s)) => s.clone(),
        _ => return Err(vm.runtime_error("printf needs a format string")),
    };
    let fmt = unescape(&raw);

    let mut out = String::new();
    let mut chars = fmt.chars().peekable();
    let mut ap = 1usize;

    let mut next = |ap: &mut usize| -> Result<Value, Trace> {
        let value = args.get(*ap).cloned().ok_or_else(|| vm.runtime_error("too few arguments for printf"))?;
        *ap += 1;
        Ok(value)
    };

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let spec = chars.next().ok_or_else(|| vm.runtime_error("lone '%' at end of format string"))?;
        match spec {
            '%' => out.push('%'),
            'd' | 'i' => {
                let v = next(&mut ap)?;
                let n = match v {
                    Value::Number(n) => n as i64,
                    Value::Bool(b) => if b { 1 } else { 0 },
                    other => return Err(vm.runtime_error(format!("%{spec} expects number/bool; got {}", other.type_name()))),
                };
                out.push_str(&n.to_string());
            },
            'f' => {
                let v = next(&mut ap)?;
                match v {
                    Value::Number(n) => out.push_str(&format!("{n:.6}")),
                    other => return Err(vm.runtime_error(format!("%f expects number, got {}", other.type_name()))),
                }
            },
            'e' => {
                let v = next(&mut ap)?;
                match v {
                    Value::Number(n) => out.push_str(&format!("{n:e}")),
                    other => return Err(vm.runtime_error(format!("%e expects number, got {}", other.type_name()))),
                }
            },
            's' => {
                let v = next(&mut ap)?;
                match v {
                    Value::Str(s) => out.push_str(&s),
                    Value::Nil => out.push_str("nil"),
                    other => out.push_str(&other.to_string()),
                }
            },
            'c' => {
                let v = next(&mut ap)?;
                match v {
                    Value::Number(n) => out.push((n as u8) as char),
                    Value::Str(s) if s.chars().count() == 1 => out.push(s.chars().next().unwrap()),
                    other => return Err(vm.runtime_error(format!("%c expects a single character, got {}", other.type_name()))),
                }
            },
            other => return Err(vm.runtime_error(format!("unsupported format spec '%{other}'"))),
        }
    }

    if ap != args.len() {
        return Err(vm.runtime_error("too many arguments for printf"));
    }
    Ok(out)
}

pub fn printf(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let rendered = render(vm, args)?;
    vm.write_out(&rendered);
    Ok(Value::Nil)
}

pub fn sprintf(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let rendered = render(vm, args)?;
    Ok(Value::string(rendered))
}

fn require_string<'a>(vm: &VM, v: &'a Value, who: &str) -> Result<&'a Rc<str>, Trace> {
    match v {
        Value::Str(s) => Ok(s),
        other => Err(vm.runtime_error(format!("{who} requires a string, got {}", other.type_name()))),
    }
}

fn require_index(vm: &VM, v: &Value, who: &str) -> Result<i64, Trace> {
    match v {
        Value::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
        _ => Err(vm.runtime_error(format!("{who} indices must be integers"))),
    }
}

pub fn substring(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let text = require_string(vm, &args[0], "substring()")?;
    let start = require_index(vm, &args[1], "substring()")?;
    let end = require_index(vm, &args[2], "substring()")?;
    let chars: Vec<char> = text.chars().collect();
    if start < 0 || end < start || end as usize > chars.len() {
        return Err(vm.runtime_error("substring() indices out of range"));
    }
    let slice: String = chars[start as usize..end as usize].iter().collect();
    Ok(Value::string(slice))
}

pub fn split(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let text = require_string(vm, &args[0], "split()")?;
    let delim = require_string(vm, &args[1], "split()")?;
    let pieces: Vec<Value> = if delim.is_empty() {
        text.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        text.split(delim.as_ref()).map(Value::string).collect()
    };
    Ok(Value::array(pieces))
}

#[cfg(test)]
mod test {
    use super::*;

    fn vm() -> VM { VM::new() }

    #[test]
    fn renders_mixed_specs() {
        let vm = vm();
        let args = vec![Value::string("%s is %d years, %f%%\\n"), Value::string("cat"), Value::Number(3.0), Value::Number(50.0)];
        let out = render(&vm, &args).unwrap();
        assert!(out.starts_with("cat is 3 years, 50.000000%"));
    }

    #[test]
    fn too_few_arguments_errors() {
        let vm = vm();
        let args = vec![Value::string("%d")];
        assert!(render(&vm, &args).is_err());
    }

    #[test]
    fn too_many_arguments_errors() {
        let vm = vm();
        let args = vec![Value::string("no specs here"), Value::Number(1.0)];
        assert!(render(&vm, &args).is_err());
    }

    #[test]
    fn split_on_delimiter() {
        let mut vm = vm();
        let result = split(&mut vm, &[Value::string("a,b,c"), Value::string(",")]).unwrap();
        if let Value::Array(a) = result {
            assert_eq!(a.borrow().len(), 3);
        } else {
            panic!("expected array");
        }
    }
}
