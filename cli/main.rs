//! The `rhythm` binary: compiles and runs a script file, a `-c`/`--eval`
//! source string, or (with no script argument) a line-oriented REPL.
//! Flag parsing follows the teacher's own CLI layer (`structopt`), and
//! diagnostics are colored the way `passerine-aspen::status::Status` colors
//! its `Fatal`/`Info` messages, generalized here to Rhythm's own error types
//! instead of a package-manager's `Status` enum.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    rc::Rc,
};

use colored::Colorize;
use structopt::StructOpt;

use rhythm::{
    common::Source,
    compiler::{self, parse},
    vm::VM,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(StructOpt, Debug)]
#[structopt(
    name = "rhythm",
    bin_name = "rhythm",
    about = "Scanner, parser, bytecode compiler, and stack VM for the Rhythm scripting language.",
    no_version
)]
struct Opt {
    /// Print the AST before executing it.
    #[structopt(short = "a", long = "ast")]
    ast: bool,

    /// Print disassembled chunks before executing them.
    #[structopt(short = "d", long = "disasm")]
    disasm: bool,

    /// Reject `while`/`for` at parse time.
    #[structopt(short = "n", long = "no-loop")]
    no_loop: bool,

    /// Evaluate the given source string directly instead of a file.
    #[structopt(short = "c", long = "eval")]
    eval: Option<String>,

    /// Show version and build metadata.
    #[structopt(short = "v", long = "version")]
    version: bool,

    /// Path to a Rhythm source file. Omit together with `--eval` to start a REPL.
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let opt = Opt::from_args();

    if opt.version {
        println!("rhythm {VERSION}");
        return ExitCode::SUCCESS;
    }

    let source = if let Some(src) = &opt.eval {
        Source::new("<eval>", src)
    } else if let Some(path) = &opt.script {
        match Source::path(path) {
            Ok(source) => source,
            Err(_) => {
                fatal(&format!("could not read source file '{}'", path.display()));
                return ExitCode::FAILURE;
            },
        }
    } else {
        return repl(opt.no_loop);
    };

    match run_source(source, &opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            fatal(&message);
            ExitCode::FAILURE
        },
    }
}

fn run_source(source: Rc<Source>, opt: &Opt) -> Result<(), String> {
    if opt.ast {
        let program = parse(Rc::clone(&source), opt.no_loop).map_err(|e| e.to_string())?;
        println!("{program:#?}");
    }

    let closure = compiler::compile(Rc::clone(&source), opt.no_loop).map_err(|e| e.to_string())?;

    if opt.disasm {
        println!("{}", closure.function.chunk.disassemble(&closure.function.name));
    }

    let mut vm = VM::new();
    vm.interpret(closure).map_err(|e| e.to_string())
}

/// Reads one line at a time from stdin, compiling and running each as its
/// own top-level program; a compile or runtime error is reported and the
/// REPL continues with the next line.
fn repl(no_loop: bool) -> ExitCode {
    let stdin = std::io::stdin();
    print!("> ");
    std::io::stdout().flush().ok();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let source = Source::repl(&line);
        if let Err(message) = run_source(source, &Opt {
            ast: false,
            disasm: false,
            no_loop,
            eval: None,
            version: false,
            script: None,
        }) {
            fatal(&message);
        }
        print!("> ");
        std::io::stdout().flush().ok();
    }
    println!();
    ExitCode::SUCCESS
}

fn fatal(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
