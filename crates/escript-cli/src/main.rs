//! A thin host shell around `escript-core` (spec.md §6.4). Contains no
//! language semantics of its own — it reads input, builds an
//! [`escript_core::Interpreter`], and reports whatever `escript_core`
//! returns. Owns argument parsing and I/O and defers everything else to
//! the library crate.

use std::{env, fs, process::ExitCode, rc::Rc, time::Duration};

use escript_core::{CompatFlags, Exception, Global_eval, Interpreter, LimitedTracker, ReplSession, Source, StderrTracer};

struct Args {
    compat: CompatFlags,
    recursion_limit: Option<u32>,
    debug: bool,
    interactive: bool,
    program: Option<String>,
    file: Option<String>,
    libs: Vec<String>,
    show_version: bool,
    show_help: bool,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args {
        compat: CompatFlags::default(),
        recursion_limit: None,
        debug: false,
        interactive: false,
        program: None,
        file: None,
        libs: Vec::new(),
        show_version: false,
        show_help: false,
    };
    let mut iter = raw.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" => args.show_help = true,
            "-V" => args.show_version = true,
            "-i" => args.interactive = true,
            "-g" => args.debug = true,
            "-e" => args.program = Some(iter.next().ok_or("-e requires an argument")?.clone()),
            "-f" => args.file = Some(iter.next().ok_or("-f requires an argument")?.clone()),
            "-l" => args.libs.push(iter.next().ok_or("-l requires an argument")?.clone()),
            "-c" => {
                let spec = iter.next().ok_or("-c requires an argument")?;
                args.compat = CompatFlags::parse(spec).map_err(|e| e.to_string())?;
            }
            "-r" => {
                let n = iter.next().ok_or("-r requires an argument")?;
                args.recursion_limit = Some(n.parse::<u32>().map_err(|_| format!("invalid recursion limit: {n}"))?);
            }
            other if other.starts_with("-d") => args.debug = true,
            other => args.file = Some(other.to_owned()),
        }
    }
    Ok(args)
}

fn print_usage() {
    eprintln!("usage: escript [-e program] [-f file] [-i] [-c <compat>] [-d<dbg>] [-l <lib>] [-r <n>] [-V] [-h] [file]");
}

fn report_exception(exc: &Exception) {
    eprintln!("{exc}");
    for frame in &exc.traceback {
        let callee = frame.callee.as_deref().unwrap_or("<anonymous>");
        eprintln!("    at {callee} ({})", frame.call_location);
    }
}

fn build_interpreter(args: &Args) -> Interpreter {
    let mut interp = Interpreter::new(args.compat);
    if let Some(limit) = args.recursion_limit {
        interp.set_resource_tracker(LimitedTracker::new(limit).with_time_limit(Duration::from_secs(30)));
    }
    if args.debug {
        interp.set_tracer(StderrTracer);
    }
    interp
}

fn read_source(path: &str, utf_unsafe: bool) -> Result<Source, ExitCode> {
    let bytes = fs::read(path).map_err(|err| {
        eprintln!("error reading {path}: {err}");
        ExitCode::FAILURE
    })?;
    Source::from_file_bytes(path, &bytes, utf_unsafe).map_err(|err| {
        eprintln!("error reading {path}: {err}");
        ExitCode::FAILURE
    })
}

fn run_libs(interp: &mut Interpreter, libs: &[String]) -> Result<(), ExitCode> {
    let utf_unsafe = interp.compat.contains(CompatFlags::UTF_UNSAFE);
    for path in libs {
        let source = read_source(path, utf_unsafe)?;
        if let Err(exc) = Global_eval(interp, Rc::new(source)) {
            report_exception(&exc);
            return Err(ExitCode::FAILURE);
        }
    }
    Ok(())
}

fn run_repl(interp: Interpreter) -> ExitCode {
    let mut session = ReplSession::from_interpreter(interp);
    let mut line = String::new();
    loop {
        line.clear();
        eprint!("> ");
        if std::io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            return ExitCode::SUCCESS;
        }
        if line.trim().is_empty() {
            continue;
        }
        match session.execute(None, &line) {
            Ok(value) => println!("{value:?}"),
            Err(exc) => report_exception(&exc),
        }
    }
}

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("error: {msg}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if args.show_help {
        print_usage();
        return ExitCode::SUCCESS;
    }
    if args.show_version {
        println!("escript {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut interp = build_interpreter(&args);
    if let Err(code) = run_libs(&mut interp, &args.libs) {
        return code;
    }

    if args.interactive {
        return run_repl(interp);
    }

    if let Some(program) = &args.program {
        let source = Source::from_str(None, program);
        return match Global_eval(&mut interp, Rc::new(source)) {
            Ok(_) => ExitCode::SUCCESS,
            Err(exc) => {
                report_exception(&exc);
                ExitCode::FAILURE
            }
        };
    }

    let Some(path) = args.file.clone() else {
        print_usage();
        return ExitCode::FAILURE;
    };
    let utf_unsafe = interp.compat.contains(CompatFlags::UTF_UNSAFE);
    let source = match read_source(&path, utf_unsafe) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match Global_eval(&mut interp, Rc::new(source)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(exc) => {
            report_exception(&exc);
            ExitCode::FAILURE
        }
    }
}
