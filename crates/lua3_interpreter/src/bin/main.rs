use lua3::LuaVM;
use lua3::lua_value::value_to_display;
use std::env;
use std::fs;
use std::io::Read;
use std::process::ExitCode;
use std::rc::Rc;

const VERSION: &str = "lua3 0.1 (classic Lua 3.x dialect)";

fn print_usage() {
    eprintln!("usage: lua3 [options] [script]");
    eprintln!("Available options are:");
    eprintln!("  -e stat   execute string 'stat'");
    eprintln!("  -g        compile with debug information");
    eprintln!("  -d        list compiled bytecode instead of executing");
    eprintln!("  -v        show version information");
    eprintln!("  --        stop handling options");
    eprintln!("  -         stop handling options and execute stdin");
}

fn print_version() {
    println!("{}", VERSION);
}

#[derive(Default)]
struct Options {
    execute_strings: Vec<String>,
    script_file: Option<String>,
    show_version: bool,
    read_stdin: bool,
    debug_info: bool,
    dump_bytecode: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();
    let mut i = 1;
    let mut stop_options = false;

    while i < args.len() {
        let arg = &args[i];

        if !stop_options && arg.starts_with('-') && arg.len() > 1 {
            match arg.as_str() {
                "-e" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("'-e' needs argument".to_string());
                    }
                    opts.execute_strings.push(args[i].clone());
                }
                "-g" => {
                    opts.debug_info = true;
                }
                "-d" => {
                    opts.dump_bytecode = true;
                }
                "-v" => {
                    opts.show_version = true;
                }
                "--" => {
                    stop_options = true;
                }
                _ => {
                    return Err(format!("unrecognized option '{}'", arg));
                }
            }
        } else if arg == "-" {
            opts.read_stdin = true;
            stop_options = true;
        } else {
            opts.script_file = Some(arg.clone());
            break;
        }
        i += 1;
    }

    Ok(opts)
}

fn run_source(vm: &mut LuaVM, source: &str, name: &str, dump: bool) -> Result<(), String> {
    let chunk = vm
        .compile_with_name(source, name)
        .map_err(|e| e.to_string())?;
    if dump {
        print!("{}", chunk.disassemble());
        return Ok(());
    }
    let results = vm.execute(Rc::new(chunk)).map_err(|e| e.to_string())?;
    if !results.is_empty() {
        let parts: Vec<String> = results.iter().map(value_to_display).collect();
        println!("{}", parts.join("\t"));
    }
    Ok(())
}

fn main() -> ExitCode {
    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("lua3: {}", msg);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if opts.show_version {
        print_version();
        if opts.execute_strings.is_empty() && opts.script_file.is_none() && !opts.read_stdin {
            return ExitCode::SUCCESS;
        }
    }

    if opts.execute_strings.is_empty() && opts.script_file.is_none() && !opts.read_stdin {
        print_usage();
        return ExitCode::FAILURE;
    }

    let mut vm = LuaVM::new();
    vm.set_debug_info(opts.debug_info);
    vm.open_libs();

    for stat in &opts.execute_strings {
        if let Err(msg) = run_source(&mut vm, stat, "=(command line)", opts.dump_bytecode) {
            eprintln!("lua3: {}", msg);
            return ExitCode::FAILURE;
        }
    }

    let source = if opts.read_stdin {
        let mut buffer = String::new();
        if let Err(err) = std::io::stdin().read_to_string(&mut buffer) {
            eprintln!("lua3: cannot read stdin: {}", err);
            return ExitCode::FAILURE;
        }
        Some(("stdin".to_string(), buffer))
    } else if let Some(path) = &opts.script_file {
        match fs::read_to_string(path) {
            Ok(text) => Some((path.clone(), text)),
            Err(err) => {
                eprintln!("lua3: cannot open {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        None
    };

    if let Some((name, text)) = source {
        if let Err(msg) = run_source(&mut vm, &text, &name, opts.dump_bytecode) {
            eprintln!("lua3: {}", msg);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
