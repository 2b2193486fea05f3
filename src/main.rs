use a9::cli::{generate_completions, Args, Commands};
use a9::config::{AppConfig, EVAL_STACK_SIZE};
use a9::diagnostic::{render_diagnostics, SourceMap};
use a9::format::{format_definition, format_program};
use a9::interpreter::{self, Error, Interpreter};
use a9::Value;
use clap::Parser;
use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;

const EXIT_LANGUAGE_ERROR: i32 = 1;
const EXIT_UNREADABLE: i32 = 2;
const EXIT_INTERNAL: i32 = 101;

const REPL_HELP: &str = "\
Enter an expression to evaluate it against the loaded definitions.
  :defs    list the loaded definitions
  :help    show this message
  exit     leave (also `quit` or end of input)";

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);

    verbose_log(&config, "Starting a9");

    let Some(path) = args.file.clone() else {
        error_message(&config, "No program file given");
        std::process::exit(EXIT_UNREADABLE);
    };

    let code = run_on_eval_thread(path, args.invocation.clone(), &config);
    if code != 0 {
        std::process::exit(code);
    }
}

/// Evaluation recurses on the native stack, so it runs on a thread whose
/// stack matches the nesting limit in `config`.
fn run_on_eval_thread(path: PathBuf, invocation: Option<String>, config: &AppConfig) -> i32 {
    let thread_config = config.clone();
    let spawned = thread::Builder::new()
        .name("a9-eval".to_string())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || run(&path, invocation.as_deref(), &thread_config));

    match spawned {
        Ok(handle) => handle.join().unwrap_or_else(|_| {
            error_message(config, "Evaluation thread panicked");
            EXIT_INTERNAL
        }),
        Err(e) => {
            error_message(config, &format!("Failed to start evaluation thread: {}", e));
            EXIT_INTERNAL
        }
    }
}

fn run(path: &Path, invocation: Option<&str>, config: &AppConfig) -> i32 {
    let source = match read_file(path) {
        Ok(s) => s,
        Err(e) => {
            error_message(config, &e);
            return EXIT_UNREADABLE;
        }
    };

    verbose_log(config, &format!("Read {} bytes from {}", source.len(), path.display()));

    let mut sources = SourceMap::new();
    let program_id = sources.add(path.display().to_string(), source.as_str());

    let program = match interpreter::parse_program(&source, program_id) {
        Ok(program) => program,
        Err(err) => {
            report(&sources, &err, config);
            return EXIT_LANGUAGE_ERROR;
        }
    };

    verbose_log(config, &format!("Parsed {} definition(s)", program.definitions.len()));

    if config.dump_ast {
        eprintln!("{}", format_program(&program));
    }

    let mut interpreter = match Interpreter::with_limits(program, config.limits) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            report(&sources, &Error::from(err), config);
            return EXIT_LANGUAGE_ERROR;
        }
    };

    match invocation {
        Some(text) => {
            verbose_log(config, &format!("Evaluating invocation: {}", text));
            match evaluate(&mut interpreter, &mut sources, "<invocation>", text) {
                Ok(value) => {
                    println!("{}", value);
                    0
                }
                Err(err) => {
                    report(&sources, &err, config);
                    EXIT_LANGUAGE_ERROR
                }
            }
        }
        None => {
            run_repl(&mut interpreter, &mut sources, config);
            0
        }
    }
}

fn evaluate(
    interpreter: &mut Interpreter,
    sources: &mut SourceMap,
    name: &str,
    text: &str,
) -> Result<Value, Error> {
    let id = sources.add(name, text);
    let expr = interpreter::parse_invocation(text, id)?;
    Ok(interpreter.evaluate(&expr)?)
}

fn run_repl(interpreter: &mut Interpreter, sources: &mut SourceMap, config: &AppConfig) {
    let interactive = atty::is(atty::Stream::Stdin);
    if interactive {
        println!("a9 {} (type :help for commands)", env!("CARGO_PKG_VERSION"));
    } else {
        verbose_log(config, "Reading invocations from stdin");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut line_number = 0usize;

    loop {
        if interactive {
            print!("a9> ");
            let _ = io::stdout().flush();
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error_message(config, &format!("Error reading input: {}", e));
                break;
            }
            None => break,
        };
        line_number += 1;

        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            ":help" => println!("{}", REPL_HELP),
            ":defs" => {
                for definition in interpreter.definitions() {
                    println!("{}", format_definition(definition));
                }
            }
            text => {
                let mark = sources.len();
                match evaluate(interpreter, sources, &format!("<repl:{}>", line_number), text) {
                    Ok(value) => println!("{}", value),
                    Err(err) => report(sources, &err, config),
                }
                // Line sources are dropped after reporting; ids restart at `mark`.
                sources.truncate(mark);
            }
        }
    }
}

fn report(sources: &SourceMap, err: &Error, config: &AppConfig) {
    verbose_log(config, &format!("Failed: {}", err));
    eprint!("{}", render_diagnostics(sources, &err.to_diagnostics(), config.color_enabled));
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn verbose_log(config: &AppConfig, message: &str) {
    if config.verbose {
        eprintln!("[a9:debug] {}", message);
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
