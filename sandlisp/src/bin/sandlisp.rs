extern crate sandlisp;

use sandlisp::{Config, HostModule, Interpreter, LispExpr};
use std::time::Duration;

struct Options {
    config: Config,
    expr: Option<String>,
}

fn parse_options() -> Result<Options, String> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        println!("Usage: sandlisp [options]");
        println!("Options:");
        println!("  -h, --help: Print this help message");
        println!("  -e <expr>: Evaluate <expr> and exit");
        println!("  --max-ops <n>: Evaluation steps allowed per input (default: 100000)");
        println!("  --timeout-ms <ms>: Wall-clock budget per input (default: 5000)");
        println!("  --max-depth <n>: Maximum evaluation nesting (default: 512)");
        println!("At the prompt, :env lists global names and :reset forgets user definitions");
        std::process::exit(0);
    }

    let mut config = Config::default();
    if let Some(ops) = args.opt_value_from_str::<_, u64>("--max-ops").map_err(|e| e.to_string())? {
        config = config.with_max_operations(ops);
    }
    if let Some(ms) = args.opt_value_from_str::<_, u64>("--timeout-ms").map_err(|e| e.to_string())? {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if let Some(depth) = args.opt_value_from_str::<_, usize>("--max-depth").map_err(|e| e.to_string())? {
        config = config.with_max_depth(depth);
    }
    let expr = args.opt_value_from_str::<_, String>("-e").map_err(|e| e.to_string())?;

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(format!("Unexpected arguments: {:?}", rest));
    }
    Ok(Options{config, expr})
}

fn number(args: &[LispExpr], idx: usize) -> Result<f64, String> {
    match args.get(idx) {
        Some(LispExpr::Number(n)) => Ok(*n),
        Some(other) => Err(format!("expected a number, got {}", other)),
        None => Err(format!("missing argument {}", idx + 1)),
    }
}

// host capabilities so the bridge can be tried out from the prompt
fn register_demo_host(interp: &mut Interpreter) {
    interp.register_host_function("print", |args| {
        let line = args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(" ");
        println!("{}", line);
        Ok(LispExpr::Nil)
    });
    interp.register_host_function("clock", |_| {
        Ok(LispExpr::Number(
            (time::OffsetDateTime::now_utc() - time::OffsetDateTime::UNIX_EPOCH)
            .whole_milliseconds() as f64))
    });
    interp.register_host_module("math", HostModule::new()
        .with_function("sqrt", |args| Ok(LispExpr::Number(number(args, 0)?.sqrt())))
        .with_function("pow", |args| Ok(LispExpr::Number(number(args, 0)?.powf(number(args, 1)?))))
        .with_function("floor", |args| Ok(LispExpr::Number(number(args, 0)?.floor()))));
}

fn main() -> Result<(), String> {
    env_logger::init();
    let options = parse_options()?;
    let mut interp = Interpreter::with_config(options.config);
    register_demo_host(&mut interp);

    if let Some(expr) = options.expr {
        return match interp.eval(&expr) {
            Ok(value) => { println!("{}", value); Ok(()) },
            Err(e) => Err(e.to_string()),
        };
    }

    use rustyline::error::ReadlineError;
    let mut rl = rustyline::DefaultEditor::new().map_err(|e| e.to_string())?;
    loop {
        match rl.readline("~> ") {
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(format!("Readline err: {:?}", e)),
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                match line.trim() {
                    ":reset" => { interp.reset(); continue; },
                    ":env" => { println!("{}", interp.global().names().join(" ")); continue; },
                    _ => (),
                }
                match interp.eval(&line) {
                    Err(e) => println!("{}", e),
                    Ok(value) => println!("{}", value),
                }
            },
        }
    }
}
