use std::collections::HashMap;
use std::env;
use std::process;

use tracing_subscriber::EnvFilter;

use xchelper::cli::{args, Dispatcher, Request, Response};
use xchelper::config;
use xchelper::toolchain::SystemToolchain;
use xchelper::ui;
use xchelper::Result;

fn main() {
    init_tracing();

    if let Err(e) = run() {
        ui::display_error(&e.to_string());
        process::exit(e.exit_code());
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let env: HashMap<String, String> = env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();
    let cwd = env::current_dir()?;

    let config_path = config::find_config(&env, &cwd);
    let config = config::load_config(config_path.as_deref())?;
    let toolchain = SystemToolchain::new(&config);

    let request = Request {
        args: args::utf8_args(env::args_os().skip(1))?,
        env,
        cwd,
    };

    match Dispatcher::new(&toolchain, &config).dispatch(&request)? {
        Response::Help(text) | Response::Version(text) => println!("{}", text),
        Response::Completed { command, outcome } => {
            for warning in &outcome.warnings {
                ui::display_boundary_warning(warning);
            }
            match outcome.output {
                Some(line) => println!("{}", line),
                None => ui::display_success(&format!("{} finished", command)),
            }
        }
    }

    Ok(())
}
