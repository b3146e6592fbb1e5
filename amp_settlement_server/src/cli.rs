use std::{env, env::VarError};

const HELP: &str = include_str!("./cli-help.txt");

/// Non-secret variables that are echoed back by `--help`. The gateway secret key is deliberately absent.
const DISPLAY_ENVS: [&str; 9] = [
    "RUST_LOG",
    "AMP_HOST",
    "AMP_PORT",
    "AMP_DATABASE_URL",
    "AMP_DB_MAX_CONNECTIONS",
    "AMP_DB_BUSY_TIMEOUT_MS",
    "AMP_RUN_MIGRATIONS",
    "AMP_GATEWAY_API_URL",
    "AMP_GATEWAY_TIMEOUT_MS",
];

/// The server has no command-line options. Any argument at all prints the help text and the current configuration.
///
/// Returns true if help was printed, in which case the caller should exit.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{HELP}\n");
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    for name in DISPLAY_ENVS {
        println!("  {name:<35} {:<15}", env_value(name));
    }
    true
}

fn env_value(name: &str) -> String {
    match env::var(name) {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
