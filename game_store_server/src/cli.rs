use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (GSS_JWT_SECRET, GSS_SIMULATOR_SECRET, GSS_STRIPE_SECRET_KEY, GSS_STRIPE_WEBHOOK_SECRET) are never printed
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "GSS_HOST",
        "GSS_PORT",
        "GSS_DATABASE_URL",
        "GSS_DB_MAX_CONNECTIONS",
        "GSS_PAYMENT_PROVIDER",
        "GSS_DEFAULT_CURRENCY",
        "GSS_SIMULATOR_KEY_ID",
        "GSS_STRIPE_PUBLISHABLE_KEY",
        "GSS_STRIPE_API_URL",
        "GSS_WEBHOOK_TOLERANCE_SECS",
        "GSS_WEBHOOK_SIGNATURE_HEADER",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
