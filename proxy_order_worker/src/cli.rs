use std::{env, env::VarError};

/// The worker has no real CLI. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing credentials in the database URL
    const DISPLAY_ENVS: [&str; 7] = [
        "RUST_LOG",
        "OFN_DB_MAX_CONNECTIONS",
        "OFN_RUN_MIGRATIONS",
        "OFN_SYNC_INTERVAL",
        "OFN_SYNC_BATCH_SIZE",
        "OFN_SYNC_DRY_RUN",
        "OFN_SYNC_ONCE",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
