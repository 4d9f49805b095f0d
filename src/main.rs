//! fhandle - inspect files through managed handles
//!
//! Small front end over the library: stat, open, touch and sort paths.

use anyhow::{anyhow, Context, Result};
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use std::env;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use fhandle::flags::{access_mode, is_create};
use fhandle::{BehaviorFlags, FileHandleManager, HandleSet};

/// Creation mode used by `touch` when FHANDLE_MODE is unset
const DEFAULT_MODE: u32 = 0o644;

/// CLI command
#[derive(Debug)]
enum Command {
    /// Print the stats snapshot of a path as JSON
    Stat { path: String },
    /// Open a path read-only and report the descriptor
    Open { path: String },
    /// Create a path if missing
    Touch { path: String },
    /// Print paths in handle order
    Sort { paths: Vec<String> },
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"fhandle - inspect files through managed handles

USAGE:
    fhandle stat <path>
    fhandle open <path>
    fhandle touch <path>
    fhandle sort <path>...
    fhandle help

ENVIRONMENT:
    RUST_LOG         Log level (trace, debug, info, warn, error)
    FHANDLE_MODE     Octal creation mode for touch (default 0644)
"#
    );
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Help);
    }

    let path_arg = || {
        args.get(2)
            .cloned()
            .ok_or_else(|| anyhow!("Usage: fhandle {} <path>", args[1]))
    };

    match args[1].as_str() {
        "stat" => Ok(Command::Stat { path: path_arg()? }),
        "open" => Ok(Command::Open { path: path_arg()? }),
        "touch" => Ok(Command::Touch { path: path_arg()? }),
        "sort" => {
            if args.len() < 3 {
                return Err(anyhow!("Usage: fhandle sort <path>..."));
            }
            Ok(Command::Sort {
                paths: args[2..].to_vec(),
            })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

fn creation_mode() -> Result<Mode> {
    let bits = match env::var("FHANDLE_MODE") {
        Ok(s) => u32::from_str_radix(s.trim_start_matches("0o"), 8)
            .with_context(|| format!("FHANDLE_MODE is not an octal mode: {}", s))?,
        Err(_) => DEFAULT_MODE,
    };
    Ok(Mode::from_bits_truncate(bits as _))
}

fn access_name(flags: OFlag) -> &'static str {
    let access = access_mode(flags);
    if access == OFlag::O_WRONLY {
        "write-only"
    } else if access == OFlag::O_RDWR {
        "read-write"
    } else {
        "read-only"
    }
}

/// Turn a count of failed releases into an error
fn check_release_failures(failures: usize) -> Result<()> {
    if failures > 0 {
        warn!(failures = failures, "Some handles failed to close on release");
        return Err(anyhow!("{} handle(s) failed to close", failures));
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    let manager = FileHandleManager::new();

    match command {
        Command::Stat { path } => {
            let handle =
                manager.new_handle(&path, OFlag::O_RDONLY, Mode::empty(), BehaviorFlags::STATS);
            let stats = handle
                .stats()
                .ok_or_else(|| anyhow!("Could not stat {}", path))?;
            println!("{}", serde_json::to_string_pretty(stats)?);
            manager.release(Some(handle))?;
        }
        Command::Open { path } => {
            let mut handle =
                manager.new_handle(&path, OFlag::O_RDONLY, Mode::empty(), BehaviorFlags::empty());
            let fd = manager
                .open(&mut handle)
                .with_context(|| format!("Failed to open {}", path))?;
            let flags = handle.open_flags().unwrap_or(OFlag::O_RDONLY);
            println!("{}: descriptor {} ({})", path, fd, access_name(flags));
            manager.release(Some(handle))?;
        }
        Command::Touch { path } => {
            let flags = OFlag::O_WRONLY | OFlag::O_CREAT;
            let mode = creation_mode()?;
            debug!(path = %path, create = is_create(flags), mode = ?mode, "Touching file");

            let handle = manager.new_handle(&path, flags, mode, BehaviorFlags::AUTO_OPEN);
            if !handle.is_open() {
                return Err(anyhow!("Failed to create {}", path));
            }
            info!(path = %path, "File ready");
            manager.release(Some(handle))?;
        }
        Command::Sort { paths } => {
            let mut set = HandleSet::new();
            for path in &paths {
                let handle =
                    manager.new_handle(path, OFlag::O_RDONLY, Mode::empty(), BehaviorFlags::empty());
                set.insert(handle);
            }
            for name in set.names() {
                println!("{}", name);
            }
            check_release_failures(set.free_all(&manager))?;
        }
        Command::Help => {
            print_help();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_failures_surface() {
        assert!(check_release_failures(0).is_ok());
        let err = check_release_failures(2).unwrap_err();
        assert!(err.to_string().contains("2 handle(s)"));
    }

    #[test]
    fn test_access_name() {
        assert_eq!(access_name(OFlag::O_RDONLY), "read-only");
        assert_eq!(access_name(OFlag::O_RDWR | OFlag::O_CREAT), "read-write");
        assert_eq!(access_name(OFlag::O_WRONLY), "write-only");
    }
}
