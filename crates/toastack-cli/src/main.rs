use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use toastack_core::config;
use toastack_core::layout::{compute_layout, LayoutMetrics};
use toastack_core::{StackMode, ToastId};
use toastack_cli::{logging, script};

#[derive(Parser)]
#[command(name = "toastack", about = "toastack - toast stack layout engine")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a timed JSON action script and print the stack after every step
    Run {
        /// Script file, or - for stdin
        #[arg(default_value = "-")]
        script: PathBuf,

        /// Keep firing timers until this time (ms) and print a final snapshot
        #[arg(short, long)]
        until: Option<u64>,

        /// Wait in wall-clock time instead of replaying instantly
        #[arg(long)]
        realtime: bool,
    },

    /// Print the layout of a stack of toasts (debug)
    Layout {
        /// Number of toasts in the stack
        #[arg(short = 'n', long, default_value_t = 3)]
        count: u64,

        /// Lay out the expanded list instead of the collapsed stack
        #[arg(short, long)]
        expanded: bool,

        /// Measured height of a toast, by 1-based insertion index (can be specified multiple times)
        #[arg(long = "height", value_name = "INDEX=HEIGHT")]
        heights: Vec<String>,
    },

    /// Open config file in editor
    Config {
        /// Persist the auto-dismiss setting instead of opening the editor
        #[arg(long, value_name = "BOOL")]
        auto_dismiss: Option<bool>,
    },
}

fn read_script(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| format!("Failed to read stdin: {}", e))?;
        Ok(input)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Run {
            script: path,
            until,
            realtime,
        } => {
            let app_config = config::load_config();
            log::debug!("Config: {:?}", app_config);

            let steps = read_script(&path)
                .and_then(|input| script::parse_script(&input))
                .unwrap_or_else(|e| {
                    eprintln!("{}", e);
                    std::process::exit(1);
                });

            let mut stdout = std::io::stdout().lock();
            let result = if realtime {
                script::run_realtime(&steps, &app_config, until, &mut stdout)
            } else {
                script::run_virtual(&steps, &app_config, until, &mut stdout)
            };
            if let Err(e) = result {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Layout {
            count,
            expanded,
            heights,
        } => {
            let app_config = config::load_config();
            let metrics = LayoutMetrics::from(&app_config.stack);
            let registry = script::height_registry(&heights, app_config.stack.default_height);

            let order: Vec<ToastId> = (1..=count).map(ToastId).collect();
            let mode = if expanded {
                StackMode::Expanded
            } else {
                StackMode::Collapsed
            };
            let layout = compute_layout(&order, mode, &registry, &metrics);

            match serde_json::to_string_pretty(&layout) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize layout: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Config { auto_dismiss } => {
            if let Some(enabled) = auto_dismiss {
                if let Err(e) = config::save_auto_dismiss_enabled(enabled) {
                    eprintln!("Failed to save config: {}", e);
                    std::process::exit(1);
                }
                println!("auto_dismiss.enabled = {}", enabled);
                return;
            }

            let config_path = config::ensure_config_file().unwrap_or_else(|e| {
                eprintln!("Failed to create config file: {}", e);
                std::process::exit(1);
            });

            let editor = config::resolve_editor();

            let status = std::process::Command::new("sh")
                .arg("-c")
                .arg(format!("{} \"{}\"", editor, config_path.display()))
                .status()
                .unwrap_or_else(|e| {
                    eprintln!("Failed to launch editor '{}': {}", editor, e);
                    std::process::exit(1);
                });

            if !status.success() {
                std::process::exit(status.code().unwrap_or(1));
            }
        }
    }
}
