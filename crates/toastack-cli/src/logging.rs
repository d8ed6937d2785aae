use toastack_core::config;

// Rotate log file if it exceeds 5 MB
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Log to stderr and to XDG_DATA_HOME/toastack/toastack.log.
/// Falls back to stderr only if the log file cannot be opened.
pub fn init(verbose: bool) {
    let log_dir = config::data_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let log_path = log_dir.join("toastack.log");

    if let Ok(meta) = std::fs::metadata(&log_path) {
        if meta.len() > MAX_LOG_SIZE {
            let old_path = log_dir.join("toastack.log.old");
            let _ = std::fs::rename(&log_path, &old_path);
        }
    }

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                humantime::format_rfc3339_seconds(std::time::SystemTime::now()),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    match fern::log_file(&log_path) {
        Ok(file_logger) => dispatch = dispatch.chain(file_logger),
        Err(e) => eprintln!("Failed to open log file {}: {}", log_path.display(), e),
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to initialize logger: {}", e);
    }
}
