use cfg_if::cfg_if;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Used when RUST_LOG is unset; keeps wgpu's internals quiet
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub fn init() {
            // Log to browser console via tracing-wasm
            let wasm_layer = tracing_wasm::WASMLayer::new(tracing_wasm::WASMLayerConfig::default());

            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(wasm_layer)
                .try_init();

            // Panics with stacktrace
            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();
        }
    } else {
        use std::env;
        use std::io;
        use std::path::Path;

        use once_cell::sync::OnceCell;
        use tracing_appender::non_blocking::WorkerGuard;
        use tracing_subscriber::fmt;

        const DEFAULT_LOG_FILE: &str = "logs/kicia.log";

        static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

        /// Log file from RUST_LOG_FILE; an empty value turns file logging off
        fn log_file_path() -> Option<String> {
            let path = env::var("RUST_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
            (!path.trim().is_empty()).then_some(path)
        }

        pub fn init() {
            // Console (stderr) layer with file/line
            let console_layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .compact();

            // Daily-rolling file layer
            let file_layer = log_file_path().map(|log_path| {
                let path = Path::new(&log_path);
                let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
                let file_name = path.file_name().map(|f| f.to_owned()).unwrap_or_else(|| "kicia.log".into());
                let (nb_writer, guard) =
                    tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
                let _ = FILE_GUARD.set(guard);

                fmt::layer()
                    .with_writer(nb_writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .compact()
            });

            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer)
                .with(file_layer)
                .try_init();

            // Hook panics to log with backtrace
            std::panic::set_hook(Box::new(|info| {
                let mut msg = String::new();
                if let Some(loc) = info.location() {
                    msg.push_str(&format!("panic at {}:{}:{} ", loc.file(), loc.line(), loc.column()));
                }
                if let Some(s) = info.payload().downcast_ref::<&str>() { msg.push_str(s); }
                else if let Some(s) = info.payload().downcast_ref::<String>() { msg.push_str(s); }
                else { msg.push_str("<non-string panic>"); }
                let bt = std::backtrace::Backtrace::force_capture();
                tracing::error!("{}\nBacktrace:\n{:?}", msg, bt);
            }));
        }

        #[cfg(test)]
        mod tests {
            use super::*;

            #[test]
            fn default_filter_parses() {
                assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
            }

            #[test]
            fn empty_log_file_disables_file_layer() {
                // the only test that touches RUST_LOG_FILE
                env::set_var("RUST_LOG_FILE", "");
                assert_eq!(log_file_path(), None);
                env::set_var("RUST_LOG_FILE", "out/viewer.log");
                assert_eq!(log_file_path().as_deref(), Some("out/viewer.log"));
                env::remove_var("RUST_LOG_FILE");
                assert_eq!(log_file_path().as_deref(), Some(DEFAULT_LOG_FILE));
            }
        }
    }
}
