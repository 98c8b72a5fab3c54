use std::sync::mpsc::channel;

use applog::{ConfigCell, Logger, new_logger};

struct AppConfig {
    workers: usize,
}

static APP_CONFIG: ConfigCell<AppConfig> = ConfigCell::new();

fn load_config(logger: &Logger) -> Result<AppConfig, std::num::ParseIntError> {
    let workers = std::env::var("WORKERS").unwrap_or_else(|_| "5".into());
    logger.debugw("reading worker count", [("raw", workers.as_str())]);
    Ok(AppConfig {
        workers: workers.parse()?,
    })
}

// Run with UNSTRUCTURED_LOGS=false for JSON on stdout.
fn main() {
    let logger = new_logger(true).expect("Unable to create logger");
    let main_logger = logger.named("main thread");
    let config = APP_CONFIG.get_or_create(&main_logger, &load_config);
    main_logger.infof(format_args!("starting {} workers", config.workers));

    let (handles, senders): (Vec<_>, Vec<_>) = (0..config.workers)
        .map(|i| {
            let (sender, receiver) = channel::<&'static str>();
            let logger = logger.named(&format!("thread {i}"));
            (
                std::thread::spawn(move || {
                    // every thread sees the same config instance
                    let config = APP_CONFIG.get_or_create(&logger, &load_config);
                    let logger = logger.with([("workers", config.workers)]);
                    for message in receiver {
                        logger.warnw("message received", [("message", message)]);
                    }
                }),
                sender,
            )
        })
        .unzip();
    for sender in senders {
        sender.send("Hello, world!").unwrap();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    main_logger.info("all workers done");
    logger.sync().expect("Unable to flush logs");
}
