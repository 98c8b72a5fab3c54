use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    process::Command,
    sync::{Arc, Mutex, MutexGuard},
};

use applog::{
    Destination, Level, LogBuffer, Logger, OutputMode, PanicSignal, UNSTRUCTURED_LOGS_ENV,
    logger_builder, new_logger,
};
use serde_json::Value;

const STREAMS_CHILD_ENV: &str = "APPLOG_STREAMS_CHILD";

// Held by tests that set UNSTRUCTURED_LOGS and by tests that panic, since the
// default panic hook reads RUST_BACKTRACE.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    // Writer threads read APPLOG_* once, when the first of them starts. Force
    // that read now so no writer thread touches the environment afterwards.
    let logger = logger_builder()
        .with_mode(OutputMode::Structured)
        .with_writer(LogBuffer::new())
        .build()
        .unwrap();
    logger.sync().unwrap();
    guard
}

fn set_mode_env(value: Option<&str>) {
    // SAFETY: callers hold the guard from `env_lock`, which every other test
    // reading the environment in this binary also holds, and writer threads
    // have already loaded their settings.
    unsafe {
        match value {
            Some(value) => std::env::set_var(UNSTRUCTURED_LOGS_ENV, value),
            None => std::env::remove_var(UNSTRUCTURED_LOGS_ENV),
        }
    }
}

type Signals = Arc<Mutex<Vec<PanicSignal>>>;

fn structured(buffer: &LogBuffer, debug: bool) -> (Logger, Signals) {
    let signals = Signals::default();
    let recorded = Arc::clone(&signals);
    let logger = logger_builder()
        .with_mode(OutputMode::Structured)
        .with_debug(debug)
        .with_writer(buffer.clone())
        .with_panic_hook(move |signal| recorded.lock().unwrap().push(signal.clone()))
        .build()
        .unwrap();
    (logger, signals)
}

fn json_lines(logger: &Logger, buffer: &LogBuffer) -> Vec<Value> {
    logger.sync().unwrap();
    buffer
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).expect("Failed to parse JSON log output"))
        .collect()
}

#[test]
fn test_output_mode_from_env() {
    let _lock = env_lock();
    let cases = [
        (None, OutputMode::Unstructured),
        (Some("true"), OutputMode::Unstructured),
        (Some("false"), OutputMode::Structured),
        (Some("garbage"), OutputMode::Unstructured),
    ];
    for (value, expected) in cases {
        set_mode_env(value);
        assert_eq!(OutputMode::from_env(), expected, "UNSTRUCTURED_LOGS={value:?}");
    }
    set_mode_env(None);
}

#[test]
fn test_plain_messages() {
    for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
        let buffer = LogBuffer::new();
        let (logger, _) = structured(&buffer, true);
        let message = format!("{level} message");
        match level {
            Level::Debug => logger.debug(&message),
            Level::Info => logger.info(&message),
            Level::Warn => logger.warn(&message),
            Level::Error => logger.error(&message),
            _ => unreachable!(),
        }
        let lines = json_lines(&logger, &buffer);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], level.as_str());
        assert_eq!(lines[0]["msg"], message.as_str());
        assert!(lines[0].get("logger").is_none());
    }
}

#[test]
fn test_key_value_messages() {
    for level in Level::ALL {
        let buffer = LogBuffer::new();
        let (logger, _) = structured(&buffer, true);
        let fields = [("key", "value")];
        match level {
            Level::Debug => logger.debugw("debug message", fields),
            Level::Info => logger.infow("info message", fields),
            Level::Warn => logger.warnw("warn message", fields),
            Level::Error => logger.errorw("error message", fields),
            Level::DPanic => logger.dpanicw("dpanic message", fields),
            Level::Panic => logger.panicw("panic message", fields),
        }
        let lines = json_lines(&logger, &buffer);
        assert_eq!(lines[0]["level"], level.as_str());
        assert_eq!(lines[0]["msg"], format!("{level} message").as_str());
        assert_eq!(lines[0]["key"], "value");
    }
}

#[test]
fn test_formatted_messages() {
    for level in Level::ALL {
        let buffer = LogBuffer::new();
        let (logger, _) = structured(&buffer, true);
        let (key, value) = ("key", "value");
        match level {
            Level::Debug => logger.debugf(format_args!("debug message {key} and {value}")),
            Level::Info => logger.infof(format_args!("info message {key} and {value}")),
            Level::Warn => logger.warnf(format_args!("warn message {key} and {value}")),
            Level::Error => logger.errorf(format_args!("error message {key} and {value}")),
            Level::DPanic => logger.dpanicf(format_args!("dpanic message {key} and {value}")),
            Level::Panic => logger.panicf(format_args!("panic message {key} and {value}")),
        }
        let lines = json_lines(&logger, &buffer);
        assert_eq!(lines[0]["level"], level.as_str());
        assert_eq!(
            lines[0]["msg"],
            format!("{level} message key and value").as_str()
        );
    }
}

#[test]
fn test_unstructured_output() {
    let buffer = LogBuffer::new();
    let logger = logger_builder()
        .with_mode(OutputMode::Unstructured)
        .with_color(false)
        .with_debug(true)
        .with_writer(buffer.clone())
        .build()
        .unwrap();
    logger.infow("test message", [("key", "value")]);
    logger.debugf(format_args!("debug message {} and {}", "key", "value"));
    logger.warn("careful");
    logger.error("broken");
    logger.sync().unwrap();

    let lines = buffer.lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("INF] test message key=value"), "{}", lines[0]);
    assert!(lines[1].contains("DBG] debug message key and value"));
    assert!(lines[2].contains("WRN] careful"));
    assert!(lines[3].contains("ERR] broken"));
    assert!(serde_json::from_str::<Value>(&lines[0]).is_err());
}

#[test]
fn test_default_destination_follows_mode() {
    let console = logger_builder()
        .with_mode(OutputMode::Unstructured)
        .build()
        .unwrap();
    assert_eq!(console.destination(), Destination::Stderr);
    let json = logger_builder()
        .with_mode(OutputMode::Structured)
        .build()
        .unwrap();
    assert_eq!(json.destination(), Destination::Stdout);
}

#[test]
fn test_console_goes_to_stderr_and_json_to_stdout() {
    if std::env::var_os(STREAMS_CHILD_ENV).is_some() {
        let console = logger_builder()
            .with_mode(OutputMode::Unstructured)
            .with_color(false)
            .build()
            .unwrap();
        console.infow("test message", [("key", "value")]);
        console.sync().unwrap();
        let json = logger_builder()
            .with_mode(OutputMode::Structured)
            .build()
            .unwrap();
        json.info("json message");
        json.sync().unwrap();
        return;
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args([
            "--exact",
            "test_console_goes_to_stderr_and_json_to_stdout",
            "--nocapture",
        ])
        .env(STREAMS_CHILD_ENV, "1")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.contains("INF] test message key=value"), "{stderr}");
    assert!(!stderr.contains("json message"), "{stderr}");
    assert!(!stdout.contains("test message"), "{stdout}");

    let line = stdout
        .lines()
        .find(|line| line.contains("json message"))
        .expect("missing JSON record on stdout");
    // libtest prints the test name without a newline before the child's output.
    let record: Value = serde_json::from_str(&line[line.find('{').unwrap()..]).unwrap();
    assert_eq!(record["level"], "info");
    assert_eq!(record["msg"], "json message");
}

#[test]
fn test_dpanic_in_debug_mode_panics_after_emission() {
    let _lock = env_lock();
    let buffer = LogBuffer::new();
    let logger = logger_builder()
        .with_mode(OutputMode::Structured)
        .with_debug(true)
        .with_writer(buffer.clone())
        .build()
        .unwrap();
    let result = catch_unwind(AssertUnwindSafe(|| logger.dpanic("dpanic message")));
    let payload = result.expect_err("dpanic should panic in debug mode");
    assert_eq!(
        payload.downcast_ref::<String>().map(String::as_str),
        Some("dpanic message")
    );
    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""level":"dpanic""#));
}

#[test]
fn test_dpanic_outside_debug_mode_logs_error() {
    let buffer = LogBuffer::new();
    let (logger, signals) = structured(&buffer, false);
    let result = catch_unwind(AssertUnwindSafe(|| logger.dpanic("dpanic message")));
    assert!(result.is_ok());
    assert!(signals.lock().unwrap().is_empty());
    let lines = json_lines(&logger, &buffer);
    assert_eq!(lines[0]["level"], "error");
    assert_eq!(lines[0]["msg"], "dpanic message");
}

#[test]
fn test_panic_always_panics() {
    let _lock = env_lock();
    for debug in [true, false] {
        let buffer = LogBuffer::new();
        let logger = logger_builder()
            .with_mode(OutputMode::Unstructured)
            .with_color(false)
            .with_debug(debug)
            .with_writer(buffer.clone())
            .build()
            .unwrap();
        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.panicf(format_args!("panic message {}", 42))
        }));
        assert!(result.is_err(), "debug={debug}");
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("PNC] panic message 42"));
    }
}

#[test]
fn test_panic_hook_receives_signal() {
    let buffer = LogBuffer::new();
    let (logger, signals) = structured(&buffer, true);
    logger.panicw("shutting down", [("reason", "fatal")]);
    logger.dpanic("inconsistent state");
    let signals = signals.lock().unwrap();
    assert_eq!(
        *signals,
        [
            PanicSignal {
                level: Level::Panic,
                message: "shutting down".into()
            },
            PanicSignal {
                level: Level::DPanic,
                message: "inconsistent state".into()
            },
        ]
    );
    // Both records were flushed before their hook ran.
    assert_eq!(buffer.lines().len(), 2);
}

#[test]
fn test_minimum_level_filter() {
    let buffer = LogBuffer::new();
    let (logger, _) = structured(&buffer, false);
    assert_eq!(logger.min_level(), Level::Info);
    logger.debug("hidden");
    logger.debugw("hidden", [("key", "value")]);
    logger.info("shown");
    let lines = json_lines(&logger, &buffer);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["msg"], "shown");
}

#[test]
fn test_named_logger() {
    let buffer = LogBuffer::new();
    let (logger, _) = structured(&buffer, true);
    let component = logger.named("test-component");
    component.info("component message");
    logger.info("root message");
    component.named("renamed").info("renamed message");
    let lines = json_lines(&logger, &buffer);
    assert_eq!(lines[0]["logger"], "test-component");
    assert!(lines[1].get("logger").is_none());
    assert_eq!(lines[2]["logger"], "renamed");
    assert_eq!(logger.name(), None);
    assert_eq!(component.name(), Some("test-component"));
}

#[test]
fn test_named_logger_console() {
    let buffer = LogBuffer::new();
    let logger = logger_builder()
        .with_mode(OutputMode::Unstructured)
        .with_color(false)
        .with_writer(buffer.clone())
        .build()
        .unwrap();
    logger.named("worker-1").info("started");
    logger.sync().unwrap();
    assert!(buffer.lines()[0].contains(" worker-1 INF] started"));
}

#[test]
fn test_with_fields_are_attached() {
    let buffer = LogBuffer::new();
    let (logger, _) = structured(&buffer, true);
    let request = logger.with([("request_id", "abc123")]);
    request.infow("handled", [("status", 200)]);
    logger.info("bare");
    let lines = json_lines(&logger, &buffer);
    assert_eq!(lines[0]["request_id"], "abc123");
    assert_eq!(lines[0]["status"], 200);
    assert!(lines[1].get("request_id").is_none());
}

#[test]
fn test_concurrent_logging() {
    let buffer = LogBuffer::new();
    let (logger, _) = structured(&buffer, false);
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let logger = logger.named(&format!("thread-{t}"));
            std::thread::spawn(move || {
                for i in 0..100 {
                    logger.infow("tick", [("i", i)]);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let lines = json_lines(&logger, &buffer);
    assert_eq!(lines.len(), 800);
}

#[test]
fn test_log_file_sink() {
    let path = "/tmp/applog_test_log_file_sink.log";
    std::fs::remove_file(path).ok();
    let logger = logger_builder()
        .with_mode(OutputMode::Structured)
        .with_log_file(path)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(logger.destination(), Destination::File);
    logger.info("written to file");
    logger.sync().unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    let entry: Value = serde_json::from_str(content.trim_end()).unwrap();
    assert_eq!(entry["msg"], "written to file");
}

#[test]
fn test_new_logger_end_to_end() {
    let _lock = env_lock();

    set_mode_env(Some("false"));
    let buffer = LogBuffer::new();
    let logger = logger_builder().with_writer(buffer.clone()).build().unwrap();
    assert_eq!(logger.mode(), OutputMode::Structured);
    logger.info("test message");
    let lines = json_lines(&logger, &buffer);
    assert_eq!(lines[0]["msg"], "test message");
    assert_eq!(new_logger(false).unwrap().destination(), Destination::Stdout);

    set_mode_env(Some("true"));
    let buffer = LogBuffer::new();
    let logger = logger_builder().with_writer(buffer.clone()).build().unwrap();
    assert_eq!(logger.mode(), OutputMode::Unstructured);
    logger.infow("test message", [("key", "value")]);
    logger.sync().unwrap();
    let output = buffer.contents();
    assert!(output.contains("test message"));
    assert!(output.contains("INF"));
    assert_eq!(new_logger(false).unwrap().destination(), Destination::Stderr);

    set_mode_env(None);
}
