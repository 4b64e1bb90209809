//! Process-wide facade lifecycle.
//!
//! These tests share one global renderer, so each takes the serial lock.

use std::fmt;
use std::panic;
use std::sync::{Mutex, MutexGuard};

use logsugar::aggregate::Constant;
use logsugar::sink::CaptureSink;
use logsugar::{Config, DIVIDER, Inspect, global};

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

fn fresh(sink: &CaptureSink) -> Config {
    global::reset();
    Config::new().aggregation(Constant(0)).sink(sink.clone())
}

fn payloads(sink: &CaptureSink) -> Vec<String> {
    sink.messages()
        .iter()
        .map(|m| m.split_once(DIVIDER).map(|(_, p)| p.to_string()).unwrap_or_default())
        .collect()
}

#[test]
fn first_init_opens_session() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    let rows = payloads(&sink);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains("  Begin Session  "));
    assert!(rows[0].starts_with("\u{2588}"));

    // reconfiguring the live renderer does not open a second session
    global::init(Config::new().sink(sink.clone())).unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn reset_starts_a_new_session() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    global::reset();
    assert!(global::renderer().is_none());
    global::init(Config::new().sink(sink.clone())).unwrap();
    assert_eq!(sink.len(), 2);
}

#[test]
fn invalid_init_keeps_previous_config() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    assert!(global::init(Config::new().max_line_width(0)).is_err());
    global::log(Some("f()"), "still here").unwrap();
    assert_eq!(payloads(&sink).last().map(String::as_str), Some("still here"));
}

#[test]
fn log_macro_captures_site_and_function() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    sink.clear();

    let n = 3;
    logsugar::log!("retrying {n} times").unwrap();
    logsugar::log!(header: "net", "connected").unwrap();

    let rows = sink.rows();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].tag.starts_with(".(global.rs:"));
    assert!(rows[0].message.contains("log_macro_captures_site_and_function() "));
    assert!(rows[0].message.ends_with("retrying 3 times"));
    assert!(rows[1].message.contains(" net \u{1F36C} connected"));
}

#[test]
fn free_functions_track_caller() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    sink.clear();

    global::log(None, "plain").unwrap();
    let rows = sink.rows();
    assert!(rows[0].tag.starts_with(".(global.rs:"));
    assert!(rows[0].message.contains("log() \u{1F36C} plain"));
}

#[test]
fn wtf_macro_frames_message() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    sink.clear();

    logsugar::log_wtf!("cache is {}", "empty").unwrap();
    assert_eq!(
        payloads(&sink),
        vec![
            String::new(),
            "!!!!!!!!!!!!!!!! cache is empty !!!!!!!!!!!!!!!!".to_string(),
            String::new(),
        ]
    );
}

#[test]
fn divider_and_error_helpers() {
    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("load failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    sink.clear();

    global::log_divider(Some("stage"), 1).unwrap();
    let err = Outer(std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml"));
    global::log_error(Some("load()"), &err).unwrap();

    let rows = payloads(&sink);
    assert_eq!(rows.len(), 3);
    assert!(rows[0].contains("\u{25C1} stage \u{25B7}"));
    assert_eq!(rows[1], "load failed");
    assert_eq!(rows[2], "caused by: config.toml");
}

#[test]
fn inspect_returns_value() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    sink.clear();

    let doubled = vec![1, 2, 3].inspect_log("items").unwrap().len() * 2;
    assert_eq!(doubled, 6);
    let word = "abc".inspect_log_with("word", |w| w.to_uppercase()).unwrap();
    assert_eq!(word, "abc");

    let rows = sink.rows();
    assert!(rows[0].message.contains("items \u{1F36C} [1, 2, 3]"));
    assert!(rows[1].message.ends_with("word \u{1F36C} ABC"));
    assert!(rows[0].tag.starts_with(".(global.rs:"));
}

#[test]
fn lazy_default_before_init() {
    let _guard = serial();
    global::reset();
    assert!(global::renderer().is_none());
    let renderer = global::current().unwrap();
    assert_eq!(renderer.config().line_width(), logsugar::DEFAULT_MAX_LINE_WIDTH);
    assert!(global::renderer().is_some());
    global::reset();
}

#[test]
fn panics_are_logged_when_enabled() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink).log_panics(true)).unwrap();
    sink.clear();

    let outcome = panic::catch_unwind(|| panic!("kaboom"));
    assert!(outcome.is_err());

    let rows = payloads(&sink);
    assert!(rows.iter().any(|r| r.contains("FATAL PANIC")));
    assert!(rows.iter().any(|r| r == "kaboom"));
    assert!(rows.iter().any(|r| r.starts_with("panicked at ") && r.contains("global.rs")));
}

#[test]
fn panics_are_quiet_when_disabled() {
    let _guard = serial();
    let sink = CaptureSink::new();
    global::init(fresh(&sink)).unwrap();
    // the hook may already be installed by another test; the live config decides
    global::init(Config::new().log_panics(false).sink(sink.clone())).unwrap();
    sink.clear();

    let outcome = panic::catch_unwind(|| panic!("silent"));
    assert!(outcome.is_err());
    assert!(sink.is_empty());
}
