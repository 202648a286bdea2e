//! Concurrency tests for logger resolution and shared writers

use chronolog::prelude::*;
use chronolog::MemoryStoreOpener;
use std::path::Path;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

fn registry_with(opener: &Arc<MemoryStoreOpener>, config: RegistryConfig) -> Arc<LoggerRegistry> {
    let opener: Arc<dyn StoreOpener> = opener.clone();
    Arc::new(LoggerRegistry::with_source(config, opener).unwrap())
}

/// Racing first resolutions of one name all get the same logger
#[test]
fn test_racing_resolution_returns_one_logger() {
    let opener = Arc::new(MemoryStoreOpener::new().with_open_delay(Duration::from_millis(20)));
    let registry = registry_with(&opener, RegistryConfig::new("/logs", "root"));

    let num_threads = 16;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.resolve("svc.worker").unwrap()
            })
        })
        .collect();

    let loggers: Vec<Arc<Logger>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for logger in &loggers[1..] {
        assert!(Arc::ptr_eq(&loggers[0], logger));
    }
    assert_eq!(opener.open_count(Path::new("/logs/root")), 1);
}

/// Distinct names sharing a path open that path exactly once
#[test]
fn test_one_open_per_distinct_path() {
    let opener = Arc::new(MemoryStoreOpener::new().with_open_delay(Duration::from_millis(5)));
    let config = RegistryConfig::new("/logs", "root")
        .with_logger("db", LoggerSettings::default().with_path("db"))
        .with_logger("http", LoggerSettings::default().with_path("http"));
    let registry = registry_with(&opener, config);

    let names = ["db", "db.pool", "db.query", "http", "http.router", "misc", "misc.a"];
    let barrier = Arc::new(Barrier::new(names.len() * 4));

    let handles: Vec<_> = (0..4)
        .flat_map(move |_| names)
        .map(|name| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.resolve(name).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for path in ["/logs/db", "/logs/http", "/logs/root"] {
        assert_eq!(opener.open_count(Path::new(path)), 1, "{}", path);
    }
    assert_eq!(opener.total_opens(), 3);
    assert_eq!(registry.stats().loggers, names.len());
    assert_eq!(registry.stats().writers, 3);
}

/// Every record from many threads lands intact, each thread's in call order
#[test]
fn test_shared_writer_serializes_appends() {
    let opener = Arc::new(MemoryStoreOpener::new());
    let registry = registry_with(&opener, RegistryConfig::new("/logs", "root"));

    let num_threads = 8;
    let per_thread = 200;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let logger = registry.resolve(&format!("thread.{}", t)).unwrap();
                barrier.wait();
                for i in 0..per_thread {
                    logger
                        .info("{} {}", vec![Arg::from(t as i64), Arg::from(i as i64)])
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = opener.store(Path::new("/logs/root")).unwrap();
    let events: Vec<LogEvent> = LogTailer::new(store, BinaryCodec::new())
        .map(|e| e.unwrap())
        .collect();
    assert_eq!(events.len(), num_threads * per_thread);

    let mut next = vec![0i64; num_threads];
    for event in &events {
        let (t, i) = match event.args() {
            [Arg::Int(t), Arg::Int(i)] => (*t as usize, *i),
            other => panic!("unexpected args {:?}", other),
        };
        assert_eq!(event.logger_name(), format!("thread.{}", t));
        assert_eq!(i, next[t]);
        next[t] += 1;
    }
}

/// A failed append leaves earlier records readable and later appends working
#[test]
fn test_failed_append_does_not_corrupt_store() {
    let opener = Arc::new(MemoryStoreOpener::new());
    let registry = registry_with(&opener, RegistryConfig::new("/logs", "root"));
    let logger = registry.resolve("app").unwrap();

    logger.info("before", vec![]).unwrap();
    let store = opener.store(Path::new("/logs/root")).unwrap();

    store.set_rejecting(true);
    let err = logger.info("during", vec![]).unwrap_err();
    assert!(matches!(err, ChronologError::Write(_)));
    store.set_rejecting(false);

    logger.info("after", vec![]).unwrap();

    let messages: Vec<String> = LogTailer::new(store, BinaryCodec::new())
        .map(|e| e.unwrap().message().to_string())
        .collect();
    assert_eq!(messages, vec!["before", "after"]);
}

/// Loggers in use while the registry shuts down fail cleanly
#[test]
fn test_shutdown_while_logging() {
    let opener = Arc::new(MemoryStoreOpener::new());
    let registry = registry_with(&opener, RegistryConfig::new("/logs", "root"));
    let barrier = Arc::new(Barrier::new(5));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = registry.resolve(&format!("w{}", t)).unwrap();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut written = 0u64;
                loop {
                    match logger.info("tick", vec![]) {
                        Ok(()) => written += 1,
                        Err(e) => {
                            assert!(e.is_closed(), "unexpected error {}", e);
                            return written;
                        }
                    }
                }
            })
        })
        .collect();

    barrier.wait();
    thread::sleep(Duration::from_millis(10));
    registry.shutdown().unwrap();

    let written: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let store = opener.store(Path::new("/logs/root")).unwrap();
    assert_eq!(store.len().unwrap(), written);
    assert!(registry.resolve("w0").unwrap_err().is_closed());
}
