//! Basic Chronolog Usage Example
//!
//! This example demonstrates:
//! - Configuring per-prefix levels, paths and record formats
//! - Resolving loggers and writing events with arguments and errors
//! - Reading the records back with a tailer
//! - Reloading and shutting down the registry
//!
//! Run with: cargo run --example basic_usage

use chronolog::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("chronolog=debug,chronolog_file_store=debug")
        .init();

    let temp_dir = tempfile::tempdir()?;

    let config = RegistryConfig::new(temp_dir.path(), "app")
        .with_root_level(Level::Info)
        .with_stack_trace_depth(8)
        .with_logger("app.db", LoggerSettings::default().with_level(Level::Debug))
        .with_logger(
            "audit",
            LoggerSettings::default()
                .with_path("audit")
                .with_format(RecordFormat::Text),
        );
    let registry = LoggerRegistry::new(config.clone())?;

    let http = registry.resolve("app.http")?;
    let db = registry.resolve("app.db.pool")?;
    let audit = registry.resolve("audit.login")?;

    http.debug("filtered out at INFO", vec![])?;
    http.info("listening on {}:{}", vec![Arg::from("0.0.0.0"), Arg::from(8080)])?;
    db.debug("pool size {}", vec![Arg::from(16)])?;
    audit.warn("failed login for {}", vec![Arg::from("mallory")])?;

    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    db.log(
        Level::Error,
        "connect to {} failed",
        vec![Arg::from("db:5432")],
        Some(ThrowableInfo::from_error(&err)),
    )?;

    println!("\nBinary records in {}:", temp_dir.path().join("app").display());
    let reader = FileRecordReader::open(temp_dir.path().join("app"), &config.store)?;
    for event in LogTailer::new(reader, BinaryCodec::new()) {
        let event = event?;
        println!(
            "  {} {} - {}",
            event.level(),
            event.logger_name(),
            chronolog::format_message(event.message(), event.args())
        );
    }

    println!("\nText records in {}:", temp_dir.path().join("audit").display());
    let reader = FileRecordReader::open(temp_dir.path().join("audit"), &config.store)?;
    for event in LogTailer::new(reader, TextCodec::new(config.date_format.clone())?) {
        println!("  {}", event?.message());
    }

    println!("\nRegistry stats: {:?}", registry.stats());
    registry.shutdown()?;
    if let Err(e) = registry.resolve("app.http") {
        println!("After shutdown: {}", e);
    }

    registry.reload()?;
    println!("After reload: {:?}", registry.stats());

    Ok(())
}
