use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use weft::bytecode::Checksum;
use weft::{CacheOptions, Engine, EngineOptions, Runtime, Value};

fn cached_engine(dir: &TempDir) -> Engine {
    Engine::new(EngineOptions {
        cache: CacheOptions {
            enabled: true,
            directory: Some(dir.path().to_path_buf()),
        },
        ..Default::default()
    })
}

fn value(engine: &Engine, source: &str) -> Value {
    let program = engine.compile(source).unwrap();
    let (runtime, _) = Runtime::captured(engine.options().execution.clone());
    program.run(&runtime).unwrap()
}

#[test]
fn compiled_bytecode_is_stored() {
    let dir = TempDir::new().unwrap();
    let engine = cached_engine(&dir);
    let source = "x = 20\nx * 2";

    assert_eq!(value(&engine, source), Value::Int(40));

    let cache = engine.cache().unwrap();
    let path = cache.path_for(Checksum::of_source(source));
    assert!(path.exists());

    let stored = cache.load(Checksum::of_source(source)).unwrap().unwrap();
    let fresh = engine.compile(source).unwrap();
    assert_eq!(stored.instructions, fresh.bytecode().instructions);
    assert_eq!(stored.constants, fresh.bytecode().constants);
}

#[test]
fn cache_hit_skips_compilation() {
    let dir = TempDir::new().unwrap();
    let engine = cached_engine(&dir);

    // File the bytecode of one program under the checksum of another.
    let other = engine.compile("40 + 2").unwrap();
    let planted = other
        .bytecode()
        .clone()
        .with_checksum(Checksum::of_source("1 + 2"));
    engine.cache().unwrap().store(&planted).unwrap();

    assert_eq!(value(&engine, "1 + 2"), Value::Int(42));
}

#[test]
fn host_registrations_bypass_the_cache() {
    let dir = TempDir::new().unwrap();
    let mut engine = cached_engine(&dir);
    engine.register("base", 10i64).unwrap();

    let source = "base + 1";
    assert_eq!(value(&engine, source), Value::Int(11));
    assert!(!engine.cache().unwrap().path_for(Checksum::of_source(source)).exists());
}

#[test]
fn corrupt_entry_is_recompiled() {
    let dir = TempDir::new().unwrap();
    let engine = cached_engine(&dir);
    let source = "3 * 3";
    let path = engine.cache().unwrap().path_for(Checksum::of_source(source));
    fs::write(&path, b"not bytecode").unwrap();

    assert_eq!(value(&engine, source), Value::Int(9));
    assert!(
        engine
            .cache()
            .unwrap()
            .load(Checksum::of_source(source))
            .unwrap()
            .is_some()
    );
}

#[test]
fn disabled_cache_is_not_opened() {
    let engine = Engine::new(EngineOptions::default());
    assert!(engine.cache().is_none());
}
