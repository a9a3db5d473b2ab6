use ember::*;
use std::io::Write;
use std::path::Path;

fn req(parts: &[&str]) -> Vec<Vec<u8>> {
    parts.iter().map(|p| p.as_bytes().to_vec()).collect()
}

fn exec(engine: &Engine, parts: &[&str]) -> String {
    String::from_utf8_lossy(&engine.exec(&req(parts))).into_owned()
}

fn engine_with_aof(path: &Path) -> Engine {
    let aof = Aof::open(path, FsyncPolicy::Always).expect("open aof");
    Engine::new(Some(aof))
}

fn restarted(path: &Path) -> Engine {
    let engine = Engine::new(None);
    engine.replay(path).expect("replay");
    engine
}

#[test]
fn replay_rebuilds_every_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.aof");

    {
        let engine = engine_with_aof(&path);
        exec(&engine, &["SET", "s", "hello"]);
        exec(&engine, &["HSET", "h", "field", "value"]);
        exec(&engine, &["LPUSH", "L", "1", "2", "3"]);
        exec(&engine, &["RPUSH", "L", "0"]);
        exec(&engine, &["ZADD", "z", "1", "a", "3", "c", "2", "b"]);
        exec(&engine, &["ZREM", "z", "c"]);
        exec(&engine, &["ZUPDATE", "z", "a", "9"]);
        exec(&engine, &["SETBIT", "m", "7", "1"]);
        exec(&engine, &["SETBIT", "m", "16", "1"]);
        exec(&engine, &["BF.ADD", "bloom", "x"]);
        exec(&engine, &["CF.ADD", "cuckoo", "y"]);
    }

    let engine = restarted(&path);
    assert_eq!(exec(&engine, &["GET", "s"]), "$5\r\nhello\r\n");
    assert_eq!(exec(&engine, &["HGET", "h", "field"]), "$5\r\nvalue\r\n");
    assert_eq!(
        exec(&engine, &["LRANGE", "L", "0", "-1"]),
        "*4\r\n$1\r\n3\r\n$1\r\n2\r\n$1\r\n1\r\n$1\r\n0\r\n"
    );
    assert_eq!(
        exec(&engine, &["ZRANGE", "z", "1", "-1"]),
        "*2\r\n$1\r\nb\r\n$1\r\na\r\n"
    );
    assert_eq!(exec(&engine, &["ZRANKTOP", "z", "a"]), ":2\r\n");
    assert_eq!(exec(&engine, &["BITCOUNT", "m"]), ":2\r\n");
    assert_eq!(exec(&engine, &["GETBIT", "m", "7"]), ":1\r\n");
    assert_eq!(exec(&engine, &["BF.EXISTS", "bloom", "x"]), ":1\r\n");
    assert_eq!(exec(&engine, &["BF.EXISTS", "bloom", "z"]), ":0\r\n");
    assert_eq!(exec(&engine, &["CF.CONTAINS", "cuckoo", "y"]), ":1\r\n");
}

#[test]
fn del_and_expire_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.aof");

    {
        let engine = engine_with_aof(&path);
        exec(&engine, &["SET", "keep", "1"]);
        exec(&engine, &["SET", "gone", "2"]);
        exec(&engine, &["LPUSH", "gone", "x"]);
        assert_eq!(exec(&engine, &["DEL", "gone"]), ":2\r\n");
        // A DEL that removed nothing writes no record.
        assert_eq!(exec(&engine, &["DEL", "ghost"]), ":0\r\n");
        assert_eq!(exec(&engine, &["EXPIRE", "keep", "1000"]), ":1\r\n");
        // A refused EXPIRE writes no record either.
        assert_eq!(exec(&engine, &["EXPIRE", "keep", "1", "GT"]), ":0\r\n");
    }

    let engine = restarted(&path);
    assert_eq!(exec(&engine, &["GET", "keep"]), "$1\r\n1\r\n");
    assert_eq!(exec(&engine, &["GET", "gone"]), "$-1\r\n");
    assert_eq!(exec(&engine, &["LLEN", "gone"]), ":0\r\n");
}

#[test]
fn failed_writes_are_not_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.aof");

    {
        let engine = engine_with_aof(&path);
        exec(&engine, &["SET", "k", "v"]);
        // Arity failures never reach the log.
        exec(&engine, &["SET", "lonely"]);
        exec(&engine, &["ZADD", "z", "1"]);
    }

    let mut records = 0;
    aof::replay(&path, |_| records += 1).unwrap();
    assert_eq!(records, 1);
}

#[test]
fn truncated_tail_keeps_clean_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.aof");

    {
        let engine = engine_with_aof(&path);
        exec(&engine, &["SET", "a", "1"]);
        exec(&engine, &["SET", "b", "2"]);
    }
    // Simulate a crash mid-append.
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap();
    file.write_all(b"*3\r\n$3\r\nSET\r\n$1\r\nc").unwrap();
    drop(file);

    let engine = restarted(&path);
    assert_eq!(exec(&engine, &["GET", "a"]), "$1\r\n1\r\n");
    assert_eq!(exec(&engine, &["GET", "b"]), "$1\r\n2\r\n");
    assert_eq!(exec(&engine, &["GET", "c"]), "$-1\r\n");
}

#[test]
fn missing_file_is_an_empty_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nothing.aof");
    let engine = Engine::new(None);
    assert_eq!(engine.replay(&path).unwrap(), 0);
}

#[test]
fn replay_does_not_relog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.aof");

    {
        let engine = engine_with_aof(&path);
        exec(&engine, &["LPUSH", "L", "x"]);
    }
    let size_before = std::fs::metadata(&path).unwrap().len();

    // Replaying through an engine that also owns the log must not grow it.
    {
        let engine = engine_with_aof(&path);
        engine.replay(&path).unwrap();
    }
    assert_eq!(std::fs::metadata(&path).unwrap().len(), size_before);
}
