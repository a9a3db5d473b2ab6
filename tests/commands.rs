use ember::*;
use std::time::Duration;

fn req(parts: &[&str]) -> Vec<Vec<u8>> {
    parts.iter().map(|p| p.as_bytes().to_vec()).collect()
}

fn exec(engine: &Engine, parts: &[&str]) -> String {
    String::from_utf8_lossy(&engine.exec(&req(parts))).into_owned()
}

#[test]
fn ping_and_handshake() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["PING"]), "+PONG\r\n");
    assert_eq!(exec(&engine, &["ping", "hello"]), "+hello\r\n");
    assert_eq!(exec(&engine, &["COMMAND"]), "+\r\n");
    assert_eq!(exec(&engine, &["RETRY"]), "+\r\n");
    // Unknown commands get the same empty simple string.
    assert_eq!(exec(&engine, &["FLUSHALL"]), "+\r\n");
}

#[test]
fn set_get_del_cycle() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["SET", "a", "1"]), "+OK\r\n");
    assert_eq!(exec(&engine, &["GET", "a"]), "$1\r\n1\r\n");
    assert_eq!(exec(&engine, &["DEL", "a"]), ":1\r\n");
    assert_eq!(exec(&engine, &["GET", "a"]), "$-1\r\n");
    assert_eq!(exec(&engine, &["DEL", "a"]), ":0\r\n");
}

#[test]
fn command_names_are_case_insensitive() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["set", "k", "v"]), "+OK\r\n");
    assert_eq!(exec(&engine, &["GeT", "k"]), "$1\r\nv\r\n");
}

#[test]
fn wrong_arity_is_an_error() {
    let engine = Engine::new(None);
    assert_eq!(
        exec(&engine, &["GET"]),
        "-ERR wrong number of arguments for 'get' command\r\n"
    );
    assert_eq!(
        exec(&engine, &["SET", "k"]),
        "-ERR wrong number of arguments for 'set' command\r\n"
    );
    assert_eq!(
        exec(&engine, &["HSET", "h", "f"]),
        "-ERR wrong number of arguments for 'hset' command\r\n"
    );
}

#[test]
fn set_with_px_expires() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["SET", "k", "v", "PX", "50"]), "+OK\r\n");
    assert_eq!(exec(&engine, &["GET", "k"]), "$1\r\nv\r\n");
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(exec(&engine, &["GET", "k"]), "$-1\r\n");
    // The expired entry is gone, not just hidden.
    assert_eq!(exec(&engine, &["DEL", "k"]), ":0\r\n");
}

#[test]
fn expire_flag_semantics() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["EXPIRE", "missing", "10"]), ":0\r\n");

    exec(&engine, &["SET", "k", "v"]);
    // NX applies only without an existing expiry.
    assert_eq!(exec(&engine, &["EXPIRE", "k", "100", "NX"]), ":1\r\n");
    assert_eq!(exec(&engine, &["EXPIRE", "k", "200", "NX"]), ":0\r\n");
    // XX applies only with one.
    assert_eq!(exec(&engine, &["EXPIRE", "k", "200", "XX"]), ":1\r\n");
    // GT only extends, LT only shortens.
    assert_eq!(exec(&engine, &["EXPIRE", "k", "100", "GT"]), ":0\r\n");
    assert_eq!(exec(&engine, &["EXPIRE", "k", "300", "GT"]), ":1\r\n");
    assert_eq!(exec(&engine, &["EXPIRE", "k", "400", "LT"]), ":0\r\n");
    assert_eq!(exec(&engine, &["EXPIRE", "k", "100", "LT"]), ":1\r\n");

    exec(&engine, &["SET", "fresh", "v"]);
    // GT and LT both apply when no expiry is set at all.
    assert_eq!(exec(&engine, &["EXPIRE", "fresh", "10", "GT"]), ":1\r\n");

    assert_eq!(
        exec(&engine, &["EXPIRE", "k", "10", "BOGUS"]),
        "-ERR invalid flag argument for 'expire' command\r\n"
    );
    assert_eq!(
        exec(&engine, &["EXPIRE", "k", "ten"]),
        "-ERR value is not an integer or out of range\r\n"
    );
}

#[test]
fn hash_commands() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["HSET", "h", "name", "ember"]), "+OK\r\n");
    assert_eq!(exec(&engine, &["HGET", "h", "name"]), "$5\r\nember\r\n");
    assert_eq!(exec(&engine, &["HGET", "h", "nope"]), "$-1\r\n");
    assert_eq!(exec(&engine, &["HGET", "nope", "f"]), "$-1\r\n");
    assert_eq!(
        exec(&engine, &["HGETALL", "h"]),
        "*2\r\n$4\r\nname\r\n$5\r\nember\r\n"
    );
    assert_eq!(exec(&engine, &["HGETALL", "nope"]), "$-1\r\n");

    // Overwrites replace the field value.
    exec(&engine, &["HSET", "h", "name", "coal"]);
    assert_eq!(exec(&engine, &["HGET", "h", "name"]), "$4\r\ncoal\r\n");
}

#[test]
fn lpush_order_and_ranges() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["LPUSH", "L", "1", "2", "3"]), ":3\r\n");
    assert_eq!(
        exec(&engine, &["LRANGE", "L", "0", "-1"]),
        "*3\r\n$1\r\n3\r\n$1\r\n2\r\n$1\r\n1\r\n"
    );
    assert_eq!(exec(&engine, &["LLEN", "L"]), ":3\r\n");
    assert_eq!(exec(&engine, &["RPUSH", "L", "0"]), ":4\r\n");
    assert_eq!(
        exec(&engine, &["LRANGE", "L", "-2", "-1"]),
        "*2\r\n$1\r\n1\r\n$1\r\n0\r\n"
    );
    assert_eq!(exec(&engine, &["LRANGE", "missing", "0", "-1"]), "*0\r\n");
    assert_eq!(exec(&engine, &["LLEN", "missing"]), ":0\r\n");
}

#[test]
fn pops_with_and_without_count() {
    let engine = Engine::new(None);
    exec(&engine, &["RPUSH", "L", "a", "b", "c", "d"]);
    assert_eq!(exec(&engine, &["LPOP", "L"]), "$1\r\na\r\n");
    assert_eq!(exec(&engine, &["RPOP", "L"]), "$1\r\nd\r\n");
    assert_eq!(exec(&engine, &["LPOP", "L", "2"]), "*2\r\n$1\r\nb\r\n$1\r\nc\r\n");
    assert_eq!(exec(&engine, &["LPOP", "L"]), "$-1\r\n");
    assert_eq!(exec(&engine, &["LPOP", "missing"]), "$-1\r\n");
    assert_eq!(
        exec(&engine, &["LPOP", "L", "0"]),
        "-ERR invalid count argument for 'lpop' command\r\n"
    );
    // Asking for more than the list holds pops what is there.
    exec(&engine, &["RPUSH", "M", "x"]);
    assert_eq!(exec(&engine, &["LPOP", "M", "5"]), "$1\r\nx\r\n");
}

#[test]
fn zadd_zrange_and_ranks() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["ZADD", "z", "1", "a", "3", "c", "2", "b"]), ":3\r\n");
    assert_eq!(
        exec(&engine, &["ZRANGE", "z", "1", "3"]),
        "*3\r\n$1\r\na\r\n$1\r\nb\r\n$1\r\nc\r\n"
    );
    assert_eq!(exec(&engine, &["ZRANKTOP", "z", "b"]), ":2\r\n");
    assert_eq!(exec(&engine, &["ZRANKBOTTOM", "z", "b"]), ":2\r\n");
    assert_eq!(exec(&engine, &["ZRANKTOP", "z", "a"]), ":1\r\n");
    assert_eq!(exec(&engine, &["ZRANKBOTTOM", "z", "a"]), ":3\r\n");

    // Re-adding an existing member counts zero and re-orders on new score.
    assert_eq!(exec(&engine, &["ZADD", "z", "10", "a"]), ":0\r\n");
    assert_eq!(
        exec(&engine, &["ZRANGE", "z", "1", "-1"]),
        "*3\r\n$1\r\nb\r\n$1\r\nc\r\n$1\r\na\r\n"
    );

    // Inverted bounds come back reversed.
    assert_eq!(
        exec(&engine, &["ZRANGE", "z", "-1", "1"]),
        "*3\r\n$1\r\na\r\n$1\r\nc\r\n$1\r\nb\r\n"
    );
    assert_eq!(exec(&engine, &["ZRANGE", "missing", "0", "-1"]), "*0\r\n");
}

#[test]
fn zrem_zupdate_ztopk() {
    let engine = Engine::new(None);
    exec(&engine, &["ZADD", "z", "1", "a", "2", "b", "3", "c"]);
    assert_eq!(exec(&engine, &["ZREM", "z", "a", "ghost"]), ":1\r\n");
    assert_eq!(exec(&engine, &["ZREM", "missing", "a"]), ":0\r\n");

    assert_eq!(exec(&engine, &["ZUPDATE", "z", "b", "9"]), "+OK\r\n");
    assert_eq!(
        exec(&engine, &["ZRANGE", "z", "1", "-1"]),
        "*2\r\n$1\r\nc\r\n$1\r\nb\r\n"
    );
    assert_eq!(
        exec(&engine, &["ZUPDATE", "z", "ghost", "1"]),
        "-ERR member does not exist in sorted set\r\n"
    );
    assert_eq!(
        exec(&engine, &["ZUPDATE", "missing", "a", "1"]),
        "-ERR sorted set does not exist\r\n"
    );
    assert_eq!(
        exec(&engine, &["ZRANKTOP", "missing", "a"]),
        "-ERR sorted set does not exist\r\n"
    );
    assert_eq!(
        exec(&engine, &["ZADD", "z", "one", "a"]),
        "-ERR invalid score value for 'zadd' command\r\n"
    );

    assert_eq!(
        exec(&engine, &["ZTOPK", "z", "1"]),
        "*1\r\n$1\r\nc\r\n"
    );
    assert_eq!(exec(&engine, &["ZTOPK", "missing", "3"]), "*0\r\n");
    assert_eq!(
        exec(&engine, &["ZTOPK", "z", "0"]),
        "-ERR invalid value for K\r\n"
    );
}

#[test]
fn bitmap_scenario() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["SETBIT", "m", "7", "1"]), ":1\r\n");
    assert_eq!(exec(&engine, &["SETBIT", "m", "16", "1"]), ":1\r\n");
    assert_eq!(exec(&engine, &["BITCOUNT", "m"]), ":2\r\n");
    assert_eq!(exec(&engine, &["GETBIT", "m", "7"]), ":1\r\n");
    assert_eq!(exec(&engine, &["GETBIT", "m", "10"]), ":0\r\n");
    // Clearing reports 1 as well; only the count shows the change.
    assert_eq!(exec(&engine, &["SETBIT", "m", "7", "0"]), ":1\r\n");
    assert_eq!(exec(&engine, &["BITCOUNT", "m"]), ":1\r\n");

    assert_eq!(exec(&engine, &["GETBIT", "missing", "3"]), ":0\r\n");
    assert_eq!(exec(&engine, &["BITCOUNT", "missing"]), ":0\r\n");
    assert_eq!(
        exec(&engine, &["SETBIT", "m", "4294967297", "1"]),
        "-ERR position exceeds maximum allowed value\r\n"
    );
    assert_eq!(
        exec(&engine, &["SETBIT", "m", "3", "2"]),
        "-ERR invalid value argument for 'setbit' command\r\n"
    );
    assert_eq!(
        exec(&engine, &["GETBIT", "m", "minus"]),
        "-ERR invalid position argument for 'getbit' command\r\n"
    );
}

#[test]
fn bloom_filter_scenario() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["BF.RESERVE", "b", "1000"]), "+OK\r\n");
    assert_eq!(exec(&engine, &["BF.ADD", "b", "x"]), ":1\r\n");
    assert_eq!(exec(&engine, &["BF.ADD", "b", "x"]), ":0\r\n");
    assert_eq!(exec(&engine, &["BF.EXISTS", "b", "x"]), ":1\r\n");
    assert_eq!(exec(&engine, &["BF.EXISTS", "b", "y"]), ":0\r\n");
    assert_eq!(
        exec(&engine, &["BF.RESERVE", "b", "1000"]),
        "-ERR key already exists\r\n"
    );
    assert_eq!(
        exec(&engine, &["BF.RESERVE", "c", "many"]),
        "-ERR capacity must be an integer\r\n"
    );
    // Adds on a missing key auto-create with the default capacity.
    assert_eq!(exec(&engine, &["BF.ADD", "auto", "item"]), ":1\r\n");
    assert_eq!(exec(&engine, &["BF.EXISTS", "missing", "x"]), ":0\r\n");
}

#[test]
fn bloom_vector_forms() {
    let engine = Engine::new(None);
    assert_eq!(
        exec(&engine, &["BF.MADD", "b", "x", "y", "x"]),
        "*3\r\n:1\r\n:1\r\n:0\r\n"
    );
    assert_eq!(
        exec(&engine, &["BF.MEXISTS", "b", "x", "z"]),
        "*2\r\n:1\r\n:0\r\n"
    );
    assert_eq!(
        exec(&engine, &["BF.MEXISTS", "missing", "x", "y"]),
        "*2\r\n:0\r\n:0\r\n"
    );
}

#[test]
fn bloom_insert_options() {
    let engine = Engine::new(None);
    assert_eq!(
        exec(&engine, &["BF.INSERT", "b", "CAPACITY", "500", "ITEMS", "x", "y"]),
        "*2\r\n:1\r\n:1\r\n"
    );
    assert_eq!(
        exec(&engine, &["BF.INSERT", "b", "ITEMS", "x"]),
        "*1\r\n:0\r\n"
    );
    // Lenient paths all produce an empty array.
    assert_eq!(exec(&engine, &["BF.INSERT", "ghost", "NOCREATE", "ITEMS", "x"]), "*0\r\n");
    assert_eq!(exec(&engine, &["BF.INSERT", "b", "BOGUS", "ITEMS", "x"]), "*0\r\n");
    assert_eq!(exec(&engine, &["BF.INSERT", "b", "x", "y"]), "*0\r\n");
    assert_eq!(
        exec(&engine, &["BF.INSERT", "b", "CAPACITY", "huge", "ITEMS", "x"]),
        "-ERR capacity must be an integer\r\n"
    );
}

#[test]
fn cuckoo_filter_scenario() {
    let engine = Engine::new(None);
    assert_eq!(
        exec(
            &engine,
            &["CF.RESERVE", "cf", "1000", "BUCKETSIZE", "4", "MAXITERATIONS", "500"]
        ),
        "+OK\r\n"
    );

    let items: Vec<String> = (0..400).map(|i| format!("item{i}")).collect();
    for item in &items {
        assert_eq!(exec(&engine, &["CF.ADD", "cf", item]), ":1\r\n");
    }
    for item in &items {
        assert_eq!(exec(&engine, &["CF.CONTAINS", "cf", item]), ":1\r\n");
    }
    for item in items.iter().take(100) {
        assert_eq!(exec(&engine, &["CF.REMOVE", "cf", item]), ":1\r\n");
        assert_eq!(exec(&engine, &["CF.CONTAINS", "cf", item]), ":0\r\n");
    }

    assert_eq!(
        exec(&engine, &["CF.RESERVE", "cf", "1000"]),
        "-ERR key already exists\r\n"
    );
    assert_eq!(exec(&engine, &["CF.CONTAINS", "missing", "x"]), ":0\r\n");
    assert_eq!(
        exec(&engine, &["CF.REMOVE", "missing", "x"]),
        "-ERR filter does not exist\r\n"
    );
}

#[test]
fn cuckoo_create_and_full() {
    let engine = Engine::new(None);
    assert_eq!(exec(&engine, &["CF.CREATE", "cf"]), "+OK\r\n");
    assert_eq!(
        exec(&engine, &["CF.CREATE", "cf"]),
        "-ERR key already exists\r\n"
    );
    // Adds auto-create missing filters with the default configuration.
    assert_eq!(exec(&engine, &["CF.ADD", "auto", "x"]), ":1\r\n");
    assert_eq!(exec(&engine, &["CF.CONTAINS", "auto", "x"]), ":1\r\n");

    // A tiny filter fills up and refuses further items.
    exec(&engine, &["CF.RESERVE", "tiny", "2", "BUCKETSIZE", "2"]);
    assert_eq!(exec(&engine, &["CF.ADD", "tiny", "a"]), ":1\r\n");
    assert_eq!(exec(&engine, &["CF.ADD", "tiny", "b"]), ":1\r\n");
    assert_eq!(
        exec(&engine, &["CF.ADD", "tiny", "c"]),
        "-ERR filter is full\r\n"
    );
}

#[test]
fn del_counts_once_per_store() {
    let engine = Engine::new(None);
    exec(&engine, &["SET", "k", "v"]);
    exec(&engine, &["LPUSH", "k", "x"]);
    exec(&engine, &["SETBIT", "k", "0", "1"]);
    // One key in three stores counts three.
    assert_eq!(exec(&engine, &["DEL", "k"]), ":3\r\n");
    assert_eq!(exec(&engine, &["GET", "k"]), "$-1\r\n");
    assert_eq!(exec(&engine, &["LLEN", "k"]), ":0\r\n");
    assert_eq!(exec(&engine, &["BITCOUNT", "k"]), ":0\r\n");

    exec(&engine, &["HSET", "h", "f", "v"]);
    exec(&engine, &["ZADD", "z", "1", "a"]);
    assert_eq!(exec(&engine, &["DEL", "h", "z", "ghost"]), ":2\r\n");
}
