use ember::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn req(parts: &[&str]) -> Vec<Vec<u8>> {
    parts.iter().map(|p| p.as_bytes().to_vec()).collect()
}

fn exec(engine: &Engine, parts: &[&str]) -> String {
    String::from_utf8_lossy(&engine.exec(&req(parts))).into_owned()
}

#[test]
fn times_out_within_the_contract_window() {
    let engine = Engine::new(None);
    let started = Instant::now();
    let reply = exec(&engine, &["BLPOP", "empty", "1"]);
    let elapsed = started.elapsed();
    assert_eq!(reply, "$-1\r\n");
    assert!(elapsed >= Duration::from_secs(1), "returned early: {elapsed:?}");
    assert!(
        elapsed <= Duration::from_millis(1100),
        "returned late: {elapsed:?}"
    );
}

#[test]
fn zero_timeout_is_a_single_scan() {
    let engine = Engine::new(None);
    let started = Instant::now();
    assert_eq!(exec(&engine, &["BLPOP", "empty", "0"]), "$-1\r\n");
    assert!(started.elapsed() < Duration::from_millis(50));
}

#[test]
fn immediate_pop_when_a_list_has_data() {
    let engine = Engine::new(None);
    exec(&engine, &["RPUSH", "b", "vb"]);
    // Keys are scanned in order; the first non-empty one wins.
    assert_eq!(
        exec(&engine, &["BLPOP", "a", "b", "5"]),
        "*2\r\n$1\r\nb\r\n$2\r\nvb\r\n"
    );
}

#[test]
fn wakes_when_a_value_arrives() {
    let engine = Arc::new(Engine::new(None));
    let pusher = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            engine.exec(&req(&["LPUSH", "queue", "job"]));
        })
    };

    let started = Instant::now();
    let reply = exec(&engine, &["BLPOP", "queue", "5"]);
    let elapsed = started.elapsed();
    pusher.join().unwrap();

    assert_eq!(reply, "*2\r\n$5\r\nqueue\r\n$3\r\njob\r\n");
    assert!(elapsed >= Duration::from_millis(150), "woke early: {elapsed:?}");
    // One poll interval of slack past the push.
    assert!(elapsed < Duration::from_millis(500), "woke late: {elapsed:?}");
}

#[test]
fn bad_timeout_is_an_error() {
    let engine = Engine::new(None);
    assert_eq!(
        exec(&engine, &["BLPOP", "k", "-1"]),
        "-ERR invalid timeout argument for 'blpop' command\r\n"
    );
    assert_eq!(
        exec(&engine, &["BLPOP", "k", "soon"]),
        "-ERR invalid timeout argument for 'blpop' command\r\n"
    );
}
