//! Translation corpus
//!
//! Each `message-NN.enc` holds a base64 envelope and `message-NN.json` the
//! document it must translate to. Numbers are compared with a relative
//! tolerance of 0.1% since radio floats pass through f32.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use meshmqtt_translate::{Parser, Payload, Translation};

const TOPIC: &str = "msh/ANZ/2/json/MediumFast/!44be043f";

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> (Vec<u8>, Value) {
    let encoded = std::fs::read_to_string(fixture_path(&format!("{name}.enc"))).unwrap();
    let raw = STANDARD.decode(encoded.trim()).unwrap();
    let expected = std::fs::read(fixture_path(&format!("{name}.json"))).unwrap();
    (raw, serde_json::from_slice(&expected).unwrap())
}

fn floats_close(x: f64, y: f64) -> bool {
    if x == y {
        return true;
    }
    let delta = (x - y).abs();
    let mean = (x + y).abs() / 2.0;
    delta / mean < 0.001
}

/// Compare two documents, returning the path of the first difference.
fn diff(got: &Value, want: &Value, path: &str) -> Option<String> {
    match (got, want) {
        (Value::Number(a), Value::Number(b)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if floats_close(x, y) => None,
                _ => Some(format!("{path}: {a} != {b}")),
            }
        }
        (Value::Object(a), Value::Object(b)) => {
            for key in a.keys().chain(b.keys()) {
                match (a.get(key), b.get(key)) {
                    (Some(x), Some(y)) => {
                        if let Some(d) = diff(x, y, &format!("{path}.{key}")) {
                            return Some(d);
                        }
                    }
                    (Some(_), None) => return Some(format!("{path}.{key}: unexpected key")),
                    (None, Some(_)) => return Some(format!("{path}.{key}: missing key")),
                    (None, None) => {}
                }
            }
            None
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Some(format!("{path}: length {} != {}", a.len(), b.len()));
            }
            a.iter()
                .zip(b)
                .enumerate()
                .find_map(|(i, (x, y))| diff(x, y, &format!("{path}[{i}]")))
        }
        (a, b) if a == b => None,
        (a, b) => Some(format!("{path}: {a} != {b}")),
    }
}

fn translate(raw: &[u8]) -> Value {
    let message = match Parser::new().translate(TOPIC, raw).unwrap() {
        Translation::Message(message) => message,
        other => panic!("expected a message, got {:?}", other),
    };
    let body = message.to_json().unwrap();
    assert_eq!(body.last(), Some(&b'\n'));
    serde_json::from_slice(&body).unwrap()
}

fn check(name: &str) {
    let (raw, expected) = load(name);
    let got = translate(&raw);
    if let Some(d) = diff(&got, &expected, "$") {
        panic!("{name} differs at {d}\n got: {got}\nwant: {expected}");
    }
}

#[test]
fn test_message_01_position() {
    check("message-01");
}

#[test]
fn test_message_02_device_metrics() {
    check("message-02");
}

#[test]
fn test_message_03_nodeinfo() {
    check("message-03");
}

#[test]
fn test_message_04_nodeinfo() {
    check("message-04");
}

#[test]
fn test_message_05_text() {
    check("message-05");
}

#[test]
fn test_message_06_environment_nan() {
    check("message-06");
}

#[test]
fn test_message_07_traceroute_mismatched_lengths() {
    check("message-07");
}

#[test]
fn test_message_08_routing_error() {
    check("message-08");
}

#[test]
fn test_message_09_store_forward_heartbeat() {
    check("message-09");
}

#[test]
fn test_message_10_host_metrics() {
    check("message-10");
}

#[test]
fn test_hops_away_matches_packet_for_every_fixture() {
    for i in 1..=10 {
        let (raw, _) = load(&format!("message-{i:02}"));
        let envelope = Parser::decode_envelope(&raw).unwrap();
        let packet = envelope.packet.unwrap();
        let got = translate(&raw);
        assert_eq!(
            got["hops_away"].as_i64().unwrap(),
            i64::from(packet.hop_start) - i64::from(packet.hop_limit)
        );
    }
}

#[test]
fn test_routing_fixture_request_id_is_fixed32() {
    use meshmqtt_translate::proto::mesh_packet::PayloadVariant;

    let (raw, _) = load("message-08");
    let packet = Parser::decode_envelope(&raw).unwrap().packet.unwrap();
    let Some(PayloadVariant::Decoded(data)) = packet.payload_variant else {
        panic!("expected decoded data");
    };
    assert_eq!(data.request_id, 200000002);
    assert_eq!(packet.id, 200000003);
}

#[test]
fn test_environment_fixture_subtype() {
    let (raw, _) = load("message-06");
    let message = Parser::new()
        .translate(TOPIC, &raw)
        .unwrap()
        .into_message()
        .unwrap();
    assert_eq!(message.from, 2003103871);
    assert_eq!(message.subtype(), Some("EnvironmentMetrics"));
}

#[test]
fn test_stored_message_reads_back() {
    let (raw, _) = load("message-10");
    let message = Parser::new()
        .translate(TOPIC, &raw)
        .unwrap()
        .into_message()
        .unwrap();
    let back = meshmqtt_translate::Message::from_json(&message.to_json().unwrap()).unwrap();
    assert_eq!(back.id, message.id);
    assert_eq!(back.port, "TELEMETRY_APP");
    assert!(matches!(back.payload, Some(Payload::Json(_))));
}

#[test]
fn test_comparator_tolerance() {
    assert!(floats_close(4.173, 4.172999858856201));
    assert!(!floats_close(4.17, 4.2));
    assert!(diff(&serde_json::json!({"a": 1}), &serde_json::json!({"a": 1, "b": 2}), "$").is_some());
}
