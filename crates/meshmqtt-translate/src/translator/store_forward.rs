//! Store-and-forward translation

use serde::Serialize;

use crate::proto::{self, store_and_forward as sf, RequestResponse};

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Store-and-forward packet as published. Zero fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreForward {
    pub rr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Statistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<History>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<Heartbeat>,
    /// Base64 text payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Router statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    #[serde(skip_serializing_if = "is_zero")]
    pub messages_total: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub messages_saved: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub messages_max: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub up_time: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub requests: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub requests_history: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub heartbeat: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub return_max: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub return_window: u32,
}

/// History replay summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct History {
    #[serde(skip_serializing_if = "is_zero")]
    pub history_messages: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub window: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_request: u32,
}

/// Router heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Heartbeat {
    #[serde(skip_serializing_if = "is_zero")]
    pub period: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub secondary: u32,
}

impl From<proto::StoreAndForward> for StoreForward {
    fn from(packet: proto::StoreAndForward) -> Self {
        let mut out = StoreForward {
            rr: RequestResponse::name_of(packet.rr),
            ..Default::default()
        };
        match packet.variant {
            Some(sf::Variant::Stats(s)) => {
                out.stats = Some(Statistics {
                    messages_total: s.messages_total,
                    messages_saved: s.messages_saved,
                    messages_max: s.messages_max,
                    up_time: s.up_time,
                    requests: s.requests,
                    requests_history: s.requests_history,
                    heartbeat: s.heartbeat,
                    return_max: s.return_max,
                    return_window: s.return_window,
                })
            }
            Some(sf::Variant::History(h)) => {
                out.history = Some(History {
                    history_messages: h.history_messages,
                    window: h.window,
                    last_request: h.last_request,
                })
            }
            Some(sf::Variant::Heartbeat(h)) => {
                out.heartbeat = Some(Heartbeat {
                    period: h.period,
                    secondary: h.secondary,
                })
            }
            Some(sf::Variant::Text(text)) if !text.is_empty() => {
                out.text = Some(crate::encoding::to_base64(&text))
            }
            _ => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_heartbeat() {
        let out = StoreForward::from(proto::StoreAndForward {
            rr: RequestResponse::RouterHeartbeat as i32,
            variant: Some(sf::Variant::Heartbeat(sf::Heartbeat {
                period: 900,
                secondary: 0,
            })),
        });
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"rr": "ROUTER_HEARTBEAT", "heartbeat": {"period": 900}})
        );
    }

    #[test]
    fn test_stats_omit_zero() {
        let out = StoreForward::from(proto::StoreAndForward {
            rr: RequestResponse::RouterStats as i32,
            variant: Some(sf::Variant::Stats(sf::Statistics {
                messages_total: 12,
                heartbeat: true,
                ..Default::default()
            })),
        });
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"rr": "ROUTER_STATS", "stats": {"messages_total": 12, "heartbeat": true}})
        );
    }

    #[test]
    fn test_text_is_base64() {
        let out = StoreForward::from(proto::StoreAndForward {
            rr: RequestResponse::RouterTextBroadcast as i32,
            variant: Some(sf::Variant::Text(b"hi".to_vec())),
        });
        assert_eq!(out.text.as_deref(), Some("aGk="));
    }

    #[test]
    fn test_unset_rr_still_named() {
        let out = StoreForward::from(proto::StoreAndForward::default());
        assert_eq!(serde_json::to_value(&out).unwrap(), json!({"rr": "UNSET"}));
    }
}
