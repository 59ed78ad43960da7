//! Traceroute and routing translation
//!
//! Route and SNR lists are paired by index. When the lists differ in length
//! the longer one sets the hop count and missing entries are zero.

use serde::Serialize;

use crate::proto::{self, routing::Variant, RoutingError};

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// One hop of a discovered route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteHop {
    /// Node number
    #[serde(skip_serializing_if = "is_zero")]
    pub route: u32,
    /// SNR in quarter dB
    #[serde(skip_serializing_if = "is_zero")]
    pub snr: i32,
}

/// Traceroute result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Traceroute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Hops towards the destination
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub towards: Vec<RouteHop>,
    /// Hops back from the destination
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub back: Vec<RouteHop>,
}

/// Zip node numbers with SNR readings, zero-filling the shorter list.
pub fn pair_hops(route: &[u32], snr: &[i32]) -> Vec<RouteHop> {
    let len = route.len().max(snr.len());
    (0..len)
        .map(|i| RouteHop {
            route: route.get(i).copied().unwrap_or_default(),
            snr: snr.get(i).copied().unwrap_or_default(),
        })
        .collect()
}

impl From<proto::RouteDiscovery> for Traceroute {
    fn from(discovery: proto::RouteDiscovery) -> Self {
        Self {
            message: None,
            towards: pair_hops(&discovery.route, &discovery.snr_towards),
            back: pair_hops(&discovery.route_back, &discovery.snr_back),
        }
    }
}

/// Routing error reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReason {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// Routing control packet. At most one field is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Routing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_request: Option<Traceroute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_reply: Option<Traceroute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<ErrorReason>,
}

impl From<proto::Routing> for Routing {
    fn from(routing: proto::Routing) -> Self {
        match routing.variant {
            Some(Variant::RouteRequest(discovery)) => Self {
                route_request: Some(discovery.into()),
                ..Default::default()
            },
            Some(Variant::RouteReply(discovery)) => Self {
                route_reply: Some(discovery.into()),
                ..Default::default()
            },
            Some(Variant::ErrorReason(code)) => Self {
                error_reason: Some(ErrorReason {
                    reason: RoutingError::name_of(code),
                }),
                ..Default::default()
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_lengths_pair_positionally() {
        let hops = pair_hops(&[1, 2], &[10, -4]);
        assert_eq!(
            hops,
            vec![RouteHop { route: 1, snr: 10 }, RouteHop { route: 2, snr: -4 }]
        );
    }

    // Zero-fill on mismatch mirrors what gateways have been observed to
    // send; it is not a documented protocol guarantee.
    #[test]
    fn test_mismatched_lengths_zero_fill() {
        let discovery = proto::RouteDiscovery {
            route: vec![0x11111111, 0x22222222],
            snr_towards: vec![24, -8, 12],
            route_back: vec![0x33333333],
            snr_back: vec![],
        };
        let trace = Traceroute::from(discovery.clone());
        assert_eq!(
            trace.towards.len(),
            discovery.route.len().max(discovery.snr_towards.len())
        );
        assert_eq!(
            trace.back.len(),
            discovery.route_back.len().max(discovery.snr_back.len())
        );
        assert_eq!(trace.towards[2], RouteHop { route: 0, snr: 12 });
        assert_eq!(trace.back[0], RouteHop { route: 0x33333333, snr: 0 });

        assert_eq!(
            serde_json::to_value(&trace).unwrap(),
            json!({
                "towards": [
                    {"route": 286331153, "snr": 24},
                    {"route": 572662306, "snr": -8},
                    {"snr": 12}
                ],
                "back": [{"route": 858993459}]
            })
        );
    }

    #[test]
    fn test_empty_traceroute() {
        let trace = Traceroute::from(proto::RouteDiscovery::default());
        assert_eq!(serde_json::to_value(&trace).unwrap(), json!({}));
    }

    #[test]
    fn test_routing_error_reason() {
        let routing = Routing::from(proto::Routing {
            variant: Some(Variant::ErrorReason(RoutingError::NoRoute as i32)),
        });
        assert_eq!(
            serde_json::to_value(&routing).unwrap(),
            json!({"errorReason": {"reason": "NO_ROUTE"}})
        );
    }

    #[test]
    fn test_routing_route_reply() {
        let routing = Routing::from(proto::Routing {
            variant: Some(Variant::RouteReply(proto::RouteDiscovery {
                route: vec![5],
                snr_towards: vec![8],
                ..Default::default()
            })),
        });
        assert_eq!(
            serde_json::to_value(&routing).unwrap(),
            json!({"routeReply": {"towards": [{"route": 5, "snr": 8}]}})
        );
    }

    #[test]
    fn test_routing_without_variant() {
        let routing = Routing::from(proto::Routing::default());
        assert_eq!(serde_json::to_value(&routing).unwrap(), json!({}));
    }
}
