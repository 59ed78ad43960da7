//! Telemetry translation
//!
//! A telemetry report carries exactly one metric variant. Each variant maps
//! to a JSON object keyed by its snake_case name; health metrics and empty
//! reports become a placeholder string.

use serde::Serialize;

use crate::float::{opt, SafeFloat};
use crate::proto;
use crate::proto::telemetry::Variant;

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Translated telemetry report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryPayload {
    /// Battery and airtime, with the report time
    Device {
        time: u32,
        device_metrics: DeviceMetrics,
    },
    /// Mesh packet counters
    LocalStats { local_stats: LocalStats },
    /// Power monitor channels
    Power { power_metrics: PowerMetrics },
    /// Linux host statistics
    Host { host_metrics: HostMetrics },
    /// Environment sensors
    Environment {
        environment_metrics: EnvironmentMetrics,
    },
    /// Air quality sensors
    AirQuality {
        air_quality_metrics: AirQualityMetrics,
    },
    /// Variant this gateway does not translate
    Unknown(String),
}

impl TelemetryPayload {
    /// Topic suffix naming the metric kind.
    pub fn subtype(&self) -> Option<&'static str> {
        match self {
            TelemetryPayload::Device { .. } => Some("DeviceMetrics"),
            TelemetryPayload::LocalStats { .. } => Some("LocalStats"),
            TelemetryPayload::Power { .. } => Some("PowerMetrics"),
            TelemetryPayload::Host { .. } => Some("HostMetrics"),
            TelemetryPayload::Environment { .. } => Some("EnvironmentMetrics"),
            TelemetryPayload::AirQuality { .. } => Some("AirQualityMetrics"),
            TelemetryPayload::Unknown(_) => None,
        }
    }
}

impl From<proto::Telemetry> for TelemetryPayload {
    fn from(telemetry: proto::Telemetry) -> Self {
        match telemetry.variant {
            Some(Variant::DeviceMetrics(m)) => TelemetryPayload::Device {
                time: telemetry.time,
                device_metrics: m.into(),
            },
            Some(Variant::LocalStats(m)) => TelemetryPayload::LocalStats {
                local_stats: m.into(),
            },
            Some(Variant::PowerMetrics(m)) => TelemetryPayload::Power {
                power_metrics: m.into(),
            },
            Some(Variant::HostMetrics(m)) => TelemetryPayload::Host {
                host_metrics: m.into(),
            },
            Some(Variant::EnvironmentMetrics(m)) => TelemetryPayload::Environment {
                environment_metrics: m.into(),
            },
            Some(Variant::AirQualityMetrics(m)) => TelemetryPayload::AirQuality {
                air_quality_metrics: m.into(),
            },
            Some(other @ Variant::HealthMetrics(_)) => {
                TelemetryPayload::Unknown(format!("unknown telemetry variant: {}", other.name()))
            }
            None => TelemetryPayload::Unknown("unknown telemetry variant: none".to_string()),
        }
    }
}

/// Battery level and airtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_utilization: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_util_tx: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u32>,
}

impl From<proto::DeviceMetrics> for DeviceMetrics {
    fn from(m: proto::DeviceMetrics) -> Self {
        Self {
            battery_level: m.battery_level,
            voltage: opt(m.voltage),
            channel_utilization: opt(m.channel_utilization),
            air_util_tx: opt(m.air_util_tx),
            uptime_seconds: m.uptime_seconds,
        }
    }
}

/// Local mesh counters. Zero values are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalStats {
    #[serde(skip_serializing_if = "is_zero")]
    pub uptime_seconds: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub channel_utilization: SafeFloat,
    #[serde(skip_serializing_if = "is_zero")]
    pub air_util_tx: SafeFloat,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_packets_tx: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_packets_rx: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_packets_rx_bad: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_online_nodes: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_total_nodes: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_rx_dupe: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_tx_relay: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_tx_relay_canceled: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub heap_total_bytes: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub heap_free_bytes: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub num_tx_dropped: u32,
}

impl From<proto::LocalStats> for LocalStats {
    fn from(m: proto::LocalStats) -> Self {
        Self {
            uptime_seconds: m.uptime_seconds,
            channel_utilization: m.channel_utilization.into(),
            air_util_tx: m.air_util_tx.into(),
            num_packets_tx: m.num_packets_tx,
            num_packets_rx: m.num_packets_rx,
            num_packets_rx_bad: m.num_packets_rx_bad,
            num_online_nodes: m.num_online_nodes,
            num_total_nodes: m.num_total_nodes,
            num_rx_dupe: m.num_rx_dupe,
            num_tx_relay: m.num_tx_relay,
            num_tx_relay_canceled: m.num_tx_relay_canceled,
            heap_total_bytes: m.heap_total_bytes,
            heap_free_bytes: m.heap_free_bytes,
            num_tx_dropped: m.num_tx_dropped,
        }
    }
}

/// Voltage and current per monitor channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PowerMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch1_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch1_current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch2_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch2_current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch3_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch3_current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch4_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch4_current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch5_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch5_current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch6_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch6_current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch7_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch7_current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch8_voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ch8_current: Option<SafeFloat>,
}

impl From<proto::PowerMetrics> for PowerMetrics {
    fn from(m: proto::PowerMetrics) -> Self {
        Self {
            ch1_voltage: opt(m.ch1_voltage),
            ch1_current: opt(m.ch1_current),
            ch2_voltage: opt(m.ch2_voltage),
            ch2_current: opt(m.ch2_current),
            ch3_voltage: opt(m.ch3_voltage),
            ch3_current: opt(m.ch3_current),
            ch4_voltage: opt(m.ch4_voltage),
            ch4_current: opt(m.ch4_current),
            ch5_voltage: opt(m.ch5_voltage),
            ch5_current: opt(m.ch5_current),
            ch6_voltage: opt(m.ch6_voltage),
            ch6_current: opt(m.ch6_current),
            ch7_voltage: opt(m.ch7_voltage),
            ch7_current: opt(m.ch7_current),
            ch8_voltage: opt(m.ch8_voltage),
            ch8_current: opt(m.ch8_current),
        }
    }
}

/// Host system statistics. Zero counters are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostMetrics {
    #[serde(skip_serializing_if = "is_zero")]
    pub uptime_seconds: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub freemem_bytes: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub diskfree1_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diskfree2_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diskfree3_bytes: Option<u64>,
    /// One minute load in 1/100ths
    #[serde(skip_serializing_if = "is_zero")]
    pub load1: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub load5: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub load15: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_string: Option<String>,
}

impl From<proto::HostMetrics> for HostMetrics {
    fn from(m: proto::HostMetrics) -> Self {
        Self {
            uptime_seconds: m.uptime_seconds,
            freemem_bytes: m.freemem_bytes,
            diskfree1_bytes: m.diskfree1_bytes,
            diskfree2_bytes: m.diskfree2_bytes,
            diskfree3_bytes: m.diskfree3_bytes,
            load1: m.load1,
            load5: m.load5,
            load15: m.load15,
            user_string: m.user_string,
        }
    }
}

/// Weather station and environment sensors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnvironmentMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_humidity: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barometric_pressure: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_resistance: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iaq: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lux: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_lux: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir_lux: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_lux: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gust: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_lull: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radiation: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_1h: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rainfall_24h: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_temperature: Option<SafeFloat>,
}

impl From<proto::EnvironmentMetrics> for EnvironmentMetrics {
    fn from(m: proto::EnvironmentMetrics) -> Self {
        Self {
            temperature: opt(m.temperature),
            relative_humidity: opt(m.relative_humidity),
            barometric_pressure: opt(m.barometric_pressure),
            gas_resistance: opt(m.gas_resistance),
            voltage: opt(m.voltage),
            current: opt(m.current),
            iaq: m.iaq,
            distance: opt(m.distance),
            lux: opt(m.lux),
            white_lux: opt(m.white_lux),
            ir_lux: opt(m.ir_lux),
            uv_lux: opt(m.uv_lux),
            wind_direction: m.wind_direction,
            wind_speed: opt(m.wind_speed),
            weight: opt(m.weight),
            wind_gust: opt(m.wind_gust),
            wind_lull: opt(m.wind_lull),
            radiation: opt(m.radiation),
            rainfall_1h: opt(m.rainfall_1h),
            rainfall_24h: opt(m.rainfall_24h),
            soil_moisture: m.soil_moisture,
            soil_temperature: opt(m.soil_temperature),
        }
    }
}

/// Particulate, CO2 and formaldehyde sensors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AirQualityMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10_standard: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25_standard: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm100_standard: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10_environmental: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25_environmental: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm100_environmental: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_03um: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_05um: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_10um: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_25um: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_50um: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_100um: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2_temperature: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2_humidity: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_formaldehyde: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_humidity: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_temperature: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm40_standard: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_40um: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_temperature: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_humidity: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_voc_idx: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm_nox_idx: Option<SafeFloat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_tps: Option<SafeFloat>,
}

impl From<proto::AirQualityMetrics> for AirQualityMetrics {
    fn from(m: proto::AirQualityMetrics) -> Self {
        Self {
            pm10_standard: m.pm10_standard,
            pm25_standard: m.pm25_standard,
            pm100_standard: m.pm100_standard,
            pm10_environmental: m.pm10_environmental,
            pm25_environmental: m.pm25_environmental,
            pm100_environmental: m.pm100_environmental,
            particles_03um: m.particles_03um,
            particles_05um: m.particles_05um,
            particles_10um: m.particles_10um,
            particles_25um: m.particles_25um,
            particles_50um: m.particles_50um,
            particles_100um: m.particles_100um,
            co2: m.co2,
            co2_temperature: opt(m.co2_temperature),
            co2_humidity: opt(m.co2_humidity),
            form_formaldehyde: opt(m.form_formaldehyde),
            form_humidity: opt(m.form_humidity),
            form_temperature: opt(m.form_temperature),
            pm40_standard: m.pm40_standard,
            particles_40um: m.particles_40um,
            pm_temperature: opt(m.pm_temperature),
            pm_humidity: opt(m.pm_humidity),
            pm_voc_idx: opt(m.pm_voc_idx),
            pm_nox_idx: opt(m.pm_nox_idx),
            particles_tps: opt(m.particles_tps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(variant: Option<Variant>) -> proto::Telemetry {
        proto::Telemetry { time: 1762932200, variant }
    }

    #[test]
    fn test_device_metrics_keeps_time() {
        let payload = TelemetryPayload::from(report(Some(Variant::DeviceMetrics(
            proto::DeviceMetrics {
                battery_level: Some(101),
                voltage: Some(4.25),
                uptime_seconds: Some(60),
                ..Default::default()
            },
        ))));
        assert_eq!(payload.subtype(), Some("DeviceMetrics"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "time": 1762932200,
                "device_metrics": {"battery_level": 101, "voltage": 4.25, "uptime_seconds": 60}
            })
        );
    }

    #[test]
    fn test_environment_nan_is_null() {
        let payload = TelemetryPayload::from(report(Some(Variant::EnvironmentMetrics(
            proto::EnvironmentMetrics {
                temperature: Some(21.5),
                lux: Some(f32::NAN),
                ..Default::default()
            },
        ))));
        assert_eq!(payload.subtype(), Some("EnvironmentMetrics"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"environment_metrics": {"temperature": 21.5, "lux": null}})
        );
    }

    #[test]
    fn test_local_stats_omit_zero() {
        let payload = TelemetryPayload::from(report(Some(Variant::LocalStats(proto::LocalStats {
            uptime_seconds: 100,
            num_packets_tx: 5,
            ..Default::default()
        }))));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"local_stats": {"uptime_seconds": 100, "num_packets_tx": 5}})
        );
    }

    #[test]
    fn test_host_metrics() {
        let payload = TelemetryPayload::from(report(Some(Variant::HostMetrics(proto::HostMetrics {
            uptime_seconds: 10,
            diskfree2_bytes: Some(0),
            user_string: Some("gw".into()),
            ..Default::default()
        }))));
        assert_eq!(payload.subtype(), Some("HostMetrics"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"host_metrics": {"uptime_seconds": 10, "diskfree2_bytes": 0, "user_string": "gw"}})
        );
    }

    #[test]
    fn test_power_and_air_quality_subtypes() {
        let power = TelemetryPayload::from(report(Some(Variant::PowerMetrics(
            proto::PowerMetrics {
                ch1_voltage: Some(12.5),
                ..Default::default()
            },
        ))));
        assert_eq!(power.subtype(), Some("PowerMetrics"));
        assert_eq!(
            serde_json::to_value(&power).unwrap(),
            json!({"power_metrics": {"ch1_voltage": 12.5}})
        );

        let air = TelemetryPayload::from(report(Some(Variant::AirQualityMetrics(
            proto::AirQualityMetrics {
                co2: Some(415),
                ..Default::default()
            },
        ))));
        assert_eq!(air.subtype(), Some("AirQualityMetrics"));
        assert_eq!(
            serde_json::to_value(&air).unwrap(),
            json!({"air_quality_metrics": {"co2": 415}})
        );
    }

    #[test]
    fn test_unknown_variants() {
        let health = TelemetryPayload::from(report(Some(Variant::HealthMetrics(
            proto::HealthMetrics::default(),
        ))));
        assert_eq!(
            health,
            TelemetryPayload::Unknown("unknown telemetry variant: HealthMetrics".into())
        );
        assert_eq!(health.subtype(), None);

        let empty = TelemetryPayload::from(report(None));
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!("unknown telemetry variant: none")
        );
    }
}
