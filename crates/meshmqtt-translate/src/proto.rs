//! Meshtastic wire schema
//!
//! Hand-declared prost messages for the subset of the Meshtastic protobufs
//! that the gateway translates. Field tags follow `mqtt.proto`, `mesh.proto`,
//! `telemetry.proto`, `portnums.proto` and `storeforward.proto`; fields the
//! translators never read are left out and skipped by the decoder.

/// Declares a protobuf enumeration together with its canonical names.
///
/// Variant names in Rust follow the prost convention while `as_str_name`
/// returns the upper-snake identifier used on the wire and in JSON output.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant = $value,
            )+
        }

        impl $name {
            /// Canonical protobuf name of this value.
            pub fn as_str_name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Parse a canonical protobuf name.
            pub fn from_str_name(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Name for a raw wire value; unknown values render as their number.
            pub fn name_of(value: i32) -> String {
                match $name::try_from(value) {
                    Ok(known) => known.as_str_name().to_string(),
                    Err(_) => value.to_string(),
                }
            }
        }
    };
}

// ============================================================================
// Envelope and packet
// ============================================================================

/// Outer wrapper published by Meshtastic gateways on `msh/.../e/...` topics.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServiceEnvelope {
    /// The mesh packet, absent for gateway status chatter
    #[prost(message, optional, tag = "1")]
    pub packet: Option<MeshPacket>,
    /// Channel name the gateway heard the packet on
    #[prost(string, tag = "2")]
    pub channel_id: String,
    /// Gateway node id in `!xxxxxxxx` form
    #[prost(string, tag = "3")]
    pub gateway_id: String,
}

/// One mesh transmission.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeshPacket {
    /// Sending node
    #[prost(fixed32, tag = "1")]
    pub from: u32,
    /// Destination node (`0xFFFFFFFF` for broadcast)
    #[prost(fixed32, tag = "2")]
    pub to: u32,
    /// Channel index
    #[prost(uint32, tag = "3")]
    pub channel: u32,
    /// Packet identifier
    #[prost(fixed32, tag = "6")]
    pub id: u32,
    /// Receive time, seconds since the epoch
    #[prost(fixed32, tag = "7")]
    pub rx_time: u32,
    /// Receive signal to noise ratio
    #[prost(float, tag = "8")]
    pub rx_snr: f32,
    /// Remaining hops
    #[prost(uint32, tag = "9")]
    pub hop_limit: u32,
    /// Sender requested an acknowledgment
    #[prost(bool, tag = "10")]
    pub want_ack: bool,
    /// Receive signal strength
    #[prost(int32, tag = "12")]
    pub rx_rssi: i32,
    /// Packet reached the gateway over MQTT
    #[prost(bool, tag = "14")]
    pub via_mqtt: bool,
    /// Hop limit the packet started with
    #[prost(uint32, tag = "15")]
    pub hop_start: u32,
    /// Clear or encrypted payload
    #[prost(oneof = "mesh_packet::PayloadVariant", tags = "4, 5")]
    pub payload_variant: Option<mesh_packet::PayloadVariant>,
}

/// Nested types for [`MeshPacket`].
pub mod mesh_packet {
    /// Payload carried by a packet.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Cleartext application data
        #[prost(message, tag = "4")]
        Decoded(super::Data),
        /// Ciphertext the gateway could not decrypt
        #[prost(bytes = "vec", tag = "5")]
        Encrypted(Vec<u8>),
    }
}

impl MeshPacket {
    /// Cleartext data, if the packet is not encrypted.
    pub fn decoded(&self) -> Option<&Data> {
        match &self.payload_variant {
            Some(mesh_packet::PayloadVariant::Decoded(data)) => Some(data),
            _ => None,
        }
    }

    /// True when the packet carries ciphertext.
    pub fn is_encrypted(&self) -> bool {
        matches!(
            self.payload_variant,
            Some(mesh_packet::PayloadVariant::Encrypted(_))
        )
    }
}

/// Cleartext application payload.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Data {
    /// Application port, the dispatch key for translation
    #[prost(enumeration = "PortNum", tag = "1")]
    pub portnum: i32,
    /// Application bytes
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
    /// Sender wants a reply
    #[prost(bool, tag = "3")]
    pub want_response: bool,
    /// Final destination for multi-hop routing
    #[prost(fixed32, tag = "4")]
    pub dest: u32,
    /// Original source for multi-hop routing
    #[prost(fixed32, tag = "5")]
    pub source: u32,
    /// Packet this one answers
    #[prost(fixed32, tag = "6")]
    pub request_id: u32,
    /// Packet this one replies to
    #[prost(fixed32, tag = "7")]
    pub reply_id: u32,
    /// Emoji reaction marker
    #[prost(fixed32, tag = "8")]
    pub emoji: u32,
    /// Feature bitfield
    #[prost(uint32, optional, tag = "9")]
    pub bitfield: Option<u32>,
}

named_enum! {
    /// Application port numbers.
    pub enum PortNum {
        UnknownApp = 0 => "UNKNOWN_APP",
        TextMessageApp = 1 => "TEXT_MESSAGE_APP",
        RemoteHardwareApp = 2 => "REMOTE_HARDWARE_APP",
        PositionApp = 3 => "POSITION_APP",
        NodeinfoApp = 4 => "NODEINFO_APP",
        RoutingApp = 5 => "ROUTING_APP",
        AdminApp = 6 => "ADMIN_APP",
        TextMessageCompressedApp = 7 => "TEXT_MESSAGE_COMPRESSED_APP",
        WaypointApp = 8 => "WAYPOINT_APP",
        AudioApp = 9 => "AUDIO_APP",
        DetectionSensorApp = 10 => "DETECTION_SENSOR_APP",
        AlertApp = 11 => "ALERT_APP",
        KeyVerificationApp = 12 => "KEY_VERIFICATION_APP",
        ReplyApp = 32 => "REPLY_APP",
        IpTunnelApp = 33 => "IP_TUNNEL_APP",
        PaxcounterApp = 34 => "PAXCOUNTER_APP",
        SerialApp = 64 => "SERIAL_APP",
        StoreForwardApp = 65 => "STORE_FORWARD_APP",
        RangeTestApp = 66 => "RANGE_TEST_APP",
        TelemetryApp = 67 => "TELEMETRY_APP",
        ZpsApp = 68 => "ZPS_APP",
        SimulatorApp = 69 => "SIMULATOR_APP",
        TracerouteApp = 70 => "TRACEROUTE_APP",
        NeighborinfoApp = 71 => "NEIGHBORINFO_APP",
        AtakPlugin = 72 => "ATAK_PLUGIN",
        MapReportApp = 73 => "MAP_REPORT_APP",
        PowerstressApp = 74 => "POWERSTRESS_APP",
        ReticulumTunnelApp = 76 => "RETICULUM_TUNNEL_APP",
        CayenneApp = 77 => "CAYENNE_APP",
        PrivateApp = 256 => "PRIVATE_APP",
        AtakForwarder = 257 => "ATAK_FORWARDER",
        Max = 511 => "MAX",
    }
}

// ============================================================================
// Position
// ============================================================================

/// GPS fix reported by a node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Position {
    /// Latitude in 1e-7 degrees
    #[prost(sfixed32, optional, tag = "1")]
    pub latitude_i: Option<i32>,
    /// Longitude in 1e-7 degrees
    #[prost(sfixed32, optional, tag = "2")]
    pub longitude_i: Option<i32>,
    /// Altitude above MSL in metres
    #[prost(int32, optional, tag = "3")]
    pub altitude: Option<i32>,
    /// Fix time, seconds since the epoch
    #[prost(fixed32, tag = "4")]
    pub time: u32,
    /// Where the fix came from
    #[prost(enumeration = "LocSource", tag = "5")]
    pub location_source: i32,
    /// GPS timestamp, seconds since the epoch
    #[prost(fixed32, tag = "7")]
    pub timestamp: u32,
    /// Position dilution of precision, 1/100 units
    #[prost(uint32, tag = "11")]
    pub pdop: u32,
    /// Horizontal dilution of precision, 1/100 units
    #[prost(uint32, tag = "12")]
    pub hdop: u32,
    /// Ground speed in m/s
    #[prost(uint32, optional, tag = "15")]
    pub ground_speed: Option<u32>,
    /// True heading in 1e-5 degrees
    #[prost(uint32, optional, tag = "16")]
    pub ground_track: Option<u32>,
    /// Satellites in view
    #[prost(uint32, tag = "19")]
    pub sats_in_view: u32,
    /// Bits of precision shared
    #[prost(uint32, tag = "23")]
    pub precision_bits: u32,
}

named_enum! {
    /// Origin of a position fix.
    pub enum LocSource {
        LocUnset = 0 => "LOC_UNSET",
        LocManual = 1 => "LOC_MANUAL",
        LocInternal = 2 => "LOC_INTERNAL",
        LocExternal = 3 => "LOC_EXTERNAL",
    }
}

// ============================================================================
// User (node info)
// ============================================================================

/// Identity broadcast by a node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    /// Node id in `!xxxxxxxx` form
    #[prost(string, tag = "1")]
    pub id: String,
    /// Full operator name
    #[prost(string, tag = "2")]
    pub long_name: String,
    /// Up to four character label
    #[prost(string, tag = "3")]
    pub short_name: String,
    /// Hardware MAC address
    #[prost(bytes = "vec", tag = "4")]
    pub macaddr: Vec<u8>,
    /// Hardware model
    #[prost(enumeration = "HardwareModel", tag = "5")]
    pub hw_model: i32,
    /// Licensed amateur radio operator
    #[prost(bool, tag = "6")]
    pub is_licensed: bool,
    /// Device role
    #[prost(enumeration = "Role", tag = "7")]
    pub role: i32,
    /// Curve25519 public key
    #[prost(bytes = "vec", tag = "8")]
    pub public_key: Vec<u8>,
    /// Node does not accept direct messages
    #[prost(bool, optional, tag = "9")]
    pub is_unmessagable: Option<bool>,
}

named_enum! {
    /// Supported hardware models.
    pub enum HardwareModel {
        Unset = 0 => "UNSET",
        TloraV2 = 1 => "TLORA_V2",
        TloraV1 = 2 => "TLORA_V1",
        TloraV211p6 = 3 => "TLORA_V2_1_1P6",
        Tbeam = 4 => "TBEAM",
        HeltecV20 = 5 => "HELTEC_V2_0",
        TbeamV0p7 = 6 => "TBEAM_V0P7",
        TEcho = 7 => "T_ECHO",
        TloraV11p3 = 8 => "TLORA_V1_1P3",
        Rak4631 = 9 => "RAK4631",
        HeltecV21 = 10 => "HELTEC_V2_1",
        HeltecV1 = 11 => "HELTEC_V1",
        LilygoTbeamS3Core = 12 => "LILYGO_TBEAM_S3_CORE",
        Rak11200 = 13 => "RAK11200",
        NanoG1 = 14 => "NANO_G1",
        TloraV211p8 = 15 => "TLORA_V2_1_1P8",
        TloraT3S3 = 16 => "TLORA_T3_S3",
        NanoG1Explorer = 17 => "NANO_G1_EXPLORER",
        NanoG2Ultra = 18 => "NANO_G2_ULTRA",
        LoraType = 19 => "LORA_TYPE",
        Wiphone = 20 => "WIPHONE",
        WioWm1110 = 21 => "WIO_WM1110",
        Rak2560 = 22 => "RAK2560",
        HeltecHru3601 = 23 => "HELTEC_HRU_3601",
        HeltecWirelessBridge = 24 => "HELTEC_WIRELESS_BRIDGE",
        StationG1 = 25 => "STATION_G1",
        Rak11310 = 26 => "RAK11310",
        SenseloraRp2040 = 27 => "SENSELORA_RP2040",
        SenseloraS3 = 28 => "SENSELORA_S3",
        Canaryone = 29 => "CANARYONE",
        Rp2040Lora = 30 => "RP2040_LORA",
        StationG2 = 31 => "STATION_G2",
        LoraRelayV1 = 32 => "LORA_RELAY_V1",
        Nrf52840dk = 33 => "NRF52840DK",
        Ppr = 34 => "PPR",
        Genieblocks = 35 => "GENIEBLOCKS",
        Nrf52Unknown = 36 => "NRF52_UNKNOWN",
        Portduino = 37 => "PORTDUINO",
        AndroidSim = 38 => "ANDROID_SIM",
        DiyV1 = 39 => "DIY_V1",
        Nrf52840Pca10059 = 40 => "NRF52840_PCA10059",
        DrDev = 41 => "DR_DEV",
        M5stack = 42 => "M5STACK",
        HeltecV3 = 43 => "HELTEC_V3",
        HeltecWslV3 = 44 => "HELTEC_WSL_V3",
        Betafpv2400Tx = 45 => "BETAFPV_2400_TX",
        Betafpv900NanoTx = 46 => "BETAFPV_900_NANO_TX",
        RpiPico = 47 => "RPI_PICO",
        HeltecWirelessTracker = 48 => "HELTEC_WIRELESS_TRACKER",
        HeltecWirelessPaper = 49 => "HELTEC_WIRELESS_PAPER",
        TDeck = 50 => "T_DECK",
        TWatchS3 = 51 => "T_WATCH_S3",
        PicomputerS3 = 52 => "PICOMPUTER_S3",
        HeltecHt62 = 53 => "HELTEC_HT62",
        EbyteEsp32S3 = 54 => "EBYTE_ESP32_S3",
        Esp32S3Pico = 55 => "ESP32_S3_PICO",
        Chatter2 = 56 => "CHATTER_2",
        HeltecWirelessPaperV10 = 57 => "HELTEC_WIRELESS_PAPER_V1_0",
        HeltecWirelessTrackerV10 = 58 => "HELTEC_WIRELESS_TRACKER_V1_0",
        Unphone = 59 => "UNPHONE",
        TdLorac = 60 => "TD_LORAC",
        CdebyteEoraS3 = 61 => "CDEBYTE_EORA_S3",
        TwcMeshV4 = 62 => "TWC_MESH_V4",
        Nrf52PromicroDiy = 63 => "NRF52_PROMICRO_DIY",
        Radiomaster900BanditNano = 64 => "RADIOMASTER_900_BANDIT_NANO",
        HeltecCapsuleSensorV3 = 65 => "HELTEC_CAPSULE_SENSOR_V3",
        HeltecVisionMasterT190 = 66 => "HELTEC_VISION_MASTER_T190",
        HeltecVisionMasterE213 = 67 => "HELTEC_VISION_MASTER_E213",
        HeltecVisionMasterE290 = 68 => "HELTEC_VISION_MASTER_E290",
        HeltecMeshNodeT114 = 69 => "HELTEC_MESH_NODE_T114",
        SensecapIndicator = 70 => "SENSECAP_INDICATOR",
        TrackerT1000E = 71 => "TRACKER_T1000_E",
        Rak3172 = 72 => "RAK3172",
        WioE5 = 73 => "WIO_E5",
        Radiomaster900Bandit = 74 => "RADIOMASTER_900_BANDIT",
        Me25ls014y10td = 75 => "ME25LS01_4Y10TD",
        Rp2040FeatherRfm95 = 76 => "RP2040_FEATHER_RFM95",
        M5stackCorebasic = 77 => "M5STACK_COREBASIC",
        M5stackCore2 = 78 => "M5STACK_CORE2",
        RpiPico2 = 79 => "RPI_PICO2",
        M5stackCores3 = 80 => "M5STACK_CORES3",
        SeeedXiaoS3 = 81 => "SEEED_XIAO_S3",
        Ms24sf1 = 82 => "MS24SF1",
        TloraC6 = 83 => "TLORA_C6",
        PrivateHw = 255 => "PRIVATE_HW",
    }
}

named_enum! {
    /// Device role advertised in node info.
    pub enum Role {
        Client = 0 => "CLIENT",
        ClientMute = 1 => "CLIENT_MUTE",
        Router = 2 => "ROUTER",
        RouterClient = 3 => "ROUTER_CLIENT",
        Repeater = 4 => "REPEATER",
        Tracker = 5 => "TRACKER",
        Sensor = 6 => "SENSOR",
        Tak = 7 => "TAK",
        ClientHidden = 8 => "CLIENT_HIDDEN",
        LostAndFound = 9 => "LOST_AND_FOUND",
        TakTracker = 10 => "TAK_TRACKER",
        RouterLate = 11 => "ROUTER_LATE",
        ClientBase = 12 => "CLIENT_BASE",
    }
}

// ============================================================================
// Telemetry
// ============================================================================

/// Telemetry report with exactly one metric variant.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Telemetry {
    /// Sample time, seconds since the epoch
    #[prost(fixed32, tag = "1")]
    pub time: u32,
    /// Metric payload
    #[prost(oneof = "telemetry::Variant", tags = "2, 3, 4, 5, 6, 7, 8")]
    pub variant: Option<telemetry::Variant>,
}

/// Nested types for [`Telemetry`].
pub mod telemetry {
    /// Metric kinds a telemetry report can carry.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        /// Battery and airtime
        #[prost(message, tag = "2")]
        DeviceMetrics(super::DeviceMetrics),
        /// Weather and environment sensors
        #[prost(message, tag = "3")]
        EnvironmentMetrics(super::EnvironmentMetrics),
        /// Particulate and gas sensors
        #[prost(message, tag = "4")]
        AirQualityMetrics(super::AirQualityMetrics),
        /// Multi-channel power monitor
        #[prost(message, tag = "5")]
        PowerMetrics(super::PowerMetrics),
        /// Mesh packet counters
        #[prost(message, tag = "6")]
        LocalStats(super::LocalStats),
        /// Biometric sensors
        #[prost(message, tag = "7")]
        HealthMetrics(super::HealthMetrics),
        /// Linux host statistics
        #[prost(message, tag = "8")]
        HostMetrics(super::HostMetrics),
    }

    impl Variant {
        /// Protobuf message name of the variant.
        pub fn name(&self) -> &'static str {
            match self {
                Variant::DeviceMetrics(_) => "DeviceMetrics",
                Variant::EnvironmentMetrics(_) => "EnvironmentMetrics",
                Variant::AirQualityMetrics(_) => "AirQualityMetrics",
                Variant::PowerMetrics(_) => "PowerMetrics",
                Variant::LocalStats(_) => "LocalStats",
                Variant::HealthMetrics(_) => "HealthMetrics",
                Variant::HostMetrics(_) => "HostMetrics",
            }
        }
    }
}

/// Battery and airtime metrics.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceMetrics {
    /// Battery percentage, 101 when externally powered
    #[prost(uint32, optional, tag = "1")]
    pub battery_level: Option<u32>,
    /// Battery voltage
    #[prost(float, optional, tag = "2")]
    pub voltage: Option<f32>,
    /// Channel utilization percentage
    #[prost(float, optional, tag = "3")]
    pub channel_utilization: Option<f32>,
    /// Transmit airtime percentage over the last hour
    #[prost(float, optional, tag = "4")]
    pub air_util_tx: Option<f32>,
    /// Seconds since boot
    #[prost(uint32, optional, tag = "5")]
    pub uptime_seconds: Option<u32>,
}

/// Environment sensor readings.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnvironmentMetrics {
    #[prost(float, optional, tag = "1")]
    pub temperature: Option<f32>,
    #[prost(float, optional, tag = "2")]
    pub relative_humidity: Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub barometric_pressure: Option<f32>,
    #[prost(float, optional, tag = "4")]
    pub gas_resistance: Option<f32>,
    #[prost(float, optional, tag = "5")]
    pub voltage: Option<f32>,
    #[prost(float, optional, tag = "6")]
    pub current: Option<f32>,
    #[prost(uint32, optional, tag = "7")]
    pub iaq: Option<u32>,
    #[prost(float, optional, tag = "8")]
    pub distance: Option<f32>,
    #[prost(float, optional, tag = "9")]
    pub lux: Option<f32>,
    #[prost(float, optional, tag = "10")]
    pub white_lux: Option<f32>,
    #[prost(float, optional, tag = "11")]
    pub ir_lux: Option<f32>,
    #[prost(float, optional, tag = "12")]
    pub uv_lux: Option<f32>,
    #[prost(uint32, optional, tag = "13")]
    pub wind_direction: Option<u32>,
    #[prost(float, optional, tag = "14")]
    pub wind_speed: Option<f32>,
    #[prost(float, optional, tag = "15")]
    pub weight: Option<f32>,
    #[prost(float, optional, tag = "16")]
    pub wind_gust: Option<f32>,
    #[prost(float, optional, tag = "17")]
    pub wind_lull: Option<f32>,
    #[prost(float, optional, tag = "18")]
    pub radiation: Option<f32>,
    #[prost(float, optional, tag = "19")]
    pub rainfall_1h: Option<f32>,
    #[prost(float, optional, tag = "20")]
    pub rainfall_24h: Option<f32>,
    #[prost(uint32, optional, tag = "21")]
    pub soil_moisture: Option<u32>,
    #[prost(float, optional, tag = "22")]
    pub soil_temperature: Option<f32>,
}

/// Air quality sensor readings.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AirQualityMetrics {
    #[prost(uint32, optional, tag = "1")]
    pub pm10_standard: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub pm25_standard: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub pm100_standard: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub pm10_environmental: Option<u32>,
    #[prost(uint32, optional, tag = "5")]
    pub pm25_environmental: Option<u32>,
    #[prost(uint32, optional, tag = "6")]
    pub pm100_environmental: Option<u32>,
    #[prost(uint32, optional, tag = "7")]
    pub particles_03um: Option<u32>,
    #[prost(uint32, optional, tag = "8")]
    pub particles_05um: Option<u32>,
    #[prost(uint32, optional, tag = "9")]
    pub particles_10um: Option<u32>,
    #[prost(uint32, optional, tag = "10")]
    pub particles_25um: Option<u32>,
    #[prost(uint32, optional, tag = "11")]
    pub particles_50um: Option<u32>,
    #[prost(uint32, optional, tag = "12")]
    pub particles_100um: Option<u32>,
    #[prost(uint32, optional, tag = "13")]
    pub co2: Option<u32>,
    #[prost(float, optional, tag = "14")]
    pub co2_temperature: Option<f32>,
    #[prost(float, optional, tag = "15")]
    pub co2_humidity: Option<f32>,
    #[prost(float, optional, tag = "16")]
    pub form_formaldehyde: Option<f32>,
    #[prost(float, optional, tag = "17")]
    pub form_humidity: Option<f32>,
    #[prost(float, optional, tag = "18")]
    pub form_temperature: Option<f32>,
    #[prost(uint32, optional, tag = "19")]
    pub pm40_standard: Option<u32>,
    #[prost(uint32, optional, tag = "20")]
    pub particles_40um: Option<u32>,
    #[prost(float, optional, tag = "21")]
    pub pm_temperature: Option<f32>,
    #[prost(float, optional, tag = "22")]
    pub pm_humidity: Option<f32>,
    #[prost(float, optional, tag = "23")]
    pub pm_voc_idx: Option<f32>,
    #[prost(float, optional, tag = "24")]
    pub pm_nox_idx: Option<f32>,
    #[prost(float, optional, tag = "25")]
    pub particles_tps: Option<f32>,
}

/// Three-channel-pair power monitor readings.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PowerMetrics {
    #[prost(float, optional, tag = "1")]
    pub ch1_voltage: Option<f32>,
    #[prost(float, optional, tag = "2")]
    pub ch1_current: Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub ch2_voltage: Option<f32>,
    #[prost(float, optional, tag = "4")]
    pub ch2_current: Option<f32>,
    #[prost(float, optional, tag = "5")]
    pub ch3_voltage: Option<f32>,
    #[prost(float, optional, tag = "6")]
    pub ch3_current: Option<f32>,
    #[prost(float, optional, tag = "7")]
    pub ch4_voltage: Option<f32>,
    #[prost(float, optional, tag = "8")]
    pub ch4_current: Option<f32>,
    #[prost(float, optional, tag = "9")]
    pub ch5_voltage: Option<f32>,
    #[prost(float, optional, tag = "10")]
    pub ch5_current: Option<f32>,
    #[prost(float, optional, tag = "11")]
    pub ch6_voltage: Option<f32>,
    #[prost(float, optional, tag = "12")]
    pub ch6_current: Option<f32>,
    #[prost(float, optional, tag = "13")]
    pub ch7_voltage: Option<f32>,
    #[prost(float, optional, tag = "14")]
    pub ch7_current: Option<f32>,
    #[prost(float, optional, tag = "15")]
    pub ch8_voltage: Option<f32>,
    #[prost(float, optional, tag = "16")]
    pub ch8_current: Option<f32>,
}

/// Mesh statistics kept by the local node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocalStats {
    #[prost(uint32, tag = "1")]
    pub uptime_seconds: u32,
    #[prost(float, tag = "2")]
    pub channel_utilization: f32,
    #[prost(float, tag = "3")]
    pub air_util_tx: f32,
    #[prost(uint32, tag = "4")]
    pub num_packets_tx: u32,
    #[prost(uint32, tag = "5")]
    pub num_packets_rx: u32,
    #[prost(uint32, tag = "6")]
    pub num_packets_rx_bad: u32,
    #[prost(uint32, tag = "7")]
    pub num_online_nodes: u32,
    #[prost(uint32, tag = "8")]
    pub num_total_nodes: u32,
    #[prost(uint32, tag = "9")]
    pub num_rx_dupe: u32,
    #[prost(uint32, tag = "10")]
    pub num_tx_relay: u32,
    #[prost(uint32, tag = "11")]
    pub num_tx_relay_canceled: u32,
    #[prost(uint32, tag = "12")]
    pub heap_total_bytes: u32,
    #[prost(uint32, tag = "13")]
    pub heap_free_bytes: u32,
    #[prost(uint32, tag = "14")]
    pub num_tx_dropped: u32,
}

/// Biometric readings. Decoded but not translated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthMetrics {
    #[prost(uint32, optional, tag = "1")]
    pub heart_bpm: Option<u32>,
    #[prost(uint32, optional, tag = "2")]
    pub sp_o2: Option<u32>,
    #[prost(float, optional, tag = "3")]
    pub temperature: Option<f32>,
}

/// Linux host statistics.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HostMetrics {
    #[prost(uint32, tag = "1")]
    pub uptime_seconds: u32,
    #[prost(uint64, tag = "2")]
    pub freemem_bytes: u64,
    #[prost(uint64, tag = "3")]
    pub diskfree1_bytes: u64,
    #[prost(uint64, optional, tag = "4")]
    pub diskfree2_bytes: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub diskfree3_bytes: Option<u64>,
    #[prost(uint32, tag = "6")]
    pub load1: u32,
    #[prost(uint32, tag = "7")]
    pub load5: u32,
    #[prost(uint32, tag = "8")]
    pub load15: u32,
    #[prost(string, optional, tag = "9")]
    pub user_string: Option<String>,
}

// ============================================================================
// Routing and traceroute
// ============================================================================

/// Route discovery record shared by traceroute and routing packets.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteDiscovery {
    /// Nodes on the way towards the destination
    #[prost(fixed32, repeated, tag = "1")]
    pub route: Vec<u32>,
    /// SNR per hop towards the destination, in quarter dB
    #[prost(int32, repeated, tag = "2")]
    pub snr_towards: Vec<i32>,
    /// Nodes on the way back
    #[prost(fixed32, repeated, tag = "3")]
    pub route_back: Vec<u32>,
    /// SNR per hop on the way back, in quarter dB
    #[prost(int32, repeated, tag = "4")]
    pub snr_back: Vec<i32>,
}

/// Mesh routing control packet.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Routing {
    #[prost(oneof = "routing::Variant", tags = "1, 2, 3")]
    pub variant: Option<routing::Variant>,
}

/// Nested types for [`Routing`].
pub mod routing {
    /// Routing packet kinds.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        /// Route request
        #[prost(message, tag = "1")]
        RouteRequest(super::RouteDiscovery),
        /// Route reply
        #[prost(message, tag = "2")]
        RouteReply(super::RouteDiscovery),
        /// Delivery failure or acknowledgment
        #[prost(enumeration = "super::RoutingError", tag = "3")]
        ErrorReason(i32),
    }
}

named_enum! {
    /// Routing error reasons.
    pub enum RoutingError {
        None = 0 => "NONE",
        NoRoute = 1 => "NO_ROUTE",
        GotNak = 2 => "GOT_NAK",
        Timeout = 3 => "TIMEOUT",
        NoInterface = 4 => "NO_INTERFACE",
        MaxRetransmit = 5 => "MAX_RETRANSMIT",
        NoChannel = 6 => "NO_CHANNEL",
        TooLarge = 7 => "TOO_LARGE",
        NoResponse = 8 => "NO_RESPONSE",
        DutyCycleLimit = 9 => "DUTY_CYCLE_LIMIT",
        BadRequest = 32 => "BAD_REQUEST",
        NotAuthorized = 33 => "NOT_AUTHORIZED",
        PkiFailed = 34 => "PKI_FAILED",
        PkiUnknownPubkey = 35 => "PKI_UNKNOWN_PUBKEY",
        AdminBadSessionKey = 36 => "ADMIN_BAD_SESSION_KEY",
        AdminPublicKeyUnauthorized = 37 => "ADMIN_PUBLIC_KEY_UNAUTHORIZED",
        RateLimitExceeded = 38 => "RATE_LIMIT_EXCEEDED",
    }
}

// ============================================================================
// Store and forward
// ============================================================================

/// Store-and-forward module packet.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StoreAndForward {
    /// Request or response kind
    #[prost(enumeration = "RequestResponse", tag = "1")]
    pub rr: i32,
    #[prost(oneof = "store_and_forward::Variant", tags = "2, 3, 4, 5")]
    pub variant: Option<store_and_forward::Variant>,
}

/// Nested types for [`StoreAndForward`].
pub mod store_and_forward {
    /// Store-and-forward payload kinds.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        #[prost(message, tag = "2")]
        Stats(Statistics),
        #[prost(message, tag = "3")]
        History(History),
        #[prost(message, tag = "4")]
        Heartbeat(Heartbeat),
        #[prost(bytes = "vec", tag = "5")]
        Text(Vec<u8>),
    }

    /// Router statistics.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Statistics {
        #[prost(uint32, tag = "1")]
        pub messages_total: u32,
        #[prost(uint32, tag = "2")]
        pub messages_saved: u32,
        #[prost(uint32, tag = "3")]
        pub messages_max: u32,
        #[prost(uint32, tag = "4")]
        pub up_time: u32,
        #[prost(uint32, tag = "5")]
        pub requests: u32,
        #[prost(uint32, tag = "6")]
        pub requests_history: u32,
        #[prost(bool, tag = "7")]
        pub heartbeat: bool,
        #[prost(uint32, tag = "8")]
        pub return_max: u32,
        #[prost(uint32, tag = "9")]
        pub return_window: u32,
    }

    /// History replay summary.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct History {
        #[prost(uint32, tag = "1")]
        pub history_messages: u32,
        #[prost(uint32, tag = "2")]
        pub window: u32,
        #[prost(uint32, tag = "3")]
        pub last_request: u32,
    }

    /// Router heartbeat.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Heartbeat {
        #[prost(uint32, tag = "1")]
        pub period: u32,
        #[prost(uint32, tag = "2")]
        pub secondary: u32,
    }
}

named_enum! {
    /// Store-and-forward request/response codes.
    pub enum RequestResponse {
        Unset = 0 => "UNSET",
        RouterError = 1 => "ROUTER_ERROR",
        RouterHeartbeat = 2 => "ROUTER_HEARTBEAT",
        RouterPing = 3 => "ROUTER_PING",
        RouterPong = 4 => "ROUTER_PONG",
        RouterBusy = 5 => "ROUTER_BUSY",
        RouterHistory = 6 => "ROUTER_HISTORY",
        RouterStats = 7 => "ROUTER_STATS",
        RouterTextDirect = 8 => "ROUTER_TEXT_DIRECT",
        RouterTextBroadcast = 9 => "ROUTER_TEXT_BROADCAST",
        ClientError = 64 => "CLIENT_ERROR",
        ClientHistory = 65 => "CLIENT_HISTORY",
        ClientStats = 66 => "CLIENT_STATS",
        ClientPing = 67 => "CLIENT_PING",
        ClientPong = 68 => "CLIENT_PONG",
        ClientAbort = 106 => "CLIENT_ABORT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_port_names() {
        assert_eq!(PortNum::TelemetryApp.as_str_name(), "TELEMETRY_APP");
        assert_eq!(PortNum::name_of(3), "POSITION_APP");
        assert_eq!(PortNum::from_str_name("TRACEROUTE_APP"), Some(PortNum::TracerouteApp));
    }

    #[test]
    fn test_unknown_enum_value_renders_number() {
        assert_eq!(PortNum::name_of(999), "999");
        assert_eq!(HardwareModel::name_of(200), "200");
        assert_eq!(Role::name_of(-1), "-1");
    }

    #[test]
    fn test_hardware_model_names() {
        assert_eq!(HardwareModel::name_of(16), "TLORA_T3_S3");
        assert_eq!(HardwareModel::name_of(44), "HELTEC_WSL_V3");
        assert_eq!(HardwareModel::name_of(255), "PRIVATE_HW");
    }

    #[test]
    fn test_packet_payload_accessors() {
        let mut packet = MeshPacket {
            payload_variant: Some(mesh_packet::PayloadVariant::Encrypted(vec![1, 2, 3])),
            ..Default::default()
        };
        assert!(packet.is_encrypted());
        assert!(packet.decoded().is_none());

        packet.payload_variant = Some(mesh_packet::PayloadVariant::Decoded(Data {
            portnum: PortNum::TextMessageApp as i32,
            payload: b"hi".to_vec(),
            ..Default::default()
        }));
        assert!(!packet.is_encrypted());
        assert_eq!(packet.decoded().map(|d| d.portnum), Some(1));
    }

    #[test]
    fn test_envelope_wire_compatibility() {
        let envelope = ServiceEnvelope {
            packet: Some(MeshPacket {
                from: 0x44be043f,
                to: 0xffffffff,
                id: 42,
                rx_rssi: -90,
                hop_start: 3,
                hop_limit: 2,
                payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                    portnum: PortNum::TelemetryApp as i32,
                    bitfield: Some(1),
                    ..Default::default()
                })),
                ..Default::default()
            }),
            channel_id: "MediumFast".to_string(),
            gateway_id: "!44be043f".to_string(),
        };
        let bytes = envelope.encode_to_vec();
        // from is a fixed32 at field 1 inside the packet at field 1
        assert_eq!(bytes[0], 0x0a);
        let decoded = ServiceEnvelope::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_telemetry_variant_name() {
        let variant = telemetry::Variant::HostMetrics(HostMetrics::default());
        assert_eq!(variant.name(), "HostMetrics");
    }
}
