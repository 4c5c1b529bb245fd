pub mod gateway {
    use std::time::Duration;

    pub const MAX_DEVICES: usize = 20;
    pub const MAX_PACKET_HISTORY: usize = 30;
    pub const DEVICE_TIMEOUT: Duration = Duration::from_secs(300);
    pub const MAX_PACKET_SIZE: usize = 255;
    pub const LOOP_YIELD: Duration = Duration::from_millis(10);
    pub const STATUS_REPORT_INTERVAL: Duration = Duration::from_secs(60);
}

pub mod wifi {
    use std::time::Duration;

    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
    pub const LINK_CHECK_INTERVAL: Duration = Duration::from_secs(5);
    pub const WIRELESS_STATS_PATH: &str = "/proc/net/wireless";
}

pub mod http {
    use std::time::Duration;

    pub const TIMEOUT: Duration = Duration::from_secs(5);
    pub const SENSOR_ENDPOINT: &str = "/api/sensor-data";
    pub const STATUS_ENDPOINT: &str = "/api/gateway-status";
}

pub mod radio {
    pub const CHANNEL_SIZE: usize = 10;
    pub const MAX_DATAGRAM_SIZE: usize = 2048;
}

pub mod time {
    /// Cualquier timestamp anterior (Nov 2023) se considera inválido.
    pub const MIN_VALID_UNIX_TIME: i64 = 1_700_000_000;
}
