pub const DEFAULT_CONFIG_PATH: &str = "/etc/wireguard_api/wireguard_api.conf";

pub const DEFAULT_STATE_DIR: &str = "/etc/wireguard_api";

pub const DEFAULT_WIREGUARD_DIR: &str = "/etc/wireguard";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

pub const WIREGUARD_CONFIG_EXT: &str = "conf";

pub const CONFIG_ENV_VAR: &str = "WGAPI_CONFIG";
