//! Shared field declarations
//!
//! Most resource kinds repeat the same handful of properties (name,
//! comment, disabled, MTU...). They are declared once here and composed
//! into schemas in [`super::resources`].

use super::{DiffSuppress, Encoding, Field, Validator};

/// Field carrying the `.id` an ordered item must be placed before
pub const PLACE_BEFORE: &str = "place_before";

pub const KEY_NAME: &str = "name";
pub const KEY_FILTER: &str = "filter";
pub const KEY_COMMENT: &str = "comment";
pub const KEY_DISABLED: &str = "disabled";
pub const KEY_DYNAMIC: &str = "dynamic";
pub const KEY_INVALID: &str = "invalid";
pub const KEY_RUNNING: &str = "running";
pub const KEY_INTERFACE: &str = "interface";
pub const KEY_ARP: &str = "arp";
pub const KEY_ARP_TIMEOUT: &str = "arp_timeout";
pub const KEY_MTU: &str = "mtu";
pub const KEY_ACTUAL_MTU: &str = "actual_mtu";
pub const KEY_L2MTU: &str = "l2mtu";

const ARP_MODES: &[&str] = &["disabled", "enabled", "local-proxy-arp", "proxy-arp", "reply-only"];
const AUTO_YES_NO: &[&str] = &["auto", "yes", "no"];

/// Time values: `<integer><unit>` tokens, bare integers are seconds
pub fn validation_time() -> Validator {
    Validator::pattern(
        r"^(\d+(ms|s|m|M|h|d|w)?)+$|^\d+:\d{2}:\d{2}$",
        "value must be integer[/time],integer 0..4294967295",
    )
}

/// Tri-state switch: `auto`, `yes` or `no`
pub fn validation_auto_yes_no() -> Validator {
    Validator::OneOf(AUTO_YES_NO)
}

/// IPv4 address or CIDR, or empty
pub fn validation_ip_address() -> Validator {
    Validator::pattern(
        r"^$|^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(/([0-9]|[1-2][0-9]|3[0-2]))?$",
        "Allowed addresses must be a CIDR IP address or an empty string",
    )
}

/// Required natural key
pub fn name() -> Field {
    Field::string().required().describe("Name of the item.")
}

/// Additional read constraints (`{"interface" = "ether1"}`)
pub fn filter() -> Field {
    Field::map()
        .read_filter()
        .describe("Additional request filtering options.")
}

pub fn comment() -> Field {
    Field::string()
}

pub fn disabled() -> Field {
    Field::bool().default_value(false).encoding(Encoding::YesNo)
}

pub fn dynamic() -> Field {
    Field::bool().computed().describe(
        "Configuration item created by software, not by management interface. \
         It is not exported, and cannot be directly modified.",
    )
}

pub fn invalid() -> Field {
    Field::bool().computed()
}

pub fn running() -> Field {
    Field::bool().computed()
}

/// Required parent interface
pub fn interface() -> Field {
    Field::string().required().describe("Name of the interface.")
}

pub fn arp() -> Field {
    Field::string()
        .default_value("enabled")
        .validate(Validator::OneOf(ARP_MODES))
        .describe("ARP resolution protocol mode.")
}

pub fn arp_timeout() -> Field {
    Field::string()
        .default_value("auto")
        .validate(Validator::pattern(
            r"^$|^auto$|^(\d+(ms|s|m|M|h|d)?)+$",
            "expected arp_timeout value to be 'auto' string or time value",
        ))
        .describe(
            "How long an ARP record is kept after no packets are received from the IP. \
             'auto' follows the IP settings default (30s).",
        )
}

/// Layer 3 MTU: `auto` or `0..=65535`
pub fn mtu() -> Field {
    Field::string()
        .encoding(Encoding::AutoOrInt)
        .validate(Validator::Mtu)
        .describe("Layer3 Maximum transmission unit ('auto', 0 .. 65535)")
}

pub fn actual_mtu() -> Field {
    Field::int().computed()
}

pub fn l2mtu() -> Field {
    Field::int().computed().describe("Layer2 Maximum transmission unit.")
}

/// `.id` of the item this one must precede
///
/// The device never echoes the value back, so it never takes part in
/// field diffing; position is checked against the device list instead.
pub fn place_before() -> Field {
    Field::string()
        .suppress_diff(DiffSuppress::Always)
        .describe("Before which position the rule will be inserted.")
}

/// Duration field compared by value, not text
pub fn duration() -> Field {
    Field::string()
        .encoding(Encoding::Duration)
        .validate(validation_time())
        .suppress_diff(DiffSuppress::Duration)
}
