//! Built-in resource kinds

use super::props::{self, *};
use super::{Encoding, Field, PlacementStrategy, ResourceSchema, Validator};

pub const SYSTEM_SCHEDULER: &str = "system_scheduler";
pub const INTERFACE_VLAN: &str = "interface_vlan";
pub const IP_FIREWALL_FILTER: &str = "ip_firewall_filter";

const FIREWALL_ACTIONS: &[&str] = &[
    "accept",
    "add-dst-to-address-list",
    "add-src-to-address-list",
    "drop",
    "fasttrack-connection",
    "jump",
    "log",
    "passthrough",
    "reject",
    "return",
    "tarpit",
];

const FIREWALL_CHAINS_HINT: &str = "Name of the chain (input, forward, output or a custom chain).";

/// `/system/scheduler`: scripts run at a start time and/or interval
pub fn system_scheduler() -> ResourceSchema {
    ResourceSchema::new(SYSTEM_SCHEDULER, "/system/scheduler")
        .keyed_by(KEY_NAME)
        .field(KEY_NAME, props::name())
        .field(
            "on_event",
            Field::string().describe("Name of the script or the script source to execute."),
        )
        .field(
            "interval",
            props::duration()
                .default_value("0s")
                .describe("Interval between two script executions; 0s runs the task once."),
        )
        .field("start_date", Field::string())
        .field("start_time", Field::string())
        .field(
            "policy",
            Field::list().describe("Policies the executed script is allowed to use."),
        )
        .field(KEY_COMMENT, props::comment())
        .field(KEY_DISABLED, props::disabled())
        .field(KEY_FILTER, props::filter())
        .field("owner", Field::string().computed())
        .field("run_count", Field::string().computed())
        .field("next_run", Field::string().computed())
}

/// `/interface/vlan`: 802.1Q virtual interfaces on top of a parent interface
pub fn interface_vlan() -> ResourceSchema {
    ResourceSchema::new(INTERFACE_VLAN, "/interface/vlan")
        .keyed_by(KEY_NAME)
        .field(KEY_NAME, props::name())
        .field(KEY_INTERFACE, props::interface())
        .field(
            "vlan_id",
            Field::int()
                .required()
                .validate(Validator::IntRange(1, 4094))
                .describe("Virtual LAN identifier or tag used to distinguish VLANs."),
        )
        .field(KEY_MTU, props::mtu())
        .field(KEY_ARP, props::arp())
        .field(KEY_ARP_TIMEOUT, props::arp_timeout())
        .field(
            "use_service_tag",
            Field::bool().default_value(false).encoding(Encoding::YesNo),
        )
        .field(KEY_COMMENT, props::comment())
        .field(KEY_DISABLED, props::disabled())
        .field(KEY_FILTER, props::filter())
        .field(KEY_RUNNING, props::running())
        .field(KEY_ACTUAL_MTU, props::actual_mtu())
        .field(KEY_L2MTU, props::l2mtu())
        .field("mac_address", Field::string().computed())
}

/// `/ip/firewall/filter`: ordered packet filter rules
pub fn ip_firewall_filter() -> ResourceSchema {
    ResourceSchema::new(IP_FIREWALL_FILTER, "/ip/firewall/filter")
        .ordered(PLACE_BEFORE, PlacementStrategy::Move)
        .field("chain", Field::string().required().describe(FIREWALL_CHAINS_HINT))
        .field(
            "action",
            Field::string()
                .default_value("accept")
                .validate(Validator::OneOf(FIREWALL_ACTIONS)),
        )
        .field("protocol", Field::string())
        .field("src_address", Field::string().validate(validation_ip_address()))
        .field("dst_address", Field::string().validate(validation_ip_address()))
        .field("dst_port", Field::string())
        .field("in_interface", Field::string())
        .field("out_interface", Field::string())
        .field("connection_state", Field::list())
        .field("log", Field::bool().default_value(false).encoding(Encoding::YesNo))
        .field(KEY_COMMENT, props::comment())
        .field(KEY_DISABLED, props::disabled())
        .field(PLACE_BEFORE, props::place_before())
        .field("bytes", Field::int().computed())
        .field("packets", Field::int().computed())
        .field(KEY_DYNAMIC, props::dynamic())
        .field(KEY_INVALID, props::invalid())
}

/// All built-in kinds
pub fn builtin() -> Vec<ResourceSchema> {
    vec![system_scheduler(), interface_vlan(), ip_firewall_filter()]
}
