//! CoE unit ids and their display names

/// unit id -> display name, ascending by id
const UNITS: &[(&str, &str)] = &[
    ("0", ""),
    ("1", "°C"),
    ("2", "W/m²"),
    ("3", "l/h"),
    ("4", "Sec"),
    ("5", "Min"),
    ("6", "l/Imp"),
    ("7", "K"),
    ("8", "%"),
    ("10", "kW"),
    ("11", "kWh"),
    ("12", "MWh"),
    ("13", "V"),
    ("14", "mA"),
    ("15", "Hr"),
    ("16", "Days"),
    ("17", "Imp"),
    ("18", "kΩ"),
    ("19", "l"),
    ("20", "km/h"),
    ("21", "Hz"),
    ("22", "l/min"),
    ("23", "bar"),
    ("25", "km"),
    ("26", "m"),
    ("27", "mm"),
    ("28", "m³"),
    ("35", "l/d"),
    ("36", "m/s"),
    ("37", "m³/min"),
    ("38", "m³/h"),
    ("39", "m³/d"),
    ("40", "mm/min"),
    ("41", "mm/h"),
    ("42", "mm/d"),
    ("43", "On/Off"),
    ("44", "No/Yes"),
    ("46", "°C"),
    ("50", "€"),
    ("51", "$"),
    ("52", "g/m³"),
    ("54", "°"),
    ("57", "Sec"),
    ("59", "%"),
    ("60", "h"),
    ("63", "A"),
    ("65", "mbar"),
    ("66", "Pa"),
    ("67", "ppm"),
    ("69", "W"),
    ("70", "t"),
    ("71", "kg"),
    ("72", "g"),
    ("73", "cm"),
    ("74", "K"),
    ("75", "lx"),
    ("76", "Bq/m³"),
];

pub const UNKNOWN_UNIT_ID: &str = "0";

// "1" and "46" are both °C, v1 servers want 46 and v2 servers want 1
const CELSIUS_ID: &str = "1";
const CELSIUS_ALIAS_ID: &str = "46";

/// display name of a unit id, "" when unknown
pub fn unit_name(unit_id: &str) -> &'static str {
    UNITS
        .iter()
        .find(|(id, _)| *id == unit_id)
        .map(|(_, name)| *name)
        .unwrap_or("")
}

/// first unit id with this display name, "0" when none
pub fn unit_id_from_name(name: &str) -> &'static str {
    UNITS
        .iter()
        .find(|(_, unit)| *unit == name)
        .map(|(id, _)| *id)
        .unwrap_or(UNKNOWN_UNIT_ID)
}

/// unit id as sent to v1 servers
pub fn to_v1_unit_id(unit_id: &str) -> &str {
    if unit_id == CELSIUS_ID {
        CELSIUS_ALIAS_ID
    } else {
        unit_id
    }
}

/// unit id as sent to v2 servers
pub fn to_v2_unit_id(unit_id: &str) -> &str {
    if unit_id == CELSIUS_ALIAS_ID {
        CELSIUS_ID
    } else {
        unit_id
    }
}
