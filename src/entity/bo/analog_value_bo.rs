/// last known analog value with its display unit
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogValueBo {
    pub value: f64,
    pub unit: String,
}

impl AnalogValueBo {
    pub fn new(value: f64, unit: &str) -> Self {
        AnalogValueBo { value, unit: unit.to_string() }
    }

    /// placeholder for a configured slot that has not reported yet
    pub fn empty() -> Self {
        AnalogValueBo::new(0.0, "0")
    }
}
