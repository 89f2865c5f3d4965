/// Test utilities for building Flamingo CSV data files
use flamingo_uploader::checksum::compute_checksum;

/// Builder for Flamingo CSV content, one record per line
pub struct FlamingoCsvBuilder {
    lines: Vec<String>,
    serial: String,
}

#[allow(dead_code)]
impl FlamingoCsvBuilder {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            serial: "FL00001234".to_string(),
        }
    }

    pub fn serial(mut self, serial: &str) -> Self {
        self.serial = serial.to_string();
        self
    }

    /// Add a well-formed record with a correct checksum
    pub fn valid(mut self, timestamp: f64, temperature: f64, conductivity: f64, voltage: f64) -> Self {
        let checksum = compute_checksum(temperature, conductivity, voltage, 0.0);
        self.lines.push(format!(
            "flamingo,1,{},{},{},{},0,{},{}",
            timestamp, self.serial, temperature, conductivity, voltage, checksum
        ));
        self
    }

    /// Add a record whose checksum is off by one
    pub fn bad_checksum(mut self, timestamp: f64) -> Self {
        let checksum = compute_checksum(20.5, 400.0, 3.5, 0.0).wrapping_add(1);
        self.lines.push(format!(
            "flamingo,1,{},{},20.5,400,0,3.5,{}",
            timestamp, self.serial, checksum
        ));
        self
    }

    /// Add a record with a raised error indicator
    pub fn errored(mut self, timestamp: f64, error_code: u32) -> Self {
        self.lines.push(format!(
            "flamingo,1,{},{},20.5,400,{},3.5,0",
            timestamp, self.serial, error_code
        ));
        self
    }

    /// Add an arbitrary raw line
    pub fn raw(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    pub fn build(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
