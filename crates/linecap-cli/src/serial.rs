//! Serial transport: port discovery and opening.

use std::time::Duration;

use linecap_core::ReaderSource;
use serialport::{SerialPort, SerialPortType};

/// Baud rates offered for capture.
pub const BAUD_RATES: &[u32] = &[
    9_600, 19_200, 38_400, 57_600, 115_200, 230_400, 250_000, 460_800, 500_000, 921_600,
    1_000_000, 2_000_000,
];

pub const DEFAULT_BAUD_RATE: u32 = 1_000_000;

// Short enough that a quiet link does not hold the decoder thread for long.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

pub fn parse_baud_rate(value: &str) -> Result<u32, String> {
    let rate: u32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if BAUD_RATES.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!(
            "unsupported baud rate {rate} (supported: {})",
            BAUD_RATES
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
}

pub fn list_ports() -> Result<Vec<PortInfo>, serialport::Error> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        // cu.* devices do not block on carrier detect
        .filter(|_p| {
            #[cfg(target_os = "macos")]
            {
                !_p.port_name.starts_with("/dev/tty.")
            }
            #[cfg(not(target_os = "macos"))]
            {
                true
            }
        })
        .map(|p| PortInfo {
            kind: describe_port_type(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => {
            let mut kind = format!("USB {:04x}:{:04x}", info.vid, info.pid);
            if let Some(product) = &info.product {
                kind.push_str(&format!(" {product}"));
            }
            kind
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}

pub fn open_port(
    port: &str,
    baud_rate: u32,
) -> Result<ReaderSource<Box<dyn SerialPort>>, serialport::Error> {
    let port = serialport::new(port, baud_rate)
        .timeout(READ_TIMEOUT)
        .open()?;
    Ok(ReaderSource::new(port))
}
