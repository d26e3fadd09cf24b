use crate::config::CONFIG;
use crate::error::SerialError;

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

pub mod line;
pub mod parse;

#[cfg(test)]
mod test;

/// Tries every candidate device path in priority order.
///
/// The first port that opens wins and is owned exclusively by the caller.
pub async fn resolve_port() -> Result<SerialStream, SerialError> {
    let candidates = CONFIG.serial_ports();
    let baud_rate = CONFIG.baud_rate();

    for path in &candidates {
        match tokio_serial::new(path, baud_rate).open_native_async() {
            Ok(stream) => {
                info!(port = %path, baud_rate = baud_rate, "Opened serial port");
                return Ok(stream);
            }
            Err(e) => debug!(port = %path, "Candidate port not available: {}", e),
        }
    }

    Err(SerialError::PortUnavailable(candidates.join(", ")))
}
