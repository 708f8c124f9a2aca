//! Serial port transport
//!
//! Opens the physical link to the DMX decoder peer. The port parameters are
//! a deployment constant of the decoder hardware, not configuration: 9600
//! baud, 8 data bits, no parity, one stop bit, no flow control, RTS
//! asserted. Any input or output buffered before the session started is
//! discarded on open.

use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};
use tracing::info;

use crate::error::LinkError;

/// Fixed baud rate of the decoder link
pub const BAUD_RATE: u32 = 9600;

/// Open the decoder serial port with the fixed link parameters
pub fn open_port(port_name: &str) -> Result<SerialStream, LinkError> {
    let mut stream = tokio_serial::new(port_name, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
        .map_err(LinkError::CannotOpenPort)?;

    stream
        .write_request_to_send(true)
        .map_err(LinkError::CannotOpenPort)?;
    stream
        .clear(ClearBuffer::All)
        .map_err(LinkError::CannotOpenPort)?;

    info!("Opened decoder link on {} at {} baud", port_name, BAUD_RATE);

    Ok(stream)
}
