use tokio_serial::SerialStream;

use crate::Session;

pub type SerialSession = Session<SerialStream>;

/// Open the receiver's serial port. Must be called from within a tokio runtime.
#[tracing::instrument(level = "debug")]
pub fn connect_serial(path: &str, baud: u32) -> Result<SerialSession, tokio_serial::Error> {
    let builder = tokio_serial::new(path, baud);
    let stream = SerialStream::open(&builder)?;

    tracing::info!("connected to serial port");

    Ok(Session::new(stream))
}
