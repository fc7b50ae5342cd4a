//! Radio transport seam.
//!
//! The node hands exactly one packet per lap to whatever radio the build
//! supplies. No fragmentation and no acknowledgment at this layer; a
//! transport failure is best-effort and absorbed by the transmit stage.

/// Contract the external radio primitive is wrapped behind.
pub trait Radio {
    type Error: core::fmt::Debug;

    /// Power up / claim the transmitter.
    fn open_tx(&mut self) -> Result<(), Self::Error>;

    /// Send one complete frame.
    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Release the transmitter. Infallible; radios that cannot fail to
    /// close simply return.
    fn close(&mut self);
}

/// Radio that drops every packet. Useful for bring-up and tests where the
/// transport is out of scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRadio;

impl Radio for NullRadio {
    type Error = core::convert::Infallible;

    fn open_tx(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        log::debug!("null radio dropping {} byte frame", frame.len());
        Ok(())
    }

    fn close(&mut self) {}
}
