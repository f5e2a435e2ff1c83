//! Frame sources feeding the capture loop.

use pcap::{Active, Capture};
use tracing::{info, instrument};

use netrain_config::CaptureConfig;

use crate::error::CaptureError;

/// A non-blocking supplier of raw link-layer frames.
pub trait FrameSource {
    /// Returns the next captured frame, or `Ok(None)` when nothing is pending.
    ///
    /// The slice holds exactly the captured bytes and is valid until the next call.
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError>;
}

/// Live tap on a network interface.
pub struct PcapTap {
    capture: Capture<Active>,
    interface: String,
}

impl PcapTap {
    /// Opens the interface, applies the filter and switches to non-blocking reads.
    #[instrument(skip(config), fields(snaplen = config.snaplen, filter = %config.filter))]
    pub fn open(interface: &str, config: &CaptureConfig) -> Result<Self, CaptureError> {
        let mut capture = Capture::from_device(interface)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .open()?;

        if !config.filter.is_empty() {
            capture
                .filter(&config.filter, true)
                .map_err(|source| CaptureError::Filter {
                    filter: config.filter.clone(),
                    source,
                })?;
        }

        let capture = capture.setnonblock()?;
        info!(interface, "Capture tap opened");

        Ok(Self {
            capture,
            interface: interface.to_string(),
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl FrameSource for PcapTap {
    #[inline]
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(Some(packet.data)),
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(CaptureError::Pcap(e)),
        }
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        (**self).next_frame()
    }
}
