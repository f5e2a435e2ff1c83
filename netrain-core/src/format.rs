//! ## netrain-core::format
//! Turns a classified frame into display events.
//!
//! Every frame yields a meta line (`PROTO SRC[:PORT] > DST[:PORT]`). Encrypted flows
//! carrying at least `min_hex_payload` bytes also yield a line of hex pairs. Both are
//! coloured uniformly by direction and truncated to the configured text limit.

use std::fmt::Write;

use netrain_protocols::Classified;

use crate::error::CoreError;
use crate::events::display::{EventWriter, MAX_EVENT_TEXT};
use crate::events::{ColorTag, DisplayEvent, Zone};
use crate::registry::LocalAddressRegistry;

/// Default minimum payload for a hex line.
pub const MIN_HEX_PAYLOAD: usize = 20;

/// Hex digits in the longest line that fits `MAX_EVENT_TEXT`.
const HEX_DIGITS_MAX: usize = (MAX_EVENT_TEXT + 1) / 3 * 2;

pub struct EventFormatter {
    registry: LocalAddressRegistry,
    max_text_len: usize,
    min_hex_payload: usize,
}

impl EventFormatter {
    pub fn new(
        registry: LocalAddressRegistry,
        max_text_len: usize,
        min_hex_payload: usize,
    ) -> Result<Self, CoreError> {
        if max_text_len == 0 || max_text_len > MAX_EVENT_TEXT {
            return Err(CoreError::InvalidTextLimit(max_text_len));
        }
        Ok(Self {
            registry,
            max_text_len,
            min_hex_payload,
        })
    }

    pub fn registry(&self) -> &LocalAddressRegistry {
        &self.registry
    }

    /// Formats one classified frame into zero, one or two events.
    pub fn format(&self, flow: &Classified<'_>) -> FormattedEvents {
        let is_inbound = self.registry.contains(flow.dst_addr);
        let is_encrypted = flow.is_encrypted();

        let meta = self.meta_event(flow, is_encrypted, is_inbound);
        let hex = if is_encrypted && flow.payload.len() >= self.min_hex_payload {
            self.hex_event(flow.payload, is_inbound)
        } else {
            None
        };

        FormattedEvents { meta, hex }
    }

    fn meta_event(
        &self,
        flow: &Classified<'_>,
        is_encrypted: bool,
        is_inbound: bool,
    ) -> Option<DisplayEvent> {
        let zone = if is_encrypted {
            Zone::MetaEncrypted
        } else {
            Zone::Cleartext
        };
        let mut event = DisplayEvent::empty(self.max_text_len, zone, is_encrypted, is_inbound);
        let mut out = EventWriter {
            event: &mut event,
            color: ColorTag::for_direction(is_inbound),
        };

        // The writer truncates silently and never reports an error.
        let _ = write!(out, "{} {}", flow.protocol.label(), flow.src_addr);
        if flow.src_port > 0 {
            let _ = write!(out, ":{}", flow.src_port);
        }
        let _ = write!(out, " > {}", flow.dst_addr);
        if flow.dst_port > 0 {
            let _ = write!(out, ":{}", flow.dst_port);
        }

        (!event.is_empty()).then_some(event)
    }

    fn hex_event(&self, payload: &[u8], is_inbound: bool) -> Option<DisplayEvent> {
        let color = ColorTag::for_direction(is_inbound);
        let mut event = DisplayEvent::empty(self.max_text_len, Zone::HexPayload, true, is_inbound);

        // n pairs need 3n - 1 characters.
        let pairs = payload.len().min((self.max_text_len + 1) / 3);
        let mut digits = [0u8; HEX_DIGITS_MAX];
        let digits = &mut digits[..pairs * 2];
        hex::encode_to_slice(&payload[..pairs], digits).ok()?;

        for (i, pair) in digits.chunks_exact(2).enumerate() {
            if i > 0 {
                event.push(b' ', color);
            }
            event.push(pair[0], color);
            event.push(pair[1], color);
        }

        (!event.is_empty()).then_some(event)
    }
}

/// Up to two events produced from one frame, meta line first.
#[derive(Debug, Default)]
pub struct FormattedEvents {
    meta: Option<DisplayEvent>,
    hex: Option<DisplayEvent>,
}

impl FormattedEvents {
    pub fn meta(&self) -> Option<&DisplayEvent> {
        self.meta.as_ref()
    }

    pub fn hex(&self) -> Option<&DisplayEvent> {
        self.hex.as_ref()
    }
}

impl Iterator for FormattedEvents {
    type Item = DisplayEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.meta.take().or_else(|| self.hex.take())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::from(self.meta.is_some()) + usize::from(self.hex.is_some());
        (n, Some(n))
    }
}

impl ExactSizeIterator for FormattedEvents {}

#[cfg(test)]
mod tests {
    use super::*;
    use netrain_protocols::Protocol;
    use std::net::Ipv4Addr;

    const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
    const REMOTE: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

    fn formatter() -> EventFormatter {
        let mut registry = LocalAddressRegistry::with_capacity(8);
        registry.insert(LOCAL);
        EventFormatter::new(registry, MAX_EVENT_TEXT, MIN_HEX_PAYLOAD).unwrap()
    }

    fn flow<'a>(
        protocol: Protocol,
        src: (Ipv4Addr, u16),
        dst: (Ipv4Addr, u16),
        payload: &'a [u8],
    ) -> Classified<'a> {
        Classified {
            protocol,
            src_addr: src.0,
            dst_addr: dst.0,
            src_port: src.1,
            dst_port: dst.1,
            payload,
        }
    }

    #[test]
    fn meta_line_layout() {
        let events = formatter().format(&flow(
            Protocol::Tcp,
            (LOCAL, 51514),
            (REMOTE, 443),
            &[],
        ));
        let meta = events.meta().unwrap();
        assert_eq!(meta.text(), "TCP 192.168.1.10:51514 > 93.184.216.34:443");
        assert_eq!(meta.zone(), Zone::MetaEncrypted);
        assert!(meta.is_encrypted());
        assert!(!meta.is_inbound());
        assert!(meta.colors().iter().all(|c| *c == ColorTag::Outbound));
        assert!(events.hex().is_none());
    }

    #[test]
    fn inbound_flows_use_inbound_color() {
        let events = formatter().format(&flow(Protocol::Udp, (REMOTE, 53), (LOCAL, 40000), &[]));
        let meta = events.meta().unwrap();
        assert!(meta.is_inbound());
        assert_eq!(meta.zone(), Zone::Cleartext);
        assert!(meta.colors().iter().all(|c| *c == ColorTag::Inbound));
    }

    #[test]
    fn portless_protocols_omit_port_suffix() {
        let events = formatter().format(&flow(Protocol::Icmp, (REMOTE, 0), (LOCAL, 0), &[]));
        assert_eq!(events.meta().unwrap().text(), "ICMP 93.184.216.34 > 192.168.1.10");

        let events = formatter().format(&flow(Protocol::Other(47), (REMOTE, 0), (LOCAL, 0), &[]));
        assert_eq!(events.meta().unwrap().text(), "IP 93.184.216.34 > 192.168.1.10");
    }

    #[test]
    fn hex_line_for_encrypted_payload() {
        let payload: Vec<u8> = (0..20).collect();
        let events = formatter().format(&flow(Protocol::Tcp, (REMOTE, 443), (LOCAL, 50000), &payload));
        let hex = events.hex().unwrap();
        assert_eq!(
            hex.text(),
            "00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f 10 11 12 13"
        );
        assert_eq!(hex.zone(), Zone::HexPayload);
        assert!(hex.is_inbound());
        assert!(hex.colors().iter().all(|c| *c == ColorTag::Inbound));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn no_hex_below_threshold() {
        let payload = [0xabu8; MIN_HEX_PAYLOAD - 1];
        let events = formatter().format(&flow(Protocol::Tcp, (LOCAL, 50000), (REMOTE, 22), &payload));
        assert!(events.hex().is_none());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn no_hex_for_cleartext_flows() {
        let payload = [0x41u8; 200];
        let events = formatter().format(&flow(Protocol::Tcp, (LOCAL, 50000), (REMOTE, 80), &payload));
        assert!(events.hex().is_none());
    }

    #[test]
    fn hex_never_ends_in_a_partial_pair() {
        let payload = [0xffu8; 200];
        let events = formatter().format(&flow(Protocol::Tcp, (LOCAL, 50000), (REMOTE, 443), &payload));
        let hex = events.hex().unwrap();
        // 85 pairs and 84 separators fit in 255 characters.
        assert_eq!(hex.len(), 254);
        assert!(hex.text().ends_with("ff"));
        assert!(hex.text().split(' ').all(|pair| pair == "ff"));
    }

    #[test]
    fn hex_line_stops_at_last_whole_pair() {
        let mut registry = LocalAddressRegistry::with_capacity(1);
        registry.insert(LOCAL);
        let payload: Vec<u8> = (0xa0..0xb4).collect();

        // 5 pairs take 14 characters; a sixth would need 17.
        let formatter = EventFormatter::new(registry.clone(), 16, MIN_HEX_PAYLOAD).unwrap();
        let events = formatter.format(&flow(Protocol::Tcp, (LOCAL, 50000), (REMOTE, 443), &payload));
        assert_eq!(events.hex().unwrap().text(), "a0 a1 a2 a3 a4");

        // 17 fits six exactly.
        let formatter = EventFormatter::new(registry.clone(), 17, MIN_HEX_PAYLOAD).unwrap();
        let events = formatter.format(&flow(Protocol::Tcp, (LOCAL, 50000), (REMOTE, 443), &payload));
        assert_eq!(events.hex().unwrap().text(), "a0 a1 a2 a3 a4 a5");

        // Too narrow for a single pair.
        let formatter = EventFormatter::new(registry, 1, MIN_HEX_PAYLOAD).unwrap();
        let events = formatter.format(&flow(Protocol::Tcp, (LOCAL, 50000), (REMOTE, 443), &payload));
        assert!(events.hex().is_none());
    }

    #[test]
    fn meta_is_truncated_to_limit() {
        let mut registry = LocalAddressRegistry::with_capacity(1);
        registry.insert(LOCAL);
        let formatter = EventFormatter::new(registry, 16, MIN_HEX_PAYLOAD).unwrap();
        let events = formatter.format(&flow(Protocol::Tcp, (LOCAL, 51514), (REMOTE, 443), &[]));
        assert_eq!(events.meta().unwrap().text(), "TCP 192.168.1.10");
        assert_eq!(events.meta().unwrap().colors().len(), 16);
    }

    #[test]
    fn iterator_yields_meta_then_hex() {
        let payload = [0x16u8; 32];
        let events: Vec<_> = formatter()
            .format(&flow(Protocol::Tcp, (LOCAL, 50000), (REMOTE, 8443), &payload))
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].zone(), Zone::MetaEncrypted);
        assert_eq!(events[1].zone(), Zone::HexPayload);
    }

    #[test]
    fn rejects_out_of_range_text_limit() {
        let registry = LocalAddressRegistry::with_capacity(1);
        assert!(matches!(
            EventFormatter::new(registry, MAX_EVENT_TEXT + 1, MIN_HEX_PAYLOAD),
            Err(CoreError::InvalidTextLimit(_))
        ));
    }
}
