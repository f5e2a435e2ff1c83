//! ## netrain-protocols::ports
//! Well-known ports whose traffic is assumed to be encrypted.

/// Ports treated as carrying encrypted sessions.
pub const ENCRYPTED_PORTS: [u16; 11] = [
    443,  // HTTPS
    22,   // SSH
    993,  // IMAPS
    995,  // POP3S
    465,  // SMTPS
    587,  // SMTP submission (STARTTLS)
    853,  // DNS over TLS
    636,  // LDAPS
    989,  // FTPS data
    990,  // FTPS control
    8443, // HTTPS alt
];

#[inline]
pub fn is_encrypted_port(port: u16) -> bool {
    matches!(
        port,
        443 | 22 | 993 | 995 | 465 | 587 | 853 | 636 | 989 | 990 | 8443
    )
}

/// A flow is encrypted when either endpoint sits on an encrypted port.
#[inline]
pub fn is_encrypted_flow(src_port: u16, dst_port: u16) -> bool {
    is_encrypted_port(src_port) || is_encrypted_port(dst_port)
}
