//! Addresses owned by this host, used to tell inbound from outbound traffic.

use std::net::Ipv4Addr;

/// Small bounded set of local IPv4 addresses.
///
/// Populated once before the capture thread starts and read-only afterwards.
#[derive(Clone, Debug)]
pub struct LocalAddressRegistry {
    addrs: Vec<Ipv4Addr>,
    capacity: usize,
}

impl LocalAddressRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            addrs: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds an address. Returns false when it is already known or the registry is full.
    pub fn insert(&mut self, addr: Ipv4Addr) -> bool {
        if self.addrs.len() >= self.capacity || self.addrs.contains(&addr) {
            return false;
        }
        self.addrs.push(addr);
        true
    }

    #[inline]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.addrs.contains(&addr)
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ipv4Addr> {
        self.addrs.iter()
    }
}

impl Extend<Ipv4Addr> for LocalAddressRegistry {
    fn extend<T: IntoIterator<Item = Ipv4Addr>>(&mut self, iter: T) {
        for addr in iter {
            self.insert(addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_inserted_addresses() {
        let mut registry = LocalAddressRegistry::with_capacity(4);
        assert!(registry.insert(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(registry.contains(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(!registry.contains(Ipv4Addr::new(10, 0, 0, 6)));
    }

    #[test]
    fn ignores_duplicates() {
        let mut registry = LocalAddressRegistry::with_capacity(4);
        assert!(registry.insert(Ipv4Addr::LOCALHOST));
        assert!(!registry.insert(Ipv4Addr::LOCALHOST));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stops_at_capacity() {
        let mut registry = LocalAddressRegistry::with_capacity(2);
        registry.extend((1..=5).map(|i| Ipv4Addr::new(172, 16, 0, i)));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(Ipv4Addr::new(172, 16, 0, 2)));
        assert!(!registry.contains(Ipv4Addr::new(172, 16, 0, 3)));
    }
}
