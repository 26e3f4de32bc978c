use std::collections::HashMap;

/// Bookkeeping for one registered peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Monotonic registration counter. Orders the peer list handed out by the registry.
    pub sequence: u64,
    /// Timestamp (ms) of the first registration.
    pub registered_at: u64,
}

/// Port-keyed table of registered peers.
///
/// Only ports are tracked: every peer is assumed to share the registry's host.
#[derive(Debug, Default)]
pub struct RegistryTable {
    entries: HashMap<u16, Registration>,
    next_sequence: u64,
}

impl RegistryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `port` unless it is already present. Returns `true` on first registration.
    pub fn insert(&mut self, port: u16, now_ms: u64) -> bool {
        if self.entries.contains_key(&port) {
            return false;
        }

        let registration = Registration {
            sequence: self.next_sequence,
            registered_at: now_ms,
        };
        self.next_sequence += 1;
        self.entries.insert(port, registration);

        true
    }

    /// Every registered port, in registration order.
    pub fn ports(&self) -> Vec<u16> {
        let mut ordered: Vec<(u64, u16)> = self
            .entries
            .iter()
            .map(|(port, registration)| (registration.sequence, *port))
            .collect();

        ordered.sort_unstable();
        ordered.into_iter().map(|(_, port)| port).collect()
    }

    /// All registered ports except `port`, in registration order.
    pub fn others(&self, port: u16) -> Vec<u16> {
        self.ports()
            .into_iter()
            .filter(|registered| *registered != port)
            .collect()
    }

    pub fn get(&self, port: u16) -> Option<&Registration> {
        self.entries.get(&port)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
