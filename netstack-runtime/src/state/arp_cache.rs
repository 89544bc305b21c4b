use netstack_packets::MacAddr;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    Invalid,
    Valid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArpEntry {
    pub ipv4_addr: Ipv4Addr,
    pub mac_addr: MacAddr,
    pub state: EntryState,
    /// When the entry was last written, None for a slot that never has been.
    pub updated_at: Option<Instant>,
}

impl ArpEntry {
    const EMPTY: ArpEntry = ArpEntry {
        ipv4_addr: Ipv4Addr::UNSPECIFIED,
        mac_addr: MacAddr::UNSPECIFIED,
        state: EntryState::Invalid,
        updated_at: None,
    };

    pub fn is_valid(&self) -> bool {
        self.state == EntryState::Valid
    }
}

/// Where `ArpCache::update` put its entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheUpdate {
    /// An entry for the same address was rewritten in place.
    Refreshed(usize),
    /// An unused slot was filled.
    Inserted(usize),
    /// The cache was full; the least recently updated entry, for the given address, gave way.
    Evicted(usize, Ipv4Addr),
}

impl CacheUpdate {
    pub fn slot(&self) -> usize {
        match *self {
            CacheUpdate::Refreshed(slot) | CacheUpdate::Inserted(slot) => slot,
            CacheUpdate::Evicted(slot, _) => slot,
        }
    }
}

/// Fixed size IPv4 to MAC table. Entries age out `timeout` after their last update, but expiry
/// is only applied by the sweep at the start of every update: between updates a lookup can still
/// return an entry older than the timeout.
#[derive(Clone, Debug)]
pub struct ArpCache {
    entries: Vec<ArpEntry>,
    timeout: Duration,
}

impl ArpCache {
    pub fn new(capacity: usize, timeout: Duration) -> ArpCache {
        ArpCache {
            entries: vec![ArpEntry::EMPTY; capacity],
            timeout,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ArpEntry] {
        &self.entries
    }

    /// Number of entries currently resolving an address
    pub fn valid_len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_valid()).count()
    }

    /// Marks every slot unused.
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = ArpEntry::EMPTY;
        }
    }

    /// Invalidates every entry older than the timeout and returns how many there were.
    pub fn expire(&mut self, now: Instant) -> usize {
        let timeout = self.timeout;
        let mut expired = 0;
        for entry in self.entries.iter_mut().filter(|entry| entry.is_valid()) {
            let stale = entry
                .updated_at
                .map_or(true, |at| now.saturating_duration_since(at) >= timeout);
            if stale {
                entry.state = EntryState::Invalid;
                expired += 1;
            }
        }
        expired
    }

    /// Records `mac_addr` for `ipv4_addr`.
    ///
    /// After sweeping expired entries, a valid entry for the same address is rewritten in place.
    /// Otherwise the first invalid slot is used, and when there is none the least recently
    /// updated entry is replaced, ties going to the lowest slot.
    pub fn update(
        &mut self,
        ipv4_addr: Ipv4Addr,
        mac_addr: MacAddr,
        state: EntryState,
        now: Instant,
    ) -> CacheUpdate {
        self.expire(now);

        let entry = ArpEntry {
            ipv4_addr,
            mac_addr,
            state,
            updated_at: Some(now),
        };

        if let Some(slot) = self
            .entries
            .iter()
            .position(|e| e.is_valid() && e.ipv4_addr == ipv4_addr)
        {
            self.entries[slot] = entry;
            return CacheUpdate::Refreshed(slot);
        }

        if let Some(slot) = self.entries.iter().position(|e| !e.is_valid()) {
            self.entries[slot] = entry;
            return CacheUpdate::Inserted(slot);
        }

        // Every slot is valid here, so each one carries a timestamp
        let slot = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.updated_at)
            .map(|(slot, _)| slot)
            .unwrap_or(0);
        let previous = self.entries[slot].ipv4_addr;
        self.entries[slot] = entry;
        CacheUpdate::Evicted(slot, previous)
    }

    /// The hardware address of the valid entry for `ipv4_addr`. Age isn't checked here.
    pub fn lookup(&self, ipv4_addr: Ipv4Addr) -> Option<MacAddr> {
        self.entries
            .iter()
            .find(|e| e.is_valid() && e.ipv4_addr == ipv4_addr)
            .map(|e| e.mac_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn mac(last: u8) -> MacAddr {
        MacAddr::new([0x02, 0, 0, 0, 0, last])
    }

    const TIMEOUT: Duration = Duration::from_secs(300);

    #[test]
    fn starts_empty() {
        let cache = ArpCache::new(4, TIMEOUT);
        assert_eq!(cache.capacity(), 4);
        assert_eq!(cache.valid_len(), 0);
        assert_eq!(cache.lookup(Ipv4Addr::UNSPECIFIED), None);
    }

    #[test]
    fn update_then_lookup() {
        let now = Instant::now();
        let mut cache = ArpCache::new(4, TIMEOUT);
        assert_eq!(
            cache.update(ip(1), mac(1), EntryState::Valid, now),
            CacheUpdate::Inserted(0)
        );
        assert_eq!(
            cache.update(ip(2), mac(2), EntryState::Valid, now),
            CacheUpdate::Inserted(1)
        );
        assert_eq!(cache.lookup(ip(1)), Some(mac(1)));
        assert_eq!(cache.lookup(ip(2)), Some(mac(2)));
        assert_eq!(cache.lookup(ip(3)), None);
    }

    #[test]
    fn refreshes_existing_address_in_place() {
        let now = Instant::now();
        let mut cache = ArpCache::new(4, TIMEOUT);
        cache.update(ip(1), mac(1), EntryState::Valid, now);
        cache.update(ip(2), mac(2), EntryState::Valid, now);

        let later = now + Duration::from_secs(10);
        assert_eq!(
            cache.update(ip(1), mac(9), EntryState::Valid, later),
            CacheUpdate::Refreshed(0)
        );
        assert_eq!(cache.valid_len(), 2);
        assert_eq!(cache.lookup(ip(1)), Some(mac(9)));
        assert_eq!(cache.entries()[0].updated_at, Some(later));
    }

    #[test]
    fn evicts_least_recently_updated() {
        let start = Instant::now();
        let mut cache = ArpCache::new(3, TIMEOUT);
        for n in 0..3u8 {
            cache.update(
                ip(n),
                mac(n),
                EntryState::Valid,
                start + Duration::from_secs(u64::from(n)),
            );
        }
        // Refreshing the oldest makes the second entry the eviction candidate
        cache.update(ip(0), mac(0), EntryState::Valid, start + Duration::from_secs(5));

        let now = start + Duration::from_secs(6);
        assert_eq!(
            cache.update(ip(7), mac(7), EntryState::Valid, now),
            CacheUpdate::Evicted(1, ip(1))
        );
        assert_eq!(cache.lookup(ip(1)), None);
        assert_eq!(cache.lookup(ip(7)), Some(mac(7)));
        assert_eq!(cache.valid_len(), 3);
    }

    #[test]
    fn eviction_ties_go_to_lowest_slot() {
        let now = Instant::now();
        let mut cache = ArpCache::new(2, TIMEOUT);
        cache.update(ip(1), mac(1), EntryState::Valid, now);
        cache.update(ip(2), mac(2), EntryState::Valid, now);
        assert_eq!(
            cache.update(ip(3), mac(3), EntryState::Valid, now).slot(),
            0
        );
    }

    #[test]
    fn expiry_waits_for_a_sweep() {
        let start = Instant::now();
        let mut cache = ArpCache::new(2, TIMEOUT);
        cache.update(ip(1), mac(1), EntryState::Valid, start);

        assert_eq!(cache.expire(start + TIMEOUT - Duration::from_secs(1)), 0);
        // Stale, but nothing has swept it yet
        assert_eq!(cache.lookup(ip(1)), Some(mac(1)));

        assert_eq!(cache.expire(start + TIMEOUT), 1);
        assert!(!cache.entries()[0].is_valid());
        assert_eq!(cache.lookup(ip(1)), None);
    }

    #[test]
    fn any_update_sweeps() {
        let start = Instant::now();
        let mut cache = ArpCache::new(4, TIMEOUT);
        cache.update(ip(1), mac(1), EntryState::Valid, start);
        cache.update(ip(2), mac(2), EntryState::Valid, start + TIMEOUT);
        assert_eq!(cache.lookup(ip(1)), None);
        assert_eq!(cache.valid_len(), 1);
    }

    #[test]
    fn update_sweeps_then_reuses_expired_slot() {
        let start = Instant::now();
        let mut cache = ArpCache::new(2, TIMEOUT);
        cache.update(ip(1), mac(1), EntryState::Valid, start);
        cache.update(ip(2), mac(2), EntryState::Valid, start + Duration::from_secs(200));

        let now = start + Duration::from_secs(301);
        assert_eq!(
            cache.update(ip(3), mac(3), EntryState::Valid, now),
            CacheUpdate::Inserted(0)
        );
        assert_eq!(cache.lookup(ip(2)), Some(mac(2)));
    }

    #[test]
    fn invalid_updates_never_resolve() {
        let now = Instant::now();
        let mut cache = ArpCache::new(2, TIMEOUT);
        cache.update(ip(1), mac(1), EntryState::Valid, now);
        assert_eq!(
            cache.update(ip(1), mac(1), EntryState::Invalid, now),
            CacheUpdate::Refreshed(0)
        );
        assert_eq!(cache.lookup(ip(1)), None);
    }

    #[test]
    fn clear_forgets_everything() {
        let now = Instant::now();
        let mut cache = ArpCache::new(2, TIMEOUT);
        cache.update(ip(1), mac(1), EntryState::Valid, now);
        cache.clear();
        assert_eq!(cache.valid_len(), 0);
        assert_eq!(cache.lookup(ip(1)), None);
    }
}
