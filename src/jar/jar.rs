//! Jar Module
//!
//! A named cookie holding many encoded entries, with lazy expiry and a
//! write-then-verify capacity check.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::codec::entry::{DAY_MS, MAX_EXPIRY_DAYS};
use crate::codec::{decode_uint, encode_expiry, encode_uint, entries, validate, Entry, Expiry};
use crate::error::{JarError, Result};
use crate::jar::JarStats;
use crate::store::CookieStore;

/// Reserved key holding the jar origin timestamp.
pub const ORIGIN_KEY: &str = "_";

/// Latest origin accepted from the store, 9999-12-31T23:59:59.999Z.
const MAX_ORIGIN_MS: u64 = 253_402_300_799_999;

// == Stored Value ==
/// A live entry as returned by [`Jar::get_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredValue {
    pub value: String,
    /// When the entry expires, `None` = never
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Entry> for StoredValue {
    fn from(entry: Entry) -> Self {
        let expires_at = Some(entry.expires_at_ms)
            .filter(|&ms| ms != 0)
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        Self {
            value: entry.value,
            expires_at,
        }
    }
}

// == Jar ==
/// Packed key/value entries stored under one cookie name.
///
/// `packed` always mirrors what the store last returned for `name`. Keys are
/// kept unique by removing an existing entry before appending its replacement.
pub struct Jar<S: CookieStore> {
    name: String,
    domain: Option<String>,
    /// Reference time for every relative expiry in `packed`
    origin_ms: u64,
    packed: String,
    /// Decoded entries by key, filled by lookups
    cache: HashMap<String, Entry>,
    stats: JarStats,
    store: Rc<RefCell<S>>,
    clock: Rc<dyn Clock>,
}

impl<S: CookieStore> Jar<S> {
    // == Open ==
    /// Loads the jar `name` from the store, writing the origin entry if the
    /// jar is new.
    ///
    /// # Errors
    /// `JarFull` if the store cannot hold even the origin entry.
    pub(crate) fn open(
        name: &str,
        domain: Option<&str>,
        store: Rc<RefCell<S>>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        let now = clock.now_ms();
        let packed = store.borrow().read(name).unwrap_or_default();

        let mut jar = Self {
            name: name.to_string(),
            domain: domain.map(str::to_string),
            origin_ms: now,
            packed,
            cache: HashMap::new(),
            stats: JarStats::new(),
            store,
            clock,
        };

        match jar.stored_origin() {
            Some(origin_ms) => {
                jar.origin_ms = origin_ms;
                debug!("jar {} opened with origin {}", jar.name, origin_ms);
            }
            None => {
                // The origin entry never expires, so `now` is a safe stand-in
                // origin for writing it
                jar.put(ORIGIN_KEY, &encode_uint(now, 0), 0.0)?;
                info!("jar {} created with origin {}", jar.name, now);
            }
        }

        Ok(jar)
    }

    /// Reads the origin entry without touching the cache or evicting anything.
    fn stored_origin(&self) -> Option<u64> {
        entries(&self.packed, self.origin_ms)
            .map_while(|item| item.ok())
            .find(|(_, entry)| entry.key == ORIGIN_KEY)
            .and_then(|(_, entry)| decode_uint(&entry.value).ok())
            .filter(|&origin_ms| origin_ms <= MAX_ORIGIN_MS)
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Origin timestamp (Unix milliseconds) of this jar.
    pub fn origin_ms(&self) -> u64 {
        self.origin_ms
    }

    /// The raw packed string, as last read back from the store.
    pub fn packed(&self) -> &str {
        &self.packed
    }

    pub fn stats(&self) -> JarStats {
        self.stats.clone()
    }

    // == Get ==
    /// Returns the value stored under `key`, if present and not expired.
    ///
    /// A miss scans the whole packed string, caching every live entry and
    /// evicting every expired one.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let now = self.clock.now_ms();

        if let Some(entry) = self.cache.get(key) {
            if !entry.is_expired(now) {
                self.stats.record_hit();
                return Some(entry.value.clone());
            }
            self.cache.remove(key);
        }
        self.stats.record_miss();

        let mut found = None;
        let mut expired = Vec::new();
        for (offset, entry) in self.scan(|_, _| false) {
            if entry.is_expired(now) {
                expired.push((offset, entry));
                continue;
            }
            if entry.key == key {
                found = Some(entry.value.clone());
            }
            self.cache.insert(entry.key.clone(), entry);
        }
        self.evict_all(expired);

        found
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any existing entry.
    ///
    /// # Arguments
    /// * `key` - Entry key, under 16 bytes
    /// * `value` - Entry value, under 256 bytes
    /// * `expiry_days` - Lifetime in days from now; 0 = never expires
    ///
    /// # Errors
    /// - `EntryTooLarge` if the entry cannot be encoded; the jar is untouched.
    /// - `JarFull` if the store truncated the write; the jar is restored to
    ///   its state before the call.
    pub fn set(&mut self, key: &str, value: &str, expiry_days: f64) -> Result<String> {
        if key == ORIGIN_KEY {
            warn!(
                "jar {}: setting {} replaces the origin, expiries rebase on next open",
                self.name, ORIGIN_KEY
            );
        }
        self.put(key, value, expiry_days)
    }

    fn put(&mut self, key: &str, value: &str, expiry_days: f64) -> Result<String> {
        validate(key, value, expiry_days)?;
        let expiry = self.relative_expiry(expiry_days)?;
        let encoded = encode_expiry(key, value, expiry)?;

        let entry = Entry {
            key: key.to_string(),
            value: value.to_string(),
            // Origins are capped at year 9999, far from overflow
            expires_at_ms: expiry.resolve(self.origin_ms).unwrap_or(u64::MAX),
            encoded_len: encoded.len(),
        };

        let saved_packed = self.packed.clone();
        let saved_cache = self.cache.clone();

        self.unset(key);
        self.packed.push_str(&encoded);
        let staged_len = self.packed.len();

        if !self.write_through() {
            let stored_len = self.packed.len();
            self.packed = saved_packed;
            self.cache = saved_cache;
            self.write_through();
            self.stats.record_rollback();
            warn!(
                "jar {} full: store kept {} of {} bytes, write of {} rolled back",
                self.name, stored_len, staged_len, key
            );
            return Err(JarError::JarFull(format!(
                "{} cannot hold {} bytes",
                self.name, staged_len
            )));
        }

        self.cache.insert(key.to_string(), entry);
        Ok(value.to_string())
    }

    // == Unset ==
    /// Removes the entry for `key`. Absent keys are ignored.
    pub fn unset(&mut self, key: &str) {
        let mut visited = self.scan(|entry, _| entry.key == key);
        match visited.pop() {
            Some((offset, entry)) if entry.key == key => self.evict(&entry, offset),
            _ => {
                self.cache.remove(key);
            }
        }
    }

    // == Get All ==
    /// Returns every live entry except the origin entry, evicting expired ones.
    pub fn get_all(&mut self) -> BTreeMap<String, StoredValue> {
        let now = self.clock.now_ms();
        let (expired, live): (Vec<_>, Vec<_>) = self
            .scan(|_, _| false)
            .into_iter()
            .partition(|(_, entry)| entry.is_expired(now));
        self.evict_all(expired);

        live.into_iter()
            .filter(|(_, entry)| entry.key != ORIGIN_KEY)
            .map(|(_, entry)| (entry.key.clone(), StoredValue::from(entry)))
            .collect()
    }

    // == Scan ==
    /// Decodes entries in order until the packed string is consumed or
    /// `stop` returns true. Returns every visited entry with its offset,
    /// including the one that stopped the scan.
    ///
    /// An undecodable entry ends the packed string: the tail from that
    /// offset on is dropped and the repaired string written through.
    fn scan<F>(&mut self, mut stop: F) -> Vec<(usize, Entry)>
    where
        F: FnMut(&Entry, usize) -> bool,
    {
        let mut visited = Vec::new();
        let mut corrupt = None;

        for item in entries(&self.packed, self.origin_ms) {
            match item {
                Ok((offset, entry)) => {
                    let done = stop(&entry, offset);
                    visited.push((offset, entry));
                    if done {
                        break;
                    }
                }
                Err(failure) => corrupt = Some(failure),
            }
        }

        if let Some((offset, cause)) = corrupt {
            warn!(
                "jar {} has a malformed entry at byte {} ({}), dropping {} trailing bytes",
                self.name,
                offset,
                cause,
                self.packed.len() - offset
            );
            self.packed.truncate(offset);
            self.write_through();
        }

        visited
    }

    // == Evict ==
    /// Removes one entry at `offset` and writes the result through.
    fn evict(&mut self, entry: &Entry, offset: usize) {
        self.cut(entry, offset);
        self.write_through();
    }

    /// Removes several entries with a single write. Offsets must come from
    /// one scan, in ascending order.
    fn evict_all(&mut self, victims: Vec<(usize, Entry)>) {
        if victims.is_empty() {
            return;
        }
        debug!("jar {}: evicting {} expired entries", self.name, victims.len());
        for (offset, entry) in victims.iter().rev() {
            self.cut(entry, *offset);
        }
        self.write_through();
    }

    fn cut(&mut self, entry: &Entry, offset: usize) {
        self.packed
            .replace_range(offset..offset + entry.encoded_len, "");
        self.cache.remove(&entry.key);
        self.stats.record_eviction();
    }

    // == Write Through ==
    /// Writes `packed` to the store and adopts what the store reads back.
    ///
    /// Returns false if the store did not keep the value intact.
    fn write_through(&mut self) -> bool {
        let stored = {
            let mut store = self.store.borrow_mut();
            store.write(&self.name, &self.packed, self.domain.as_deref());
            store.read(&self.name).unwrap_or_default()
        };
        let intact = stored == self.packed;
        self.packed = stored;
        intact
    }

    /// Converts a lifetime from now into an expiry relative to the jar
    /// origin, rounded up so the entry lives at least `expiry_days`.
    ///
    /// # Errors
    /// `EntryTooLarge` if the expiry lands 2048 or more days past the origin.
    fn relative_expiry(&self, expiry_days: f64) -> Result<Expiry> {
        if expiry_days == 0.0 {
            return Ok(Expiry::from_days(0.0));
        }
        let elapsed_ms = self.clock.now_ms().saturating_sub(self.origin_ms);
        let lifetime_ms = (expiry_days * DAY_MS as f64).round() as u64;
        let offset_ms = elapsed_ms.saturating_add(lifetime_ms);

        let relative_days = offset_ms as f64 / DAY_MS as f64;
        if relative_days >= MAX_EXPIRY_DAYS {
            return Err(JarError::EntryTooLarge(format!(
                "expiry lands {:.2} days after the origin of {}, must be under {}",
                relative_days, self.name, MAX_EXPIRY_DAYS
            )));
        }
        Ok(Expiry::covering(offset_ms))
    }
}
