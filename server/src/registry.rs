//! Keyed store of active sessions and room-code allocation
//!
//! Codes are four decimal digits, which keeps them easy to read out loud.
//! Allocation retries until the generated code is free, so uniqueness among
//! live sessions is guaranteed rather than assumed from the size of the code
//! space.

use crate::session::Session;
use log::info;
use rand::Rng;
use shared::ConnId;
use std::collections::HashMap;

const CODE_MIN: u32 = 1000;
const CODE_MAX: u32 = 10000;

/// All live sessions, keyed by room code.
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Creates a session for the given host and returns its freshly
    /// allocated room code.
    pub fn create(&mut self, host: ConnId) -> String {
        let code = self.allocate_code();
        info!("Room {} created by connection {}", code, host);
        self.sessions
            .insert(code.clone(), Session::new(code.clone(), host));
        code
    }

    fn allocate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code = rng.gen_range(CODE_MIN..CODE_MAX).to_string();
            if !self.sessions.contains_key(&code) {
                return code;
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&Session> {
        self.sessions.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Session> {
        self.sessions.get_mut(code)
    }

    /// Tears a session down. Its code becomes invalid immediately; later
    /// lookups fail until a new session happens to draw the same code.
    pub fn remove(&mut self, code: &str) -> Option<Session> {
        let session = self.sessions.remove(code);
        if session.is_some() {
            info!("Room {} removed", code);
        }
        session
    }

    /// Iterates over all live sessions mutably, for disconnect sweeps.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_registers_a_session() {
        let mut registry = SessionRegistry::new();

        let code = registry.create(1);

        assert_eq!(registry.len(), 1);
        let session = registry.get(&code).unwrap();
        assert_eq!(session.code(), code);
        assert_eq!(session.host(), 1);
    }

    #[test]
    fn test_codes_are_four_digits() {
        let mut registry = SessionRegistry::new();

        for host in 0..50 {
            let code = registry.create(host);
            assert_eq!(code.len(), 4);
            let numeric: u32 = code.parse().unwrap();
            assert!((CODE_MIN..CODE_MAX).contains(&numeric));
        }
    }

    #[test]
    fn test_codes_are_unique_among_live_sessions() {
        let mut registry = SessionRegistry::new();
        let mut codes = std::collections::HashSet::new();

        for host in 0..200 {
            let code = registry.create(host);
            assert!(codes.insert(code), "duplicate room code allocated");
        }
    }

    #[test]
    fn test_lookup_unknown_code_fails() {
        let registry = SessionRegistry::new();
        assert!(registry.get("0000").is_none());
    }

    #[test]
    fn test_remove_invalidates_the_code() {
        let mut registry = SessionRegistry::new();
        let code = registry.create(1);

        let removed = registry.remove(&code);

        assert!(removed.is_some());
        assert!(registry.get(&code).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_code_is_a_no_op() {
        let mut registry = SessionRegistry::new();
        registry.create(1);

        assert!(registry.remove("not-a-code").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_mut_allows_session_operations() {
        let mut registry = SessionRegistry::new();
        let code = registry.create(1);

        let session = registry.get_mut(&code).unwrap();
        session.join(2, "Ann".to_string());

        assert_eq!(registry.get(&code).unwrap().roster().len(), 1);
    }
}
