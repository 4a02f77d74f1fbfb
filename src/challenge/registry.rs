#![allow(deprecated)]

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use log::debug;

use super::{
    Challenge, Dns01Challenge, Http01Challenge, OutOfBand01Challenge, TlsSni01Challenge,
    TlsSni02Challenge,
};
use crate::session::Session;

/// Builds a fresh challenge bound to the given session.
pub type ChallengeConstructor = fn(Arc<Session>) -> Box<dyn Challenge>;

struct Registration {
    challenge_type: &'static str,
    construct: ChallengeConstructor,
}

fn dns01(session: Arc<Session>) -> Box<dyn Challenge> {
    Box::new(Dns01Challenge::new(session))
}

fn http01(session: Arc<Session>) -> Box<dyn Challenge> {
    Box::new(Http01Challenge::new(session))
}

fn oob01(session: Arc<Session>) -> Box<dyn Challenge> {
    Box::new(OutOfBand01Challenge::new(session))
}

fn tls_sni01(session: Arc<Session>) -> Box<dyn Challenge> {
    Box::new(TlsSni01Challenge::new(session))
}

fn tls_sni02(session: Arc<Session>) -> Box<dyn Challenge> {
    Box::new(TlsSni02Challenge::new(session))
}

const BUILTIN: &[Registration] = &[
    Registration {
        challenge_type: Dns01Challenge::TYPE,
        construct: dns01,
    },
    Registration {
        challenge_type: Http01Challenge::TYPE,
        construct: http01,
    },
    Registration {
        challenge_type: OutOfBand01Challenge::TYPE,
        construct: oob01,
    },
    Registration {
        challenge_type: TlsSni01Challenge::TYPE,
        construct: tls_sni01,
    },
    Registration {
        challenge_type: TlsSni02Challenge::TYPE,
        construct: tls_sni02,
    },
];

/// Maps challenge type identifiers to constructors.
///
/// The process-wide instance is built from a fixed table on first use and is
/// read-only afterwards, so concurrent lookups need no locking.
pub struct ChallengeRegistry {
    constructors: HashMap<&'static str, ChallengeConstructor>,
}

impl ChallengeRegistry {
    pub fn global() -> &'static ChallengeRegistry {
        static REGISTRY: OnceLock<ChallengeRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| ChallengeRegistry::from_table(BUILTIN))
    }

    /// Panics on a duplicate identifier: the table is broken and startup must
    /// not continue.
    fn from_table(table: &[Registration]) -> Self {
        let mut constructors = HashMap::with_capacity(table.len());
        for registration in table {
            if constructors
                .insert(registration.challenge_type, registration.construct)
                .is_some()
            {
                panic!(
                    "duplicate challenge type registered: {}",
                    registration.challenge_type
                );
            }
        }
        debug!(
            "[acme-challenge] registry built with {} challenge types",
            constructors.len()
        );
        Self { constructors }
    }

    /// A new challenge of `challenge_type` bound to `session`, or `None` when
    /// the type is not supported.
    pub fn create(
        &self,
        session: &Arc<Session>,
        challenge_type: &str,
    ) -> Option<Box<dyn Challenge>> {
        let Some(construct) = self.constructors.get(challenge_type) else {
            debug!("[acme-challenge] no challenge registered for type {challenge_type:?}");
            return None;
        };
        Some(construct(Arc::clone(session)))
    }

    pub fn contains(&self, challenge_type: &str) -> bool {
        self.constructors.contains_key(challenge_type)
    }

    /// Registered identifiers, sorted.
    pub fn types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.constructors.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

/// Shorthand for [`ChallengeRegistry::global`]`.create(..)`.
pub fn create_challenge(session: &Arc<Session>, challenge_type: &str) -> Option<Box<dyn Challenge>> {
    ChallengeRegistry::global().create(session, challenge_type)
}
