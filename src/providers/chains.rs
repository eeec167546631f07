//! Built-in chain definitions: which protocol each operator speaks and its branch table.

use crate::types::{Location, LocationTable, ProviderKind};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy)]
pub enum StaticKey {
    Numeric(i64),
    Opaque(&'static str),
}

#[derive(Debug)]
pub struct ChainDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: ProviderKind,
    pub timezone: Tz,
    /// `(stable id, provider-local key, display name)`
    pub locations: &'static [(u32, StaticKey, &'static str)],
}

impl ChainDefinition {
    pub fn location_table(&self, extra: &[Location]) -> LocationTable {
        let builtin = self.locations.iter().map(|(id, key, name)| match key {
            StaticKey::Numeric(n) => Location::new(*id, *n, *name),
            StaticKey::Opaque(s) => Location::new(*id, *s, *name),
        });
        LocationTable::new(builtin.chain(extra.iter().cloned()))
    }
}

use StaticKey::{Numeric, Opaque};

pub static CHAIN_DEFINITIONS: &[ChainDefinition] = &[
    ChainDefinition {
        id: "sit",
        name: "Sit Trening",
        provider: ProviderKind::Ibooking,
        timezone: Tz::Europe__Oslo,
        locations: &[
            (1, Numeric(306), "Gløshaugen"),
            (2, Numeric(307), "Dragvoll"),
            (3, Numeric(308), "Portalen"),
            (4, Numeric(402), "DMMH"),
            (5, Numeric(540), "Moholt"),
        ],
    },
    ChainDefinition {
        id: "3t",
        name: "3T",
        provider: ProviderKind::Brp,
        timezone: Tz::Europe__Oslo,
        locations: &[
            (1, Numeric(1), "Midtbyen"),
            (2, Numeric(2), "Rosten"),
            (3, Numeric(8), "Ranheim"),
            (4, Numeric(9), "Byåsen"),
            (5, Numeric(12), "Leangen"),
        ],
    },
    ChainDefinition {
        id: "fsc",
        name: "Fresh Fitness / FSC",
        provider: ProviderKind::Brp,
        timezone: Tz::Europe__Oslo,
        locations: &[
            (1, Numeric(3), "Sentrum"),
            (2, Numeric(4), "Lade"),
            (3, Numeric(6), "Tiller"),
        ],
    },
    ChainDefinition {
        id: "sats",
        name: "SATS",
        provider: ProviderKind::Sats,
        timezone: Tz::Europe__Oslo,
        locations: &[
            (1, Opaque("sats-majorstuen"), "Majorstuen"),
            (2, Opaque("sats-storo"), "Storo"),
            (3, Opaque("sats-solsiden"), "Trondheim Solsiden"),
            (4, Opaque("sats-bergen-sentrum"), "Bergen Sentrum"),
        ],
    },
];

pub fn definition(id: &str) -> Option<&'static ChainDefinition> {
    CHAIN_DEFINITIONS.iter().find(|d| d.id == id)
}
