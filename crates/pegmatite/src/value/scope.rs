//! Rule scopes: the named values visible to actions.
//!
//! A scope starts in a compact fixed-capacity representation and promotes
//! itself to a hash map the first time it overflows. Consumers only see
//! `get`/`set`.

use crate::value::Value;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Entries held inline before promoting to a map.
const COMPACT_CAP: usize = 5;

#[derive(Debug)]
struct Entry {
    name: &'static str,
    value: Option<Value>,
}

#[derive(Debug)]
enum Repr {
    Compact(SmallVec<[Entry; COMPACT_CAP]>),
    Map(HashMap<&'static str, Option<Value>, ahash::RandomState>),
}

/// The set of named values gathered in the current rule scope.
///
/// Names correspond to [`named`](crate::named) rules observed since the
/// scope was opened. `get` returns `None` both for absent names and for
/// names whose rule produced no value.
#[derive(Debug)]
pub struct Values {
    repr: Repr,
}

impl Values {
    pub(crate) fn new() -> Self {
        Self {
            repr: Repr::Compact(SmallVec::new()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match &self.repr {
            Repr::Compact(entries) => entries
                .iter()
                .find(|e| e.name == name)
                .and_then(|e| e.value.as_ref()),
            Repr::Map(map) => map.get(name).and_then(|v| v.as_ref()),
        }
    }

    pub(crate) fn set(&mut self, name: &'static str, value: Option<Value>) {
        match &mut self.repr {
            Repr::Compact(entries) => {
                if entries.len() < COMPACT_CAP {
                    entries.push(Entry { name, value });
                } else {
                    let mut map: HashMap<_, _, ahash::RandomState> =
                        HashMap::with_capacity_and_hasher(
                            COMPACT_CAP + 1,
                            ahash::RandomState::new(),
                        );
                    for entry in entries.drain(..) {
                        map.insert(entry.name, entry.value);
                    }
                    map.insert(name, value);
                    self.repr = Repr::Map(map);
                }
            }
            Repr::Map(map) => {
                map.insert(name, value);
            }
        }
    }
}
