//! Keyed lookups and the progressive left join used by the fact builder.

use std::{collections::HashMap, fmt::Display, hash::Hash};

use sales_extract::TableKind;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EtlError;

/// What to do when a join's right-hand table repeats a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Reject the input with [`EtlError::DuplicateKey`]. Keeps the fact
    /// table at exactly one row per order detail.
    #[default]
    Validate,
    /// Let the join fan out into one row per match, like a SQL left join.
    FanOut,
}

/// Rows of one right-hand table, grouped by key.
#[derive(Debug)]
pub struct KeyIndex<'a, K, R> {
    by_key: HashMap<K, Vec<&'a R>>,
}

impl<'a, K, R> KeyIndex<'a, K, R>
where
    K: Eq + Hash + Display,
{
    /// Index `rows` by `key`. Under [`KeyPolicy::Validate`] a repeated key is
    /// an error.
    pub fn build(
        table: TableKind,
        rows: &'a [R],
        key: impl Fn(&R) -> K,
        policy: KeyPolicy,
    ) -> Result<Self, EtlError> {
        let mut by_key: HashMap<K, Vec<&'a R>> = HashMap::with_capacity(rows.len());
        for row in rows {
            let k = key(row);
            let slot = by_key.entry(k).or_default();
            if !slot.is_empty() && policy == KeyPolicy::Validate {
                return Err(EtlError::DuplicateKey {
                    table,
                    key: key(row).to_string(),
                });
            }
            slot.push(row);
        }

        let duplicated = by_key.values().filter(|v| v.len() > 1).count();
        if duplicated > 0 {
            warn!(%table, keys = duplicated, "duplicate join keys; rows will fan out");
        }
        Ok(Self { by_key })
    }
}

impl<'a, K: Eq + Hash, R> KeyIndex<'a, K, R> {
    /// All rows under `key`; empty when there is none.
    pub fn get(&self, key: &K) -> &[&'a R] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Left-join `left` against `index`.
///
/// Rows whose key is `None` pass through untouched. Rows with a key but no
/// match also pass through, and are counted in the returned total. A key
/// with several matches emits one copy of the row per match. Left order is
/// preserved.
pub fn left_join<'r, A, K, R>(
    left: Vec<A>,
    index: &KeyIndex<'r, K, R>,
    key: impl Fn(&A) -> Option<K>,
    mut attach: impl FnMut(&mut A, &'r R),
) -> (Vec<A>, usize)
where
    A: Clone,
    K: Eq + Hash,
{
    let mut out = Vec::with_capacity(left.len());
    let mut unmatched = 0;

    for mut row in left {
        let Some(k) = key(&row) else {
            out.push(row);
            continue;
        };
        match index.get(&k) {
            [] => {
                unmatched += 1;
                out.push(row);
            }
            [only] => {
                attach(&mut row, *only);
                out.push(row);
            }
            many => {
                for &r in many {
                    let mut copy = row.clone();
                    attach(&mut copy, r);
                    out.push(copy);
                }
            }
        }
    }

    (out, unmatched)
}
