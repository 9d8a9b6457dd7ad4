// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized list state from snapshot load and WAL replay

use rl_core::{ListError, Record};
use std::collections::BTreeMap;

/// Every named list and its values, in append order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    lists: BTreeMap<String, Vec<i64>>,
}

impl ListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lists(lists: BTreeMap<String, Vec<i64>>) -> Self {
        Self { lists }
    }

    pub fn lists(&self) -> &BTreeMap<String, Vec<i64>> {
        &self.lists
    }

    pub fn into_lists(self) -> BTreeMap<String, Vec<i64>> {
        self.lists
    }

    /// Push a value onto the tail, creating the list if absent
    pub fn append(&mut self, list_id: &str, value: i64) {
        match self.lists.get_mut(list_id) {
            Some(values) => values.push(value),
            None => {
                self.lists.insert(list_id.to_string(), vec![value]);
            }
        }
    }

    /// The value a remove would return, without removing it
    pub fn peek_tail(&self, list_id: &str) -> Result<i64, ListError> {
        let values = self
            .lists
            .get(list_id)
            .ok_or_else(|| ListError::not_found(list_id))?;
        values
            .last()
            .copied()
            .ok_or_else(|| ListError::empty(list_id))
    }

    /// Pop the tail value
    ///
    /// An emptied list stays in the map; only its values go.
    pub fn remove(&mut self, list_id: &str) -> Result<i64, ListError> {
        let values = self
            .lists
            .get_mut(list_id)
            .ok_or_else(|| ListError::not_found(list_id))?;
        values.pop().ok_or_else(|| ListError::empty(list_id))
    }

    pub fn get(&self, list_id: &str, index: i64) -> Result<i64, ListError> {
        let values = self
            .lists
            .get(list_id)
            .ok_or_else(|| ListError::not_found(list_id))?;
        usize::try_from(index)
            .ok()
            .and_then(|i| values.get(i))
            .copied()
            .ok_or_else(|| ListError::out_of_range(list_id, index, values.len()))
    }

    pub fn size(&self, list_id: &str) -> Result<usize, ListError> {
        self.lists
            .get(list_id)
            .map(Vec::len)
            .ok_or_else(|| ListError::not_found(list_id))
    }

    /// Apply a replayed record
    ///
    /// A remove against a missing or empty list is reported and leaves the
    /// state untouched.
    pub fn apply(&mut self, record: &Record) -> Result<(), ListError> {
        match record {
            Record::Append { list_id, value } => {
                self.append(list_id, *value);
                Ok(())
            }
            Record::Remove { list_id } => self.remove(list_id).map(|_| ()),
        }
    }

    /// Number of lists, including emptied ones
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Total number of values across all lists
    pub fn element_count(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
