use std::collections::HashMap;
use std::sync::Arc;

use quiver_array::ArrayRef;
use quiver_error::{QuiverResult, quiver_bail, quiver_err};

/// The dictionaries of one reader or writer session, keyed by id.
///
/// A writer assigns ids with [`DictionaryMemo::get_or_assign_id`]: every distinct dictionary
/// instance, identified by pointer, receives the next id the first time it is seen and keeps
/// it for the life of the memo. A reader registers each dictionary batch it decodes with
/// [`DictionaryMemo::add_dictionary`], so that every field referencing an id resolves to the
/// one shared instance.
#[derive(Debug, Default, Clone)]
pub struct DictionaryMemo {
    dictionaries: Vec<(i64, ArrayRef)>,
    by_id: HashMap<i64, usize>,
    by_ptr: HashMap<usize, usize>,
    next_id: i64,
}

impl DictionaryMemo {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of `dictionary`, assigning the next free id if this instance has not been seen.
    pub fn get_or_assign_id(&mut self, dictionary: &ArrayRef) -> i64 {
        if let Some(index) = self.by_ptr.get(&ptr_key(dictionary)) {
            return self.dictionaries[*index].0;
        }
        let id = self.next_id;
        self.insert(id, dictionary.clone());
        id
    }

    /// The id previously assigned to `dictionary`.
    pub fn get_id(&self, dictionary: &ArrayRef) -> QuiverResult<i64> {
        self.by_ptr
            .get(&ptr_key(dictionary))
            .map(|index| self.dictionaries[*index].0)
            .ok_or_else(|| quiver_err!("dictionary has not been assigned an id"))
    }

    /// Register the dictionary decoded for `id`.
    pub fn add_dictionary(&mut self, id: i64, dictionary: ArrayRef) -> QuiverResult<()> {
        if self.by_id.contains_key(&id) {
            quiver_bail!(InvalidFormat: "dictionary {} is registered twice", id)
        }
        log::debug!(
            "registered dictionary {} with {} values of type {}",
            id,
            dictionary.len(),
            dictionary.dtype()
        );
        self.insert(id, dictionary);
        Ok(())
    }

    /// The dictionary registered for `id`.
    pub fn get_dictionary(&self, id: i64) -> QuiverResult<&ArrayRef> {
        self.by_id
            .get(&id)
            .map(|index| &self.dictionaries[*index].1)
            .ok_or_else(|| quiver_err!(InvalidFormat: "dictionary {} has not been registered", id))
    }

    /// Whether a dictionary is registered for `id`.
    pub fn has_dictionary(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// The number of dictionaries.
    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    /// Whether the memo holds no dictionaries.
    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }

    /// The dictionaries in the order their ids were assigned or registered.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &ArrayRef)> + '_ {
        self.dictionaries.iter().map(|(id, dict)| (*id, dict))
    }

    fn insert(&mut self, id: i64, dictionary: ArrayRef) {
        let index = self.dictionaries.len();
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.by_id.insert(id, index);
        self.by_ptr.insert(ptr_key(&dictionary), index);
        self.dictionaries.push((id, dictionary));
    }
}

// The memo holds a reference to every dictionary it has seen, so an address cannot be reused
// by another dictionary while it is a key here.
fn ptr_key(dictionary: &ArrayRef) -> usize {
    Arc::as_ptr(dictionary) as usize
}
