use crate::name::ShortNames;
use crate::tag::KindMap;
use crate::tag::Occurrence;
use crate::tag::TagKind;
use crate::tag::TagRecord;
use parking_lot::Mutex;
use std::path::Path;

#[derive(Default)]
struct RegistryState {
  records: KindMap<TagRecord>,
  next_discovered: u64,
}

/// Shared store of every id and class seen while collecting.
///
/// All access goes through one mutex, so `add` may be called from any number
/// of collection tasks at once. Once collection is over the registry is
/// pruned, ordered and turned into a [`RenameTable`] by [`assign_names`],
/// which consumes it.
///
/// [`assign_names`]: TagRegistry::assign_names
#[derive(Default)]
pub struct TagRegistry {
  state: Mutex<RegistryState>,
}

impl TagRegistry {
  pub fn new() -> TagRegistry {
    TagRegistry::default()
  }

  /// Records one occurrence of `name` found in `file`.
  ///
  /// An unknown identifier only gets a record when the occurrence is
  /// authoritative. A known identifier always gains `name.len()` weight, and
  /// stops being single-file as soon as any file other than its first one
  /// mentions it, whatever the occurrence strength.
  pub fn add(&self, kind: TagKind, name: &str, file: &Path, occurrence: Occurrence) {
    let mut state = self.state.lock();
    let state = &mut *state;
    let records = state.records.of_mut(kind);
    if let Some(record) = records.get_mut(name) {
      record.weight += name.len();
      if record.single_file && record.first_file != file {
        record.single_file = false;
      }
      return;
    }
    if occurrence == Occurrence::Referential {
      return;
    }
    let discovered = state.next_discovered;
    state.next_discovered += 1;
    state.records.of_mut(kind).insert(
      name.to_string(),
      TagRecord::new(kind, name.to_string(), file.to_path_buf(), discovered),
    );
  }

  pub fn lookup(&self, kind: TagKind, name: &str) -> Option<TagRecord> {
    self
      .state
      .lock()
      .records
      .of(kind)
      .get(name)
      .cloned()
  }

  pub fn len(&self) -> usize {
    self.state.lock().records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drops every record that was only ever seen in its first file.
  ///
  /// Requires exclusive access, so no `add` can race with it. Removing a
  /// record never touches any other record.
  pub fn filter_uncommon(&mut self) {
    self
      .state
      .get_mut()
      .records
      .retain(|record| !record.single_file);
  }

  /// Surviving records by descending weight, ties in discovery order.
  pub fn order(&self) -> Vec<TagRecord> {
    let mut records: Vec<_> = self.state.lock().records.values().cloned().collect();
    sort_by_priority(&mut records);
    records
  }

  /// Gives every record a short name, heaviest first, and freezes the result.
  pub fn assign_names(self) -> RenameTable {
    let mut records: Vec<_> = self
      .state
      .into_inner()
      .records
      .into_values()
      .collect();
    sort_by_priority(&mut records);
    RenameTable::new(records)
  }
}

fn sort_by_priority(records: &mut [TagRecord]) {
  // Discovery numbers are unique, so this is a total order.
  records.sort_unstable_by(|a, b| {
    b.weight
      .cmp(&a.weight)
      .then_with(|| a.discovered.cmp(&b.discovered))
  });
}

/// Read-only mapping from original identifiers to their short names.
///
/// Needs no locking; rewrite tasks share it by reference.
#[derive(Debug, Default)]
pub struct RenameTable {
  records: Vec<TagRecord>,
  index: KindMap<usize>,
}

impl RenameTable {
  fn new(mut records: Vec<TagRecord>) -> RenameTable {
    let mut index = KindMap::default();
    for (i, (record, new_name)) in records.iter_mut().zip(ShortNames::new()).enumerate() {
      record.new_name = Some(new_name);
      index.of_mut(record.kind).insert(record.name.clone(), i);
    }
    RenameTable { records, index }
  }

  pub fn lookup(&self, kind: TagKind, name: &str) -> Option<&str> {
    self
      .index
      .of(kind)
      .get(name)
      .and_then(|&i| self.records[i].new_name.as_deref())
  }

  /// Renamed records in priority order.
  pub fn records(&self) -> &[TagRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}
