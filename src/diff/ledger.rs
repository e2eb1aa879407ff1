//! Per-package merge state.
//!
//! The ledger remembers, for every logical package, the installed revision
//! and the best revision each source offers. Every batch is a full snapshot
//! for its key (local, or one source), so merging a batch replaces whatever
//! that key contributed before.

use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::item::{Available, MergedItem};
use crate::package::{PackageKey, PackageRecord, Revision};
use crate::source::SourceId;

#[derive(Debug, Clone)]
struct Installed {
    revision: Revision,
    source: Option<SourceId>,
    label: String,
    version_name: Option<String>,
}

#[derive(Debug, Clone)]
struct Offer {
    revision: Revision,
    label: String,
    version_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct LedgerEntry {
    installed: Option<Installed>,
    offers: HashMap<SourceId, Offer>,
}

impl LedgerEntry {
    fn is_empty(&self) -> bool {
        self.installed.is_none() && self.offers.is_empty()
    }

    /// Highest offered revision; equal revisions go to the source that sorts first.
    fn best_offer(&self) -> Option<(&SourceId, &Offer)> {
        self.offers.iter().max_by(|(sa, a), (sb, b)| {
            a.revision
                .cmp(&b.revision)
                .then_with(|| sb.display_cmp(sa))
        })
    }

    fn view(&self, key: &PackageKey) -> Option<MergedItem> {
        let best = self.best_offer();

        let available = match (&self.installed, best) {
            (Some(installed), Some((source, offer))) if offer.revision > installed.revision => {
                Some(Available {
                    revision: offer.revision,
                    source: source.clone(),
                })
            }
            (None, Some((source, offer))) => Some(Available {
                revision: offer.revision,
                source: source.clone(),
            }),
            _ => None,
        };

        let source = best
            .map(|(source, _)| source.clone())
            .or_else(|| self.installed.as_ref().and_then(|i| i.source.clone()));

        let (label, version_name) = match (&self.installed, best) {
            (Some(installed), _) => (installed.label.clone(), installed.version_name.clone()),
            (None, Some((_, offer))) => (offer.label.clone(), offer.version_name.clone()),
            (None, None) => return None,
        };

        Some(MergedItem {
            key: key.clone(),
            label,
            installed: self.installed.as_ref().map(|i| i.revision),
            available,
            source,
            version_name,
        })
    }
}

/// Reconciled installed/remote state for every known package.
#[derive(Debug, Clone, Default)]
pub struct MergeLedger {
    entries: BTreeMap<PackageKey, LedgerEntry>,
}

impl MergeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge one batch. `None` is the installed (local) batch.
    ///
    /// Returns true if any merged item was added, removed, or shows
    /// a different state afterwards.
    pub fn merge(&mut self, source: Option<&SourceId>, records: &[PackageRecord]) -> bool {
        match source {
            None => self.merge_local(records),
            Some(source) => self.merge_remote(source, records),
        }
    }

    /// Replace the installed packages with `records`.
    pub fn merge_local(&mut self, records: &[PackageRecord]) -> bool {
        let batch = collapse(records);

        let mut affected: BTreeSet<PackageKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.installed.is_some())
            .map(|(key, _)| key.clone())
            .collect();
        affected.extend(batch.keys().map(|key| (*key).clone()));

        let before = self.snapshot(&affected);

        for key in affected.iter().filter(|key| !batch.contains_key(key)) {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.installed = None;
            }
        }

        for (key, record) in batch {
            self.entries.entry(key.clone()).or_default().installed = Some(Installed {
                revision: record.revision,
                source: record.source.clone(),
                label: record.label.clone(),
                version_name: record.version_name.clone(),
            });
        }

        self.prune(&affected);

        let changed = before != self.snapshot(&affected);
        debug!(
            "Merged {} installed package(s) into {} item(s), changed={}",
            records.len(),
            self.entries.len(),
            changed
        );
        changed
    }

    /// Replace everything `source` offers with `records`.
    pub fn merge_remote(&mut self, source: &SourceId, records: &[PackageRecord]) -> bool {
        let batch = collapse(records);

        let mut affected: BTreeSet<PackageKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.offers.contains_key(source))
            .map(|(key, _)| key.clone())
            .collect();
        affected.extend(batch.keys().map(|key| (*key).clone()));

        let before = self.snapshot(&affected);

        for key in affected.iter().filter(|key| !batch.contains_key(key)) {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.offers.remove(source);
            }
        }

        for (key, record) in batch {
            self.entries.entry(key.clone()).or_default().offers.insert(
                source.clone(),
                Offer {
                    revision: record.revision,
                    label: record.label.clone(),
                    version_name: record.version_name.clone(),
                },
            );
        }

        self.prune(&affected);

        let changed = before != self.snapshot(&affected);
        debug!(
            "Merged {} package(s) from {}, changed={}",
            records.len(),
            source,
            changed
        );
        changed
    }

    /// Merged view of one package.
    pub fn item(&self, key: &PackageKey) -> Option<MergedItem> {
        self.entries.get(key).and_then(|entry| entry.view(key))
    }

    /// Merged view of every package, in display order.
    pub fn items(&self) -> Vec<MergedItem> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| entry.view(key))
            .collect()
    }

    /// Best revision `source` currently offers for `key`, even when it is
    /// not surfaced as an update.
    pub fn offered_revision(&self, key: &PackageKey, source: &SourceId) -> Option<Revision> {
        self.entries
            .get(key)
            .and_then(|entry| entry.offers.get(source))
            .map(|offer| offer.revision)
    }

    fn snapshot(&self, keys: &BTreeSet<PackageKey>) -> Vec<Option<MergedItem>> {
        keys.iter().map(|key| self.item(key)).collect()
    }

    fn prune(&mut self, keys: &BTreeSet<PackageKey>) {
        for key in keys {
            if self.entries.get(key).is_some_and(LedgerEntry::is_empty) {
                self.entries.remove(key);
            }
        }
    }
}

/// Collapse a batch to one record per key, keeping the highest revision.
/// Arrival order does not matter except between equal revisions, where the
/// first record wins.
fn collapse(records: &[PackageRecord]) -> BTreeMap<&PackageKey, &PackageRecord> {
    let mut batch: BTreeMap<&PackageKey, &PackageRecord> = BTreeMap::new();
    for record in records {
        match batch.get(&record.key) {
            Some(existing) if existing.revision >= record.revision => {}
            _ => {
                batch.insert(&record.key, record);
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ItemState;

    fn src1() -> SourceId {
        SourceId::new("http://repo.com/url1", "repo1")
    }

    fn src2() -> SourceId {
        SourceId::new("http://repo.com/url2", "repo2")
    }

    fn pkg(source: Option<SourceId>, name: &str, revision: u32) -> PackageRecord {
        PackageRecord::extra("mock", name, revision, source)
    }

    fn key(name: &str) -> PackageKey {
        pkg(None, name, 1).key
    }

    #[test]
    fn test_local_batch_inserts_installed_items() {
        let mut ledger = MergeLedger::new();
        assert!(ledger.merge(None, &[pkg(Some(src1()), "a", 1)]));

        let item = ledger.item(&key("a")).unwrap();
        assert_eq!(item.state(), ItemState::Installed);
        assert_eq!(item.installed, Some(Revision(1)));
        assert_eq!(item.source, Some(src1()));
    }

    #[test]
    fn test_same_batch_twice_is_unchanged() {
        let mut ledger = MergeLedger::new();
        assert!(ledger.merge(None, &[pkg(None, "a", 1)]));
        assert!(ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 2)]));

        assert!(!ledger.merge(None, &[pkg(None, "a", 1)]));
        assert!(!ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 2)]));
    }

    #[test]
    fn test_remote_max_is_order_independent() {
        for revisions in [[4, 2], [2, 4]] {
            let mut ledger = MergeLedger::new();
            ledger.merge(None, &[pkg(Some(src1()), "type1", 1)]);
            let batch: Vec<_> = revisions
                .iter()
                .map(|r| pkg(Some(src1()), "type1", *r))
                .collect();
            assert!(ledger.merge(Some(&src1()), &batch));

            assert_eq!(
                ledger.offered_revision(&key("type1"), &src1()),
                Some(Revision(4))
            );
            let item = ledger.item(&key("type1")).unwrap();
            assert_eq!(item.state(), ItemState::UpdateAvailable);
            assert_eq!(item.installed, Some(Revision(1)));
            assert_eq!(item.available.unwrap().revision, Revision(4));
        }
    }

    #[test]
    fn test_equal_remote_revision_is_not_an_update() {
        let mut ledger = MergeLedger::new();
        ledger.merge(None, &[pkg(Some(src1()), "a", 3)]);
        assert!(!ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 3)]));
        assert!(!ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 2)]));

        let item = ledger.item(&key("a")).unwrap();
        assert_eq!(item.state(), ItemState::Installed);
        assert!(item.available.is_none());
        assert_eq!(ledger.offered_revision(&key("a"), &src1()), Some(Revision(2)));
    }

    #[test]
    fn test_remote_only_item_is_new() {
        let mut ledger = MergeLedger::new();
        assert!(!ledger.merge(None, &[]));
        assert!(ledger.merge(Some(&src1()), &[pkg(Some(src1()), "y", 1)]));
        assert_eq!(ledger.item(&key("y")).unwrap().state(), ItemState::New);

        // Installing it flips the state
        assert!(ledger.merge(None, &[pkg(Some(src1()), "y", 1)]));
        assert!(!ledger.merge(Some(&src1()), &[pkg(Some(src1()), "y", 1)]));
        assert_eq!(ledger.item(&key("y")).unwrap().state(), ItemState::Installed);
    }

    #[test]
    fn test_uninstall_without_offer_removes_item() {
        let mut ledger = MergeLedger::new();
        ledger.merge(None, &[pkg(None, "a", 1), pkg(None, "b", 1)]);
        assert_eq!(ledger.len(), 2);

        assert!(ledger.merge(None, &[pkg(None, "b", 1)]));
        assert!(ledger.item(&key("a")).is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_uninstall_with_offer_becomes_new() {
        let mut ledger = MergeLedger::new();
        ledger.merge(None, &[pkg(Some(src1()), "a", 1)]);
        ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 2)]);

        assert!(ledger.merge(None, &[]));
        let item = ledger.item(&key("a")).unwrap();
        assert_eq!(item.state(), ItemState::New);
        assert_eq!(item.available.unwrap().revision, Revision(2));
    }

    #[test]
    fn test_source_stops_offering() {
        let mut ledger = MergeLedger::new();
        ledger.merge(None, &[pkg(Some(src1()), "a", 1)]);
        ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 2), pkg(Some(src1()), "b", 1)]);
        assert_eq!(ledger.len(), 2);

        assert!(ledger.merge(Some(&src1()), &[]));
        assert!(ledger.item(&key("b")).is_none());
        let a = ledger.item(&key("a")).unwrap();
        assert_eq!(a.state(), ItemState::Installed);
        assert!(a.available.is_none());
    }

    #[test]
    fn test_sources_do_not_touch_each_other() {
        let mut ledger = MergeLedger::new();
        ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 1)]);
        ledger.merge(Some(&src2()), &[pkg(Some(src2()), "b", 1)]);

        // src2 no longer lists b; a from src1 is untouched
        assert!(ledger.merge(Some(&src2()), &[]));
        assert!(ledger.item(&key("a")).is_some());
        assert!(ledger.item(&key("b")).is_none());

        // Local batch does not clear offers
        assert!(!ledger.merge(None, &[]));
        assert!(ledger.item(&key("a")).is_some());
    }

    #[test]
    fn test_best_offer_across_sources() {
        let mut ledger = MergeLedger::new();
        ledger.merge(None, &[pkg(None, "a", 1)]);
        ledger.merge(Some(&src2()), &[pkg(Some(src2()), "a", 5)]);
        ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 3)]);

        let item = ledger.item(&key("a")).unwrap();
        let available = item.available.unwrap();
        assert_eq!(available.revision, Revision(5));
        assert_eq!(available.source, src2());
        assert_eq!(item.source, Some(src2()));

        // Tie goes to the source that sorts first
        assert!(ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 5)]));
        assert_eq!(ledger.item(&key("a")).unwrap().source, Some(src1()));
    }

    #[test]
    fn test_source_falls_back_to_installed_origin() {
        let mut ledger = MergeLedger::new();
        ledger.merge(None, &[pkg(Some(src2()), "a", 1), pkg(None, "b", 1)]);

        assert_eq!(ledger.item(&key("a")).unwrap().source, Some(src2()));
        assert_eq!(ledger.item(&key("b")).unwrap().source, None);
    }

    #[test]
    fn test_duplicate_equal_revision_is_noop() {
        let mut ledger = MergeLedger::new();
        assert!(ledger.merge(None, &[pkg(None, "a", 2), pkg(None, "a", 2)]));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.item(&key("a")).unwrap().installed, Some(Revision(2)));
    }

    #[test]
    fn test_items_in_display_order() {
        let mut ledger = MergeLedger::new();
        ledger.merge(
            Some(&src1()),
            &[
                pkg(Some(src1()), "z", 1),
                PackageRecord::platform(2, "android-2", 1, Some(src1())),
                PackageRecord::tool(1, Some(src1())),
            ],
        );

        let keys: Vec<PackageKey> = ledger.items().into_iter().map(|i| i.key).collect();
        assert_eq!(
            keys,
            vec![
                PackageKey::Tool,
                PackageKey::Platform { api_level: 2 },
                key("z"),
            ]
        );
    }

    #[test]
    fn test_label_prefers_installed_record() {
        let mut ledger = MergeLedger::new();
        ledger.merge(Some(&src1()), &[pkg(Some(src1()), "a", 2).with_label("remote label")]);
        assert_eq!(ledger.item(&key("a")).unwrap().label, "remote label");

        ledger.merge(None, &[pkg(None, "a", 1).with_label("local label")]);
        assert_eq!(ledger.item(&key("a")).unwrap().label, "local label");
    }
}
