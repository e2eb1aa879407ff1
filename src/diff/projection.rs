use serde::Serialize;
use std::fmt;

use super::category::{Category, CategoryKey, SortMode};
use super::item::MergedItem;
use crate::package::PackageKey;

/// Read-only snapshot of the active category partition.
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    mode: SortMode,
    generation: u64,
    categories: Vec<Category>,
}

impl Projection {
    pub(crate) fn new(mode: SortMode, generation: u64, categories: Vec<Category>) -> Self {
        Self {
            mode,
            generation,
            categories,
        }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    /// Generation of the category set this snapshot was taken from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Find a merged item by key in any category.
    pub fn item(&self, key: &PackageKey) -> Option<&MergedItem> {
        self.items().find(|item| &item.key == key)
    }

    /// All items in display order.
    pub fn items(&self) -> impl Iterator<Item = &MergedItem> {
        self.categories.iter().flat_map(|c| c.items().iter())
    }

    /// True if no category holds an item.
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(Category::is_empty)
    }

    /// Copy of this projection restricted to items with an update available.
    ///
    /// Categories left empty are dropped, except the permanent API tiers.
    pub fn updates_only(&self) -> Projection {
        let categories = self
            .categories
            .iter()
            .cloned()
            .filter_map(|mut category| {
                category.retain_items(MergedItem::has_update);
                let permanent = matches!(
                    category.key(),
                    CategoryKey::Api { tier } if tier.is_permanent()
                );
                (permanent || !category.is_empty()).then_some(category)
            })
            .collect();

        Projection::new(self.mode, self.generation, categories)
    }
}

// Two snapshots are equal when they show the same thing.
impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.categories == other.categories
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for category in &self.categories {
            writeln!(f, "{}", category)?;
            for item in category.items() {
                writeln!(f, "-- {}", item)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::CategorySet;
    use crate::diff::item::Available;
    use crate::package::Revision;
    use crate::source::SourceId;

    fn item(key: PackageKey, installed: Option<u32>, available: Option<u32>) -> MergedItem {
        let source = SourceId::new("http://repo.com/url1", "repo1");
        MergedItem {
            label: key.default_label(None),
            key,
            installed: installed.map(Revision),
            available: available.map(|r| Available {
                revision: Revision(r),
                source: source.clone(),
            }),
            source: Some(source),
            version_name: None,
        }
    }

    fn projection(items: &[MergedItem]) -> Projection {
        let mut set = CategorySet::new(SortMode::ByApi);
        set.rebuild(items);
        Projection::new(set.mode(), set.generation(), set.categories().to_vec())
    }

    fn usb() -> PackageKey {
        PackageKey::Extra {
            vendor: "android".into(),
            path: "usb_driver".into(),
        }
    }

    #[test]
    fn test_display_tree() {
        let p = projection(&[
            item(PackageKey::Tool, Some(10), None),
            item(usb(), Some(4), Some(5)),
            item(PackageKey::Platform { api_level: 2 }, None, Some(1)),
        ]);

        assert_eq!(
            p.to_string(),
            "Tools [#items=1]\n\
             -- <INSTALLED, Android SDK Tools, revision 10>\n\
             API 2 [#items=1]\n\
             -- <NEW, SDK Platform Android API 2, API 2, revision 1>\n\
             Extras [#items=1]\n\
             -- <UPDATE, Android Usb Driver package, revision 4, update: revision 5>\n"
        );
    }

    #[test]
    fn test_item_lookup() {
        let p = projection(&[item(usb(), Some(4), None)]);
        assert_eq!(p.item(&usb()).unwrap().installed, Some(Revision(4)));
        assert!(p.item(&PackageKey::Tool).is_none());
        assert_eq!(p.items().count(), 1);
        assert!(!p.is_empty());
    }

    #[test]
    fn test_empty_projection_keeps_permanent_tiers() {
        let p = projection(&[]);
        assert!(p.is_empty());
        assert_eq!(p.categories().len(), 2);
    }

    #[test]
    fn test_updates_only() {
        let p = projection(&[
            item(PackageKey::Tool, Some(10), None),
            item(usb(), Some(4), Some(5)),
            item(PackageKey::Platform { api_level: 2 }, None, Some(1)),
        ]);

        let updates = p.updates_only();
        assert_eq!(
            updates.to_string(),
            "Tools [#items=0]\n\
             API 2 [#items=1]\n\
             -- <NEW, SDK Platform Android API 2, API 2, revision 1>\n\
             Extras [#items=1]\n\
             -- <UPDATE, Android Usb Driver package, revision 4, update: revision 5>\n"
        );
        // The source projection is untouched
        assert_eq!(p.items().count(), 3);
    }

    #[test]
    fn test_updates_only_drops_installed_categories() {
        let p = projection(&[
            item(PackageKey::Platform { api_level: 3 }, Some(6), None),
            item(PackageKey::Platform { api_level: 2 }, None, Some(1)),
        ]);

        let updates = p.updates_only();
        assert_eq!(updates.items().count(), 1);
        assert!(updates.item(&PackageKey::Platform { api_level: 3 }).is_none());
        assert!(updates.item(&PackageKey::Platform { api_level: 2 }).unwrap().has_update());
        assert_eq!(updates.categories().len(), 3);
    }

    #[test]
    fn test_serialize_json() {
        let p = projection(&[item(usb(), Some(4), Some(5))]);
        let json = serde_json::to_value(&p).unwrap();

        assert_eq!(json["mode"], "by-api");
        let extras = &json["categories"][1];
        assert_eq!(extras["label"], "Extras");
        assert_eq!(extras["key"]["kind"], "api");
        assert_eq!(extras["items"][0]["state"], "update-available");
        assert_eq!(extras["items"][0]["installed"], 4);
        assert_eq!(extras["items"][0]["available"]["revision"], 5);
        assert_eq!(extras["items"][0]["key"]["type"], "extra");
    }
}
