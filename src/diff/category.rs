//! Grouping of merged items into display categories.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use super::item::MergedItem;
use crate::package::{PackageKey, Tier};
use crate::source::SourceId;

/// Label of the bucket for installed packages with no known source.
pub const LOCAL_PACKAGES_LABEL: &str = "Local Packages (no source)";

/// How merged items are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// One category per API tier, plus Tools and Extras.
    #[default]
    ByApi,
    /// One category per originating source.
    BySource,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMode::ByApi => write!(f, "api"),
            SortMode::BySource => write!(f, "source"),
        }
    }
}

/// Identity of a category across passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CategoryKey {
    Api { tier: Tier },
    /// `None` is the local bucket.
    Source { source: Option<SourceId> },
}

impl CategoryKey {
    fn display_cmp(&self, other: &CategoryKey) -> Ordering {
        match (self, other) {
            (CategoryKey::Api { tier: a }, CategoryKey::Api { tier: b }) => a.cmp(b),
            (CategoryKey::Source { source: a }, CategoryKey::Source { source: b }) => {
                match (a, b) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(a), Some(b)) => a.display_cmp(b),
                }
            }
            (CategoryKey::Api { .. }, CategoryKey::Source { .. }) => Ordering::Less,
            (CategoryKey::Source { .. }, CategoryKey::Api { .. }) => Ordering::Greater,
        }
    }

    fn is_permanent(&self) -> bool {
        matches!(self, CategoryKey::Api { tier } if tier.is_permanent())
    }
}

/// An ordered group of merged items.
///
/// `generation` is the pass in which this category last changed. A category
/// that comes out of a pass with the same key, label and items keeps its
/// generation, which tells a renderer it can skip it.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    key: CategoryKey,
    label: String,
    items: Vec<MergedItem>,
    generation: u64,
}

impl Category {
    pub fn key(&self) -> &CategoryKey {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn items(&self) -> &[MergedItem] {
        &self.items
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn same_content(&self, key: &CategoryKey, label: &str, items: &[MergedItem]) -> bool {
        &self.key == key && self.label == label && self.items == items
    }

    pub(crate) fn retain_items<F>(&mut self, keep: F)
    where
        F: FnMut(&MergedItem) -> bool,
    {
        self.items.retain(keep);
    }
}

// Generations are bookkeeping, not content.
impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        other.same_content(&self.key, &self.label, &self.items)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [#items={}]", self.label, self.items.len())
    }
}

/// The categories of one sort mode.
#[derive(Debug, Clone)]
pub struct CategorySet {
    mode: SortMode,
    categories: Vec<Category>,
    generation: u64,
}

impl CategorySet {
    /// An empty partition. In API mode it already holds Tools and Extras.
    pub fn new(mode: SortMode) -> Self {
        let mut set = Self {
            mode,
            categories: Vec::new(),
            generation: 0,
        };
        set.rebuild(&[]);
        set.generation = 0;
        for category in &mut set.categories {
            category.generation = 0;
        }
        set
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Advances whenever a category is added, removed, replaced or moved.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Drop every category, permanent ones included.
    pub fn clear(&mut self) {
        if !self.categories.is_empty() {
            self.categories.clear();
            self.generation += 1;
        }
    }

    /// Re-derive the partition from `items` (given in display order).
    ///
    /// Unchanged categories are carried over with their generation. Empty
    /// categories are dropped unless permanent. Returns true if the set changed.
    pub fn rebuild(&mut self, items: &[MergedItem]) -> bool {
        let mut groups: Vec<(CategoryKey, Vec<MergedItem>)> = Vec::new();

        if self.mode == SortMode::ByApi {
            groups.push((CategoryKey::Api { tier: Tier::Tools }, Vec::new()));
            groups.push((CategoryKey::Api { tier: Tier::Extras }, Vec::new()));
        }

        for item in items {
            let key = self.key_for(item);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, group)) => group.push(item.clone()),
                None => groups.push((key, vec![item.clone()])),
            }
        }

        groups.retain(|(key, group)| key.is_permanent() || !group.is_empty());
        groups.sort_by(|(a, _), (b, _)| a.display_cmp(b));

        let next_generation = self.generation + 1;
        let categories: Vec<Category> = groups
            .into_iter()
            .map(|(key, items)| {
                let label = label_for(&key, &items);
                match self
                    .categories
                    .iter()
                    .find(|c| c.same_content(&key, &label, &items))
                {
                    Some(existing) => existing.clone(),
                    None => Category {
                        key,
                        label,
                        items,
                        generation: next_generation,
                    },
                }
            })
            .collect();

        let changed = categories.len() != self.categories.len()
            || categories
                .iter()
                .zip(&self.categories)
                .any(|(new, old)| new.key != old.key || new.generation != old.generation);

        if changed {
            self.generation = next_generation;
        }
        self.categories = categories;
        changed
    }

    fn key_for(&self, item: &MergedItem) -> CategoryKey {
        match self.mode {
            SortMode::ByApi => CategoryKey::Api {
                tier: item.key.tier(),
            },
            SortMode::BySource => CategoryKey::Source {
                source: item.source.clone(),
            },
        }
    }
}

fn label_for(key: &CategoryKey, items: &[MergedItem]) -> String {
    match key {
        CategoryKey::Api { tier: Tier::Tools } => "Tools".to_string(),
        CategoryKey::Api { tier: Tier::Extras } => "Extras".to_string(),
        CategoryKey::Api {
            tier: Tier::Api(level),
        } => {
            let version = items.iter().find_map(|item| match item.key {
                PackageKey::Platform { .. } => item.version_name.as_deref(),
                _ => None,
            });
            match version {
                Some(version) => format!("Android {} (API {})", version, level),
                None => format!("API {}", level),
            }
        }
        CategoryKey::Source { source: None } => LOCAL_PACKAGES_LABEL.to_string(),
        CategoryKey::Source {
            source: Some(source),
        } => source.to_string(),
    }
}
