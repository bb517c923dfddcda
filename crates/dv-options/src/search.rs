//! Options search
//!
//! Items are matched case-insensitively against the query as a regular
//! expression; a query that is not a valid expression is matched literally.
//! Hits are ranked: title match first, then description match, then a match
//! on the enclosing category title. Ties keep declaration order.

use regex::{Regex, RegexBuilder};

use crate::descriptors::{OptionsPaneCategoryDescriptor, OptionsPaneItemDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HitRank {
    Title = 1,
    Description = 2,
    Category = 3,
}

#[derive(Debug, Clone)]
pub struct OptionSearchResult {
    pub option_hits: Vec<OptionsPaneItemDescriptor>,
    /// Override categories holding the matched items, matcher item first
    pub override_hits: Vec<OptionsPaneCategoryDescriptor>,
    /// Items across the option categories, regardless of the query
    pub total_count: usize,
}

impl OptionSearchResult {
    pub fn matched_count(&self) -> usize {
        self.option_hits.len()
    }
}

pub struct OptionSearchEngine<'a> {
    categories: &'a [OptionsPaneCategoryDescriptor],
    override_categories: &'a [OptionsPaneCategoryDescriptor],
}

impl<'a> OptionSearchEngine<'a> {
    pub fn new(
        categories: &'a [OptionsPaneCategoryDescriptor],
        override_categories: &'a [OptionsPaneCategoryDescriptor],
    ) -> Self {
        Self {
            categories,
            override_categories,
        }
    }

    pub fn search(&self, query: &str) -> OptionSearchResult {
        let total_count = self.categories.iter().map(|c| c.total_items()).sum();
        let Some(regex) = search_regex(query) else {
            return OptionSearchResult {
                option_hits: Vec::new(),
                override_hits: Vec::new(),
                total_count,
            };
        };

        let mut hits = Vec::new();
        collect_hits(self.categories, &regex, false, &mut hits);
        hits.sort_by_key(|(rank, _)| *rank);

        OptionSearchResult {
            option_hits: hits.into_iter().map(|(_, item)| item.clone()).collect(),
            override_hits: self.override_hits(&regex),
            total_count,
        }
    }

    fn override_hits(&self, regex: &Regex) -> Vec<OptionsPaneCategoryDescriptor> {
        let mut result = Vec::new();
        for category in self.override_categories {
            let mut hits = Vec::new();
            collect_hits(std::slice::from_ref(category), regex, false, &mut hits);
            if hits.is_empty() {
                continue;
            }

            let mut items: Vec<OptionsPaneItemDescriptor> = Vec::with_capacity(hits.len() + 1);
            if let Some(first) = category.items.first() {
                items.push(first.clone());
            }
            for (_, item) in hits {
                if !items.iter().any(|existing| existing.id == item.id) {
                    items.push(item.clone());
                }
            }

            let mut hit = category.clone();
            hit.force_open = true;
            hit.items = items;
            hit.categories = Vec::new();
            result.push(hit);
        }
        result
    }
}

fn search_regex(query: &str) -> Option<Regex> {
    RegexBuilder::new(query)
        .case_insensitive(true)
        .build()
        .or_else(|err| {
            tracing::warn!("Invalid search pattern '{}', matching literally: {}", query, err);
            RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build()
        })
        .ok()
}

/// `ancestor_match` is set when an enclosing category's title matched
fn collect_hits<'c>(
    categories: &'c [OptionsPaneCategoryDescriptor],
    regex: &Regex,
    ancestor_match: bool,
    hits: &mut Vec<(HitRank, &'c OptionsPaneItemDescriptor)>,
) {
    for category in categories {
        let category_match = ancestor_match || regex.is_match(&category.title);
        for item in &category.items {
            if regex.is_match(&item.title) {
                hits.push((HitRank::Title, item));
            } else if item.description.as_deref().map_or(false, |d| regex.is_match(d)) {
                hits.push((HitRank::Description, item));
            } else if category_match || item.category_path.iter().any(|title| regex.is_match(title)) {
                hits.push((HitRank::Category, item));
            }
        }
        collect_hits(&category.categories, regex, category_match, hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::EditorElement;
    use dv_core::ConfigValue;
    use dv_fieldconfig::EditorKind;
    use pretty_assertions::assert_eq;

    fn item(id: &str, title: &str, description: Option<&str>) -> OptionsPaneItemDescriptor {
        OptionsPaneItemDescriptor::new(id, title, || EditorElement::new(EditorKind::Text, ConfigValue::Null))
            .with_description(description.map(str::to_string))
    }

    fn category(title: &str, items: Vec<OptionsPaneItemDescriptor>) -> OptionsPaneCategoryDescriptor {
        let mut category = OptionsPaneCategoryDescriptor::new(title, title);
        for item in items {
            category.add_item(item);
        }
        category
    }

    fn titles(items: &[OptionsPaneItemDescriptor]) -> Vec<&str> {
        items.iter().map(|item| item.title.as_str()).collect()
    }

    fn min_fixture(category_title: &str) -> Vec<OptionsPaneCategoryDescriptor> {
        vec![category(
            category_title,
            vec![
                item("foo", "Foo", Some("contains Min")),
                item("min", "Min", None),
                item("bar", "Bar", None),
            ],
        )]
    }

    #[test]
    fn test_ranking_title_then_description() {
        let categories = min_fixture("Axis");
        let result = OptionSearchEngine::new(&categories, &[]).search("min");
        assert_eq!(titles(&result.option_hits), vec!["Min", "Foo"]);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.matched_count(), 2);
    }

    #[test]
    fn test_category_title_match_ranks_last() {
        let categories = min_fixture("Min settings");
        let result = OptionSearchEngine::new(&categories, &[]).search("Min");
        assert_eq!(titles(&result.option_hits), vec!["Min", "Foo", "Bar"]);
    }

    #[test]
    fn test_subcategories_and_invalid_pattern() {
        let mut root = category("Graph", vec![item("a", "Line (width)", None)]);
        root.get_or_add_category("Graph/Points", "Points")
            .add_item(item("b", "Point size", None));
        let categories = vec![root];
        let engine = OptionSearchEngine::new(&categories, &[]);

        assert_eq!(titles(&engine.search("point").option_hits), vec!["Point size"]);
        assert_eq!(titles(&engine.search("(width").option_hits), vec!["Line (width)"]);
        assert_eq!(engine.search("nothing").total_count, 2);
    }

    #[test]
    fn test_enclosing_category_titles_match() {
        let mut root = category("Map view", vec![item("zoom", "Zoom", None)]);
        root.get_or_add_category("Map view/Position", "Position")
            .add_item(item("lat", "Latitude", None));
        let mut layers = category("Layers", vec![]);
        layers.add_item(
            item("kind", "Layer type", None).with_category_path(vec!["Data layer".to_string(), "Layers".to_string()]),
        );
        let categories = vec![root, layers];
        let engine = OptionSearchEngine::new(&categories, &[]);

        assert_eq!(titles(&engine.search("map view").option_hits), vec!["Zoom", "Latitude"]);
        assert_eq!(titles(&engine.search("data layer").option_hits), vec!["Layer type"]);
    }

    #[test]
    fn test_override_hits_keep_matcher_item() {
        let overrides = vec![
            category(
                "Override 1",
                vec![
                    item("o1/matcher", "Fields with name", None),
                    item("o1/p0", "Unit", None),
                    item("o1/p1", "Min", None),
                ],
            ),
            category("Override 2", vec![item("o2/matcher", "Fields with type", None)]),
            category(
                "Override 3",
                vec![item("o3/matcher", "Fields with name", None), item("o3/p0", "Decimals", None)],
            ),
        ];
        let engine = OptionSearchEngine::new(&[], &overrides);

        let result = engine.search("unit");
        assert_eq!(result.override_hits.len(), 1);
        assert!(result.override_hits[0].force_open);
        assert_eq!(titles(&result.override_hits[0].items), vec!["Fields with name", "Unit"]);

        let result = engine.search("fields with name");
        let ids: Vec<_> = result.override_hits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Override 1", "Override 3"]);
        assert_eq!(titles(&result.override_hits[0].items), vec!["Fields with name"]);
        assert_eq!(result.total_count, 0);
    }
}
