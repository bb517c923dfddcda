use crate::descriptors::{OptionsPaneCategoryDescriptor, OptionsPaneItemDescriptor};

/// Most used options: items carrying a popular rank, best rank first,
/// at most `limit` of them
pub fn get_recent_options(
    categories: &[OptionsPaneCategoryDescriptor],
    limit: usize,
) -> Vec<OptionsPaneItemDescriptor> {
    let mut ranked: Vec<(u32, &OptionsPaneItemDescriptor)> = categories
        .iter()
        .flat_map(|category| category.all_items())
        .filter_map(|item| item.popular_rank.map(|rank| (rank, item)))
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().take(limit).map(|(_, item)| item.clone()).collect()
}
