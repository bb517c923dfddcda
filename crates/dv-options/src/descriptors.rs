//! Options pane descriptor tree
//!
//! Categories and items are plain data built fresh whenever the panel state,
//! the data or the search query changes. An item does not render anything
//! itself; it carries a callback producing the [`EditorElement`] a front end
//! shows for it.

use std::fmt;
use std::sync::Arc;

use dv_core::ConfigValue;
use dv_fieldconfig::{EditorKind, SelectableValue};

use crate::override_info::OptionPaneItemOverrideInfo;

/// Receives the new value of an edited option
pub type OnChangeFn = Arc<dyn Fn(ConfigValue) + Send + Sync>;

/// Removes the option (or rule) the control belongs to
pub type OnRemoveFn = Arc<dyn Fn() + Send + Sync>;

/// Produces the editor for an item
pub type RenderFn = Arc<dyn Fn() -> EditorElement + Send + Sync>;

/// An editor bound to its current value
#[derive(Clone)]
pub struct EditorElement {
    pub editor: EditorKind,
    pub value: ConfigValue,
    pub settings: ConfigValue,
    /// Choices offered by pickers
    pub choices: Vec<SelectableValue>,
    pub on_change: Option<OnChangeFn>,
    pub on_remove: Option<OnRemoveFn>,
}

impl EditorElement {
    pub fn new(editor: EditorKind, value: ConfigValue) -> Self {
        Self {
            editor,
            value,
            settings: ConfigValue::object(),
            choices: Vec::new(),
            on_change: None,
            on_remove: None,
        }
    }

    pub fn with_settings(mut self, settings: ConfigValue) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_choices(mut self, choices: Vec<SelectableValue>) -> Self {
        self.choices = choices;
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(ConfigValue) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn on_remove<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_remove = Some(Arc::new(f));
        self
    }

    /// Forward an edit to the change callback
    pub fn change(&self, value: ConfigValue) {
        if let Some(on_change) = &self.on_change {
            on_change(value);
        }
    }

    /// Forward a removal to the remove callback
    pub fn remove(&self) {
        if let Some(on_remove) = &self.on_remove {
            on_remove();
        }
    }
}

impl fmt::Debug for EditorElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorElement")
            .field("editor", &self.editor)
            .field("value", &self.value)
            .field("choices", &self.choices.len())
            .field("on_change", &self.on_change.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .finish()
    }
}

/// One option in the pane
#[derive(Clone)]
pub struct OptionsPaneItemDescriptor {
    /// Unique within its category
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Rank in the "recent options" shortlist
    pub popular_rank: Option<u32>,
    /// Rendered without the field label (pickers)
    pub skip_field: bool,
    /// Titles of the enclosing categories, outermost first
    pub category_path: Vec<String>,
    /// Data and rule indicators
    pub overrides: Vec<OptionPaneItemOverrideInfo>,
    render: RenderFn,
}

impl OptionsPaneItemDescriptor {
    pub fn new<F>(id: impl Into<String>, title: impl Into<String>, render: F) -> Self
    where
        F: Fn() -> EditorElement + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            popular_rank: None,
            skip_field: false,
            category_path: Vec::new(),
            overrides: Vec::new(),
            render: Arc::new(render),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_popular_rank(mut self, rank: Option<u32>) -> Self {
        self.popular_rank = rank;
        self
    }

    pub fn with_category_path(mut self, path: Vec<String>) -> Self {
        self.category_path = path;
        self
    }

    pub fn with_overrides(mut self, overrides: Vec<OptionPaneItemOverrideInfo>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn skipping_field(mut self) -> Self {
        self.skip_field = true;
        self
    }

    /// Build the item's editor
    pub fn render(&self) -> EditorElement {
        (self.render)()
    }
}

impl fmt::Debug for OptionsPaneItemDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsPaneItemDescriptor")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("popular_rank", &self.popular_rank)
            .field("category_path", &self.category_path)
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Header of an override rule category
#[derive(Clone)]
pub struct CategoryHeader {
    /// Name of the rule's matcher kind
    pub matcher_name: String,
    /// Configured matcher options, when there are any
    pub label: Option<String>,
    /// Absent for system overrides
    pub on_remove: Option<OnRemoveFn>,
}

impl fmt::Debug for CategoryHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryHeader")
            .field("matcher_name", &self.matcher_name)
            .field("label", &self.label)
            .field("removable", &self.on_remove.is_some())
            .finish()
    }
}

/// A collapsible group of options
#[derive(Clone, Debug)]
pub struct OptionsPaneCategoryDescriptor {
    pub id: String,
    pub title: String,
    pub is_open_default: bool,
    /// Shown expanded regardless of stored state
    pub force_open: bool,
    pub is_nested: bool,
    /// Count shown next to the title (thresholds, links...)
    pub items_count: Option<usize>,
    pub header: Option<CategoryHeader>,
    /// Replaces the item list (the "add override" button)
    pub custom_render: Option<OptionsPaneItemDescriptor>,
    pub items: Vec<OptionsPaneItemDescriptor>,
    pub categories: Vec<OptionsPaneCategoryDescriptor>,
}

impl OptionsPaneCategoryDescriptor {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            is_open_default: true,
            force_open: false,
            is_nested: false,
            items_count: None,
            header: None,
            custom_render: None,
            items: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn nested(mut self) -> Self {
        self.is_nested = true;
        self
    }

    pub fn closed_by_default(mut self) -> Self {
        self.is_open_default = false;
        self
    }

    pub fn add_item(&mut self, item: OptionsPaneItemDescriptor) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn add_category(&mut self, category: OptionsPaneCategoryDescriptor) -> &mut Self {
        self.categories.push(category);
        self
    }

    /// Subcategory with the given id, created with `title` when missing
    pub fn get_or_add_category(&mut self, id: &str, title: &str) -> &mut OptionsPaneCategoryDescriptor {
        let index = match self.categories.iter().position(|c| c.id == id) {
            Some(index) => index,
            None => {
                self.categories.push(OptionsPaneCategoryDescriptor::new(id, title).nested());
                self.categories.len() - 1
            }
        };
        &mut self.categories[index]
    }

    /// Number of items, subcategories included
    pub fn total_items(&self) -> usize {
        self.items.len() + self.categories.iter().map(|c| c.total_items()).sum::<usize>()
    }

    /// Items depth first, a category's own items before its subcategories'
    pub fn all_items(&self) -> Vec<&OptionsPaneItemDescriptor> {
        let mut items: Vec<&OptionsPaneItemDescriptor> = self.items.iter().collect();
        for category in &self.categories {
            items.extend(category.all_items());
        }
        items
    }
}

/// Ids and titles of a tree, used to compare two builds
pub fn tree_outline(categories: &[OptionsPaneCategoryDescriptor]) -> Vec<String> {
    fn walk(category: &OptionsPaneCategoryDescriptor, depth: usize, out: &mut Vec<String>) {
        out.push(format!("{}[{}] {}", "  ".repeat(depth), category.id, category.title));
        for item in &category.items {
            out.push(format!("{}- {} {}", "  ".repeat(depth + 1), item.id, item.title));
        }
        for child in &category.categories {
            walk(child, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    for category in categories {
        walk(category, 0, &mut out);
    }
    out
}
