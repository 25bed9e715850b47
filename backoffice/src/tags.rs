use dto::product::ProductDto;

use crate::config::ProductTagArgs;

/// Adds a tag unless it is blank or already present, ignoring case.
/// Returns true when the list changed.
pub fn add_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let tag = tag.trim();
    if tag.is_empty() || tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        return false;
    }
    tags.push(tag.to_string());
    true
}

/// Removes a tag if present, ignoring case
pub fn remove_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let tag = tag.trim();
    let before = tags.len();
    tags.retain(|t| !t.eq_ignore_ascii_case(tag));
    tags.len() != before
}

#[derive(Debug, Clone, Default)]
pub struct TagEdit {
    pub add_units: Vec<String>,
    pub remove_units: Vec<String>,
    pub add_batches: Vec<String>,
    pub remove_batches: Vec<String>,
}

impl From<&ProductTagArgs> for TagEdit {
    fn from(args: &ProductTagArgs) -> Self {
        Self {
            add_units: args.add_unit.clone(),
            remove_units: args.remove_unit.clone(),
            add_batches: args.add_batch.clone(),
            remove_batches: args.remove_batch.clone(),
        }
    }
}

impl TagEdit {
    pub fn is_empty(&self) -> bool {
        self.add_units.is_empty()
            && self.remove_units.is_empty()
            && self.add_batches.is_empty()
            && self.remove_batches.is_empty()
    }
}

/// Applies removals then additions, returns true when the product changed
pub fn apply_edit(product: &mut ProductDto, edit: &TagEdit) -> bool {
    let mut changed = false;
    for tag in edit.remove_units.iter() {
        changed |= remove_tag(&mut product.unit_types, tag);
    }
    for tag in edit.add_units.iter() {
        changed |= add_tag(&mut product.unit_types, tag);
    }
    for tag in edit.remove_batches.iter() {
        changed |= remove_tag(&mut product.batch_sizes, tag);
    }
    for tag in edit.add_batches.iter() {
        changed |= add_tag(&mut product.batch_sizes, tag);
    }
    changed
}
