use crate::models::{CategorizedCatalog, Category, LabelCatalog};

/// Groups a catalog by category for prompt rendering.
///
/// Categories appear in first-seen order and labels keep catalog order
/// within each category. Labels without a namespace land in `other`.
///
/// # Examples
///
/// ```
/// use labelsmith::models::LabelCatalog;
/// use labelsmith::prompt::categorize;
///
/// let catalog: LabelCatalog = [
///     ("ns:topic/x", "X"),
///     ("ns:topic/y", "Y"),
///     ("ns:audience/z", "Z"),
/// ]
/// .into_iter()
/// .collect();
///
/// let categorized = categorize(&catalog);
/// let names: Vec<&str> = categorized.categories().iter().map(|c| c.name.as_str()).collect();
/// assert_eq!(names, vec!["topic", "audience"]);
/// assert_eq!(categorized.get("topic").map(|c| c.labels.len()), Some(2));
/// ```
pub fn categorize(catalog: &LabelCatalog) -> CategorizedCatalog {
    let mut categories: Vec<Category> = Vec::new();

    for (id, title) in catalog.iter() {
        let name = id.category();
        let entry = (id.clone(), title.to_string());

        match categories.iter_mut().find(|category| category.name == name) {
            Some(category) => category.labels.push(entry),
            None => categories.push(Category {
                name: name.to_string(),
                labels: vec![entry],
            }),
        }
    }

    CategorizedCatalog::from_categories(categories)
}
