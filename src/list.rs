//! Ordered list with a case-insensitive substring filter and one clamped selection.
//!
//! Used for workflows, runs and jobs alike. The list stores the full item sequence
//! and a derived `visible` index vector; the selection always points into
//! `visible` (or is `None` when nothing is visible).

/// Extracts the searchable text fields of an item. An item matches a filter when
/// any of its fields contains the filter text, ignoring case.
pub type Projection<T> = for<'a> fn(&'a T) -> Vec<&'a str>;

pub struct FilteredList<T> {
    items: Vec<T>,
    /// Indices into `items`, in order, for entries passing the current filter.
    visible: Vec<usize>,
    filter: String,
    /// Position within `visible`. `None` iff `visible` is empty.
    selected: Option<usize>,
    project: Projection<T>,
}

impl<T> FilteredList<T> {
    pub fn new(project: Projection<T>) -> Self {
        Self {
            items: Vec::new(),
            visible: Vec::new(),
            filter: String::new(),
            selected: None,
            project,
        }
    }

    /// Replace the backing items. The selection keeps its visible row when that
    /// row still exists, otherwise it is clamped to the last row.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.refresh();
    }

    /// Replace the filter text. An empty filter shows every item.
    pub fn set_filter(&mut self, filter: &str) {
        filter.clone_into(&mut self.filter);
        self.refresh();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    fn refresh(&mut self) {
        let needle = self.filter.to_lowercase();
        let project = self.project;
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|&(_, item)| {
                needle.is_empty()
                    || project(item)
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .map(|(idx, _)| idx)
            .collect();

        self.selected = match (self.visible.len(), self.selected) {
            (0, _) => None,
            (len, Some(pos)) => Some(pos.min(len - 1)),
            (_, None) => Some(0),
        };
    }

    /// Move the selection to the first visible row, if any.
    pub fn select_first(&mut self) {
        self.selected = if self.visible.is_empty() { None } else { Some(0) };
    }

    /// Returns `true` if the selection moved.
    pub fn select_next(&mut self) -> bool {
        match self.selected {
            Some(pos) if pos + 1 < self.visible.len() => {
                self.selected = Some(pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the selection moved.
    pub fn select_prev(&mut self) -> bool {
        match self.selected {
            Some(pos) if pos > 0 => {
                self.selected = Some(pos - 1);
                true
            }
            _ => false,
        }
    }

    pub fn selected(&self) -> Option<&T> {
        let idx = *self.visible.get(self.selected?)?;
        self.items.get(idx)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Visible items in order.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.visible.iter().map(move |&idx| &self.items[idx])
    }

    /// Number of visible items.
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Number of items regardless of the filter.
    pub fn total_len(&self) -> usize {
        self.items.len()
    }
}
