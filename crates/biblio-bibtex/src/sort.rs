//! Ordering of elements by identifier
//!
//! BibTeX requires a crossref'ed entry to come after every entry that
//! references it, so both orderings here move parents behind their
//! children.

use biblio_domain::{Element, Entry, File, Macro};
use tracing::warn;

/// Whether `child` references `parent` through its crossref field
fn references(child: &Entry, parent: &Entry) -> bool {
    !std::ptr::eq(child, parent)
        && child
            .crossref()
            .is_some_and(|target| target.eq_ignore_ascii_case(&parent.id))
}

/// Move every parent directly behind the last entry referencing it,
/// repeating until chains are in order
fn place_parents_after_children(mut order: Vec<&Entry>) -> Vec<&Entry> {
    let mut budget = order.len() * order.len();

    loop {
        let mut moved = false;
        let mut i = 0;
        while i < order.len() {
            let parent = order[i];
            match order.iter().rposition(|child| references(child, parent)) {
                Some(last_child) if last_child > i => {
                    if budget == 0 {
                        warn!(id = %parent.id, "crossref cycle, order left unresolved");
                        return order;
                    }
                    budget -= 1;
                    order.remove(i);
                    order.insert(last_child, parent);
                    moved = true;
                }
                _ => i += 1,
            }
        }
        if !moved {
            return order;
        }
    }
}

/// Put entries and macros back into their slots; comments and preambles
/// keep their positions
fn refill(file: &File, entries: Vec<&Entry>, macros: Vec<&Macro>) -> Vec<Element> {
    let mut sorted = entries
        .into_iter()
        .map(|entry| Element::Entry(entry.clone()))
        .chain(macros.into_iter().map(|m| Element::Macro(m.clone())));

    file.iter()
        .map(|element| match element {
            Element::Comment(_) | Element::Preamble(_) => element.clone(),
            Element::Entry(_) | Element::Macro(_) => {
                sorted.next().unwrap_or_else(|| element.clone())
            }
        })
        .collect()
}

/// Sort entries by id, then macros by key.
///
/// The sort is stable and uses plain string order. Crossref'ed entries are
/// then moved behind their last child. Macros follow the entries.
pub fn sort_by_identifier(file: &File) -> File {
    let mut entries: Vec<&Entry> = file.entries().collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    let entries = place_parents_after_children(entries);

    let mut macros: Vec<&Macro> = file.iter().filter_map(Element::as_macro).collect();
    macros.sort_by(|a, b| a.key.cmp(&b.key));

    let mut properties = file.properties.clone();
    properties.sorted_by_identifier = Some(true);
    File {
        elements: refill(file, entries, macros),
        properties,
    }
}

/// Keep the file order but move every crossref'ed entry to the end
pub fn move_crossrefed_to_end(file: &File) -> File {
    let all: Vec<&Entry> = file.entries().collect();
    let (parents, others): (Vec<&Entry>, Vec<&Entry>) = all
        .iter()
        .partition(|parent| all.iter().any(|child| references(child, parent)));

    let entries = place_parents_after_children(others.into_iter().chain(parents).collect());
    let macros: Vec<&Macro> = file.iter().filter_map(Element::as_macro).collect();

    File {
        elements: refill(file, entries, macros),
        properties: file.properties.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_domain::{Comment, Value};

    fn entry(id: &str) -> Entry {
        Entry::new("misc", id)
    }

    fn child(id: &str, parent: &str) -> Entry {
        entry(id).with_field("crossref", Value::verbatim(parent))
    }

    fn keys(file: &File) -> Vec<&str> {
        file.iter().map(|e| e.key().unwrap_or("-")).collect()
    }

    #[test]
    fn test_plain_sort() {
        let mut file = File::new();
        for id in ["c", "a", "b"] {
            file.push(entry(id));
        }
        let sorted = sort_by_identifier(&file);
        assert_eq!(keys(&sorted), vec!["a", "b", "c"]);
        assert_eq!(sorted.properties.sorted_by_identifier, Some(true));
    }

    #[test]
    fn test_parent_moves_after_child() {
        let mut file = File::new();
        file.push(entry("a"));
        file.push(child("z", "a"));
        file.push(entry("m"));
        let sorted = sort_by_identifier(&file);
        assert_eq!(keys(&sorted), vec!["m", "z", "a"]);
    }

    #[test]
    fn test_parent_chain() {
        let mut file = File::new();
        file.push(entry("a"));
        file.push(child("b", "a"));
        file.push(child("c", "b"));
        let sorted = sort_by_identifier(&file);
        assert_eq!(keys(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut file = File::new();
        file.push(child("a", "b"));
        file.push(child("b", "a"));
        let sorted = sort_by_identifier(&file);
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn test_comments_keep_slots_macros_follow_entries() {
        let mut file = File::new();
        file.push(Macro::new("mB", Value::plain("b")));
        file.push(Comment::new("header", false));
        file.push(entry("y"));
        file.push(Macro::new("mA", Value::plain("a")));
        file.push(entry("x"));

        let sorted = sort_by_identifier(&file);
        assert_eq!(keys(&sorted), vec!["x", "-", "y", "mA", "mB"]);
    }

    #[test]
    fn test_move_crossrefed_to_end() {
        let mut file = File::new();
        file.push(entry("p"));
        file.push(child("c1", "p"));
        file.push(entry("q"));
        let moved = move_crossrefed_to_end(&file);
        assert_eq!(keys(&moved), vec!["c1", "q", "p"]);
    }
}
