//! Grid selection by name, wildcard prefix or index.
//!
//! Selection strings come straight from a node's text attribute, e.g.
//! `"density temp*"` or `"vel* 2"`. Words are separated by single spaces.

use std::sync::Arc;

use crate::grid::{Grid, GridSource};

/// Grids whose name equals `names`, or every grid when `names` is empty or
/// `"*"`.
pub fn get_grids(source: &dyn GridSource, names: &str) -> Vec<Arc<dyn Grid>> {
    let all = names.is_empty() || names == "*";
    (0..source.number_of_grids())
        .filter(|&n| all || source.grid(n).name() == names)
        .map(|n| source.grid_ptr(n))
        .collect()
}

/// All grid names joined by a single space.
pub fn grid_names(source: &dyn GridSource) -> String {
    (0..source.number_of_grids())
        .map(|n| source.grid(n).name())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a grid is picked by any word of `selection`.
///
/// The first word that parses as an integer decides the outcome on its own:
/// it selects the grid at that index and nothing else. Other
/// words are compared character by character against the name; a `*`
/// accepts the rest of the name, otherwise the word has to match the whole
/// name. An empty selection list picks everything.
pub fn contains_grid<S: AsRef<str>>(selection: &[S], grid_name: &str, grid_index: usize) -> bool {
    if selection.is_empty() {
        return true;
    }

    for word in selection {
        let word = word.as_ref();
        match word.parse::<usize>() {
            Ok(index) => return index == grid_index,
            Err(_) => {
                if matches_pattern(word.as_bytes(), grid_name.as_bytes()) {
                    return true;
                }
            }
        }
    }
    false
}

fn matches_pattern(word: &[u8], name: &[u8]) -> bool {
    for (w, n) in word.iter().zip(name) {
        if *w == b'*' {
            return true;
        }
        if w != n {
            return false;
        }
    }
    word.len() == name.len()
}

fn split_selection(selection: &str) -> Vec<&str> {
    selection.split(' ').collect()
}

/// Grids picked by `selection`, in source order.
pub fn selected_grids(selection: &str, source: &dyn GridSource) -> Vec<Arc<dyn Grid>> {
    partition_grids(selection, source).0
}

/// Splits the source into `(selected, passed_through)`.
///
/// Nodes that operate on a subset of their input forward the rest
/// untouched; the second list is what they forward.
pub fn partition_grids(
    selection: &str,
    source: &dyn GridSource,
) -> (Vec<Arc<dyn Grid>>, Vec<Arc<dyn Grid>>) {
    let words = split_selection(selection);
    let mut selected = Vec::new();
    let mut rejected = Vec::new();

    for n in 0..source.number_of_grids() {
        if contains_grid(words.as_slice(), source.grid(n).name(), n) {
            selected.push(source.grid_ptr(n));
        } else {
            rejected.push(source.grid_ptr(n));
        }
    }

    tracing::trace!(
        selection,
        selected = selected.len(),
        rejected = rejected.len(),
        "grid selection"
    );

    (selected, rejected)
}
