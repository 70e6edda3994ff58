//! Variable management for CNF formulas

use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Bidirectional mapping between variable names and dense SAT variable indices
///
/// Indices start at 1 and stay dense, so a map with `n` variables covers
/// exactly the indices `1..=n`. The map is created once per formula; removing
/// variables never mutates an existing map but produces a fresh one together
/// with a literal translation table (see [`VariableMap::eliminate`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    /// Variable names in index order (`names[i]` belongs to index `i + 1`)
    names: Vec<String>,
    /// Map from variable name to SAT variable index
    indices: HashMap<String, u32>,
}

impl VariableMap {
    /// Create an empty variable map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map with `count` generated variable names `x1`..`xn`
    pub fn anonymous(count: usize) -> Self {
        let names: Vec<String> = (1..=count).map(|i| format!("x{}", i)).collect();
        let indices = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), (i + 1) as u32))
            .collect();
        Self { names, indices }
    }

    /// Create a map from an ordered list of variable names
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for name in names {
            map.add(&name.into())?;
        }
        Ok(map)
    }

    /// Add a new variable and return its index
    pub fn add(&mut self, name: &str) -> Result<u32> {
        if self.indices.contains_key(name) {
            anyhow::bail!("Variable '{}' is already defined", name);
        }
        self.names.push(name.to_string());
        let index = self.names.len() as u32;
        self.indices.insert(name.to_string(), index);
        Ok(index)
    }

    /// Get the total number of variables
    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    /// Check whether the map contains no variables
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up the index of a variable by name
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.indices.get(name).copied()
    }

    /// Look up the name of a variable by index
    pub fn name_of(&self, index: u32) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.names.get((index - 1) as usize).map(String::as_str)
    }

    /// Check whether an index refers to a variable in this map
    pub fn contains_index(&self, index: u32) -> bool {
        index >= 1 && index as usize <= self.names.len()
    }

    /// Iterate over all variable indices in ascending order
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        1..=self.names.len() as u32
    }

    /// Build a new dense map with the given variables removed
    ///
    /// The original map is left untouched; literals held against it stay
    /// valid. The returned [`Elimination`] carries the new map plus the
    /// old-index → new-index translation needed to rewrite clauses.
    pub fn eliminate(&self, removed: &HashSet<u32>) -> Elimination {
        let mut variables = VariableMap::new();
        let mut translation = vec![None; self.names.len()];
        for (i, name) in self.names.iter().enumerate() {
            let old_index = (i + 1) as u32;
            if removed.contains(&old_index) {
                continue;
            }
            variables.names.push(name.clone());
            let new_index = variables.names.len() as u32;
            variables.indices.insert(name.clone(), new_index);
            translation[i] = Some(new_index);
        }
        Elimination {
            variables,
            translation,
        }
    }
}

/// Outcome of removing variables from a [`VariableMap`]
#[derive(Debug, Clone)]
pub struct Elimination {
    variables: VariableMap,
    /// `translation[old - 1]` is the new index of `old`, `None` if removed
    translation: Vec<Option<u32>>,
}

impl Elimination {
    /// The new map over the surviving variables
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    /// Consume the elimination and return the new map
    pub fn into_variables(self) -> VariableMap {
        self.variables
    }

    /// Translate a literal from the old index space into the new one
    ///
    /// Returns `None` if the literal's variable was removed.
    pub fn translate(&self, literal: i32) -> Option<i32> {
        if literal == 0 {
            return None;
        }
        let old = literal.unsigned_abs();
        let new = (*self.translation.get((old - 1) as usize)?)?;
        Some(if literal > 0 {
            new as i32
        } else {
            -(new as i32)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut map = VariableMap::new();
        let a = map.add("a").unwrap();
        let b = map.add("b").unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(map.variable_count(), 2);
        assert_eq!(map.index_of("a"), Some(1));
        assert_eq!(map.name_of(2), Some("b"));
        assert_eq!(map.name_of(0), None);
        assert_eq!(map.name_of(3), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut map = VariableMap::new();
        map.add("a").unwrap();
        assert!(map.add("a").is_err());
    }

    #[test]
    fn test_anonymous_names() {
        let map = VariableMap::anonymous(3);
        assert_eq!(map.variable_count(), 3);
        assert_eq!(map.name_of(1), Some("x1"));
        assert_eq!(map.index_of("x3"), Some(3));
        assert!(map.contains_index(3));
        assert!(!map.contains_index(4));
        assert!(!map.contains_index(0));
    }

    #[test]
    fn test_eliminate_reindexes_densely() {
        let map = VariableMap::from_names(["a", "b", "c", "d"]).unwrap();
        let removed: HashSet<u32> = [2, 4].into_iter().collect();
        let elimination = map.eliminate(&removed);

        let reduced = elimination.variables();
        assert_eq!(reduced.variable_count(), 2);
        assert_eq!(reduced.name_of(1), Some("a"));
        assert_eq!(reduced.name_of(2), Some("c"));
        assert_eq!(reduced.index_of("c"), Some(2));

        // original map is untouched
        assert_eq!(map.variable_count(), 4);
        assert_eq!(map.index_of("b"), Some(2));
    }

    #[test]
    fn test_eliminate_translation() {
        let map = VariableMap::from_names(["a", "b", "c"]).unwrap();
        let removed: HashSet<u32> = [1].into_iter().collect();
        let elimination = map.eliminate(&removed);

        assert_eq!(elimination.translate(1), None);
        assert_eq!(elimination.translate(-1), None);
        assert_eq!(elimination.translate(2), Some(1));
        assert_eq!(elimination.translate(-2), Some(-1));
        assert_eq!(elimination.translate(3), Some(2));
        assert_eq!(elimination.translate(-3), Some(-2));
    }

    #[test]
    fn test_eliminate_nothing() {
        let map = VariableMap::from_names(["a", "b"]).unwrap();
        let elimination = map.eliminate(&HashSet::new());
        assert_eq!(elimination.variables(), &map);
        assert_eq!(elimination.translate(-2), Some(-2));
    }
}
