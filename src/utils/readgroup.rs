use std::collections::BTreeSet;
use lazy_static::lazy_static;
use regex::Regex;
use crate::config::defs::{DEFAULT_READGROUP, READGROUPS_NUM_THRESHOLD, READGROUP_TOKEN_PATTERN};

lazy_static! {
    static ref READGROUP_RE: Regex = Regex::new(READGROUP_TOKEN_PATTERN)
        .unwrap_or_else(|e| panic!("invalid readgroup pattern {}: {}", READGROUP_TOKEN_PATTERN, e));
}

pub fn is_readgroup(token: &str) -> bool {
    READGROUP_RE.is_match(token)
}

pub fn is_default_readgroup(rg: &str) -> bool {
    rg == DEFAULT_READGROUP
}

/// Turns raw extractor output (one token per line, possibly '@'-prefixed)
/// into a sorted, de-duplicated set of readgroup tokens.
pub fn collect_candidates(raw: &str) -> BTreeSet<String> {
    raw.lines()
        .map(|line| line.trim().trim_start_matches('@'))
        .filter(|token| is_readgroup(token))
        .map(str::to_string)
        .collect()
}


/// Readgroups a run splits by. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadgroupList {
    ids: Vec<String>,
}

impl ReadgroupList {
    pub fn default_only() -> Self {
        ReadgroupList {
            ids: vec![DEFAULT_READGROUP.to_string()],
        }
    }

    /// Keeps the candidates if there are some, but fewer than
    /// `READGROUPS_NUM_THRESHOLD`; otherwise collapses to the default readgroup.
    pub fn from_candidates(candidates: BTreeSet<String>) -> Self {
        if candidates.is_empty() || candidates.len() >= READGROUPS_NUM_THRESHOLD {
            return Self::default_only();
        }
        ReadgroupList {
            ids: candidates.into_iter().collect(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.ids.len() == 1 && is_default_readgroup(&self.ids[0])
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_file_contents(&self) -> String {
        let mut contents = self.ids.join("\n");
        contents.push('\n');
        contents
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_readgroup() {
        assert!(is_readgroup("LIB1:1:FLOWCELL:1"));
        assert!(is_readgroup("A00123_x-y:8:HXXXX:2"));
        assert!(is_readgroup(DEFAULT_READGROUP));
        assert!(!is_readgroup("read_1"));
        assert!(!is_readgroup("LIB1:x:FLOWCELL:1"));
        assert!(!is_readgroup("LIB1:1:FLOWCELL:1:1101"));
    }

    #[test]
    fn test_collect_candidates_dedups_and_sorts() {
        let raw = "@LIB2:1:FC:1\n@LIB1:1:FC:2\n@LIB2:1:FC:1\nLIB1:1:FC:1\n\n";
        let set = collect_candidates(raw);
        let ids: Vec<&str> = set.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["LIB1:1:FC:1", "LIB1:1:FC:2", "LIB2:1:FC:1"]);
    }

    #[test]
    fn test_from_candidates_empty_is_default() {
        let list = ReadgroupList::from_candidates(BTreeSet::new());
        assert!(list.is_default());
        assert_eq!(list.to_file_contents(), format!("{}\n", DEFAULT_READGROUP));
    }

    #[test]
    fn test_from_candidates_threshold() {
        let nine: BTreeSet<String> = (0..9).map(|i| format!("LIB:1:FC:{}", i)).collect();
        let list = ReadgroupList::from_candidates(nine);
        assert_eq!(list.len(), 9);
        assert!(!list.is_default());

        let ten: BTreeSet<String> = (0..READGROUPS_NUM_THRESHOLD).map(|i| format!("LIB:1:FC:{}", i)).collect();
        let list = ReadgroupList::from_candidates(ten);
        assert!(list.is_default());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_file_contents_one_per_line() {
        let set = collect_candidates("@B:1:FC:1\n@A:1:FC:1\n");
        let list = ReadgroupList::from_candidates(set);
        assert_eq!(list.to_file_contents(), "A:1:FC:1\nB:1:FC:1\n");
    }
}
