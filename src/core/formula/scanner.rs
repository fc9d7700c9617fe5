//! Identifier scanner
//!
//! Finds every substring shaped like `[A-Za-z_][A-Za-z0-9_]*`, left to right.
//! Digits cannot start an identifier, so `2x` yields `x` and `12` yields
//! nothing.

use super::functions::is_builtin;

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Iterator over identifier slices of a formula
pub struct Identifiers<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Iterator for Identifiers<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.offset..];
        let start = self.offset + rest.find(is_identifier_start)?;
        let tail = &self.source[start..];
        let len = tail
            .find(|c: char| !is_identifier_continue(c))
            .unwrap_or(tail.len());
        self.offset = start + len;
        Some(&self.source[start..start + len])
    }
}

/// Scan a formula for identifiers (ordered, duplicates kept)
pub fn scan_identifiers(formula: &str) -> Identifiers<'_> {
    Identifiers {
        source: formula,
        offset: 0,
    }
}

/// Identifiers that refer to variables: everything except built-in
/// function names. Order and duplicates are preserved.
pub fn referenced_identifiers(formula: &str) -> impl Iterator<Item = &str> {
    scan_identifiers(formula).filter(|ident| !is_builtin(ident))
}

/// Distinct variable names referenced by a formula.
///
/// Names are compared case-insensitively; the first spelling seen is kept.
pub fn extract_variables(formula: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for ident in referenced_identifiers(formula) {
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(ident)) {
            seen.push(ident.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scan_simple_formula() {
        let idents: Vec<_> = scan_identifiers("VIT * 12 + Level * 5").collect();
        assert_eq!(idents, vec!["VIT", "Level"]);
    }

    #[test]
    fn test_scan_keeps_duplicates_and_functions() {
        let idents: Vec<_> = scan_identifiers("max(STR, STR_2) + STR").collect();
        assert_eq!(idents, vec!["max", "STR", "STR_2", "STR"]);
    }

    #[test]
    fn test_digits_never_start_identifier() {
        let idents: Vec<_> = scan_identifiers("12 + 2x + 3.5").collect();
        assert_eq!(idents, vec!["x"]);
    }

    #[test]
    fn test_underscore_start() {
        let idents: Vec<_> = scan_identifiers("_hidden*2").collect();
        assert_eq!(idents, vec!["_hidden"]);
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(scan_identifiers("").count(), 0);
        assert_eq!(scan_identifiers("   ").count(), 0);
    }

    #[test]
    fn test_extract_variables_skips_functions() {
        let vars = extract_variables("Max(1, 5 - SkillRank * 0.5) + floor(Level)");
        assert_eq!(vars, vec!["SkillRank", "Level"]);
    }

    #[test]
    fn test_extract_variables_dedupes_case_insensitively() {
        let vars = extract_variables("hp + HP + Hp + mana");
        assert_eq!(vars, vec!["hp", "mana"]);
    }

    #[test]
    fn test_non_ascii_letters_split_identifiers() {
        let idents: Vec<_> = scan_identifiers("Forcé + 1").collect();
        assert_eq!(idents, vec!["Forc"]);
    }
}
