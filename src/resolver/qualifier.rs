/// Variable name qualifier
///
/// Splits a possibly nested or indexed variable name such as `order[2].amount`
/// into the longest prefix known to a mapping table and the suffix to re-append
/// after the prefix has been mapped.

use std::collections::HashMap;

/// Separates a user-type field from its owner (`customer.name`)
pub const FIELD_DELIMITER: char = '.';

/// Opens a component index (`total[2]`)
pub const COMPONENT_QUALIFIER_START: char = '[';

/// Closes a component index
pub const COMPONENT_QUALIFIER_END: char = ']';

/// Result of splitting a name: `base` + `remainder` always equals the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedName<'a> {
    /// Longest known prefix, or the whole name when nothing matched
    pub base: &'a str,
    /// Stripped `.field` / `[index]` segments, in original order
    pub remainder: &'a str,
}

impl<'a> QualifiedName<'a> {
    fn unmatched(name: &'a str) -> Self {
        Self {
            base: name,
            remainder: "",
        }
    }

    /// Target of `base` in `table`
    pub fn mapped<'t>(&self, table: &'t HashMap<String, String>) -> Option<&'t str> {
        table.get(self.base).map(String::as_str)
    }
}

/// Split `name` against a predicate telling which base names are known
///
/// Starting from the full name, the last structural segment is stripped until
/// `is_known` accepts the prefix. Field delimiters are stripped before component
/// qualifiers. If no prefix is accepted the whole name is returned with an
/// empty remainder.
pub fn split_qualified_name<'a>(name: &'a str, mut is_known: impl FnMut(&str) -> bool) -> QualifiedName<'a> {
    let mut end = name.len();
    while !is_known(&name[..end]) {
        match last_segment_start(&name[..end]) {
            Some(start) => end = start,
            None => return QualifiedName::unmatched(name),
        }
    }
    QualifiedName {
        base: &name[..end],
        remainder: &name[end..],
    }
}

/// Split `name` against the keys of a mapping table
pub fn qualify<'a, V>(name: &'a str, table: &HashMap<String, V>) -> QualifiedName<'a> {
    split_qualified_name(name, |candidate| table.contains_key(candidate))
}

/// Index qualifier appended to a parent name for a multi-instance child (`[k]`)
pub fn component_qualifier(index: u32) -> String {
    format!("{}{}{}", COMPONENT_QUALIFIER_START, index, COMPONENT_QUALIFIER_END)
}

fn last_segment_start(name: &str) -> Option<usize> {
    name.rfind(FIELD_DELIMITER)
        .or_else(|| name.rfind(COMPONENT_QUALIFIER_START))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(keys: &[&str]) -> HashMap<String, String> {
        keys.iter()
            .map(|key| (key.to_string(), format!("parent_{}", key)))
            .collect()
    }

    #[test]
    fn exact_match_has_empty_remainder() {
        let qualified = qualify("amount", &table(&["amount"]));
        assert_eq!(qualified.base, "amount");
        assert_eq!(qualified.remainder, "");
    }

    #[test]
    fn strips_fields_then_components() {
        let mappings = table(&["order"]);

        let qualified = qualify("order.amount", &mappings);
        assert_eq!((qualified.base, qualified.remainder), ("order", ".amount"));

        let qualified = qualify("order[3].lines[1].price", &mappings);
        assert_eq!((qualified.base, qualified.remainder), ("order", "[3].lines[1].price"));
        assert_eq!(qualified.mapped(&mappings), Some("parent_order"));
    }

    #[test]
    fn longest_known_prefix_wins() {
        let qualified = qualify("order.customer.name", &table(&["order", "order.customer"]));
        assert_eq!((qualified.base, qualified.remainder), ("order.customer", ".name"));
    }

    #[test]
    fn unmatched_name_is_returned_whole() {
        let mappings = table(&["other"]);
        let qualified = qualify("order[1].amount", &mappings);

        assert_eq!((qualified.base, qualified.remainder), ("order[1].amount", ""));
        assert_eq!(qualified.mapped(&mappings), None);
        assert_eq!(qualify("plain", &HashMap::<String, String>::new()).base, "plain");
    }

    #[test]
    fn component_qualifier_uses_brackets() {
        assert_eq!(component_qualifier(2), "[2]");
    }

    proptest! {
        #[test]
        fn base_and_remainder_rebuild_the_name(
            name in "[a-c]{1,3}([.][a-c]{1,3}|\\[[0-9]\\]){0,4}",
            keys in prop::collection::vec("[a-c]{1,3}([.][a-c]{1,3}|\\[[0-9]\\]){0,2}", 0..5),
        ) {
            let mappings: HashMap<String, String> =
                keys.into_iter().map(|key| (key.clone(), key)).collect();
            let qualified = qualify(&name, &mappings);

            prop_assert_eq!(format!("{}{}", qualified.base, qualified.remainder), name.clone());
            if !qualified.remainder.is_empty() {
                prop_assert!(mappings.contains_key(qualified.base));
            }
        }
    }
}
