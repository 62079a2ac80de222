//! Case folding for search and ordering.
//!
//! SQLite's `LIKE` and default collation only fold ASCII. Rows therefore
//! carry pre-folded copies of their searchable text (`search_text`) and of
//! their sort names (`name_key`), built here with Unicode-aware lowercasing,
//! and queries are folded the same way before they reach SQL.

/// Separates folded fields so a match cannot straddle two of them.
pub const FIELD_SEPARATOR: char = '\n';

/// Unicode lowercase of `value`.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Folds and joins the searchable fields of one row.
pub fn search_text<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut text = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            text.push(FIELD_SEPARATOR);
        }
        text.push_str(&fold_case(field));
    }
    text
}

/// Sort key for a multi-part name: folded parts in order.
///
/// The separator sorts below every printable character, so `("Ivanov",
/// "Petr")` orders before `("Ivanova", "Anna")` just as a column-by-column
/// `ORDER BY` would.
pub fn name_key<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    search_text(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case_handles_cyrillic() {
        assert_eq!(fold_case("Ноутбуки"), "ноутбуки");
        assert_eq!(fold_case("НОУТБУКИ"), fold_case("ноутбуки"));
        assert_eq!(fold_case("ThinkPad"), "thinkpad");
    }

    #[test]
    fn test_search_text_joins_fields() {
        assert_eq!(search_text(["INV-1", "", "Склад"]), "inv-1\n\nсклад");
        assert_eq!(search_text(std::iter::empty()), "");
    }

    #[test]
    fn test_name_key_orders_like_columns() {
        let short = name_key(["Ivanov", "Petr"]);
        let long = name_key(["Ivanova", "Anna"]);
        assert!(short < long);

        // Case no longer splits upper- and lower-case names apart.
        assert!(name_key(["apple"]) < name_key(["Zebra"]));
        assert!(name_key(["Яблоко"]) > name_key(["апельсин"]));
    }
}
