//! Identifier case conversion
//!
//! Words are split on separators (`-`, `_`, whitespace) and on case
//! boundaries, keeping acronyms together (`HTTPServer` → `HTTP`, `Server`).

/// Split an identifier into its words
#[must_use]
pub fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `OrderCocktail` → `order-cocktail`
#[must_use]
pub fn to_kebab(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// `drink_name` → `drinkName`
#[must_use]
pub fn to_camel(input: &str) -> String {
    let mut out = String::new();
    for (i, word) in words(input).iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// `drink-read-model` → `DrinkReadModel`
#[must_use]
pub fn to_pascal(input: &str) -> String {
    words(input).iter().map(|w| capitalize(w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn kebab() {
        assert_eq!(to_kebab("OrderCocktail"), "order-cocktail");
        assert_eq!(to_kebab("DrinkReadModel"), "drink-read-model");
        assert_eq!(to_kebab("HTTPServer"), "http-server");
        assert_eq!(to_kebab("already-kebab"), "already-kebab");
    }

    #[test]
    fn camel() {
        assert_eq!(to_camel("drink_name"), "drinkName");
        assert_eq!(to_camel("Drink"), "drink");
        assert_eq!(to_camel("tid"), "tid");
        assert_eq!(to_camel("createdAt"), "createdAt");
        assert_eq!(to_camel("ID"), "id");
    }

    #[test]
    fn pascal() {
        assert_eq!(to_pascal("drink-read-model"), "DrinkReadModel");
        assert_eq!(to_pascal("order cocktail"), "OrderCocktail");
        assert_eq!(to_pascal(""), "");
    }

    #[test]
    fn digits_stay_attached() {
        assert_eq!(words("drink2Go"), vec!["drink2", "Go"]);
    }

    proptest! {
        #[test]
        fn kebab_is_idempotent(input in "[A-Za-z0-9_ -]{0,24}") {
            let once = to_kebab(&input);
            prop_assert_eq!(to_kebab(&once), once);
        }

        #[test]
        fn pascal_round_trips_through_kebab(parts in prop::collection::vec("[a-z]{2,8}", 1..5)) {
            let kebab = parts.join("-");
            prop_assert_eq!(to_kebab(&to_pascal(&kebab)), kebab);
        }
    }
}
