//! Keyword based categorization.
//!
//! Groups are checked in order and the first keyword found in the merchant
//! or in the description wins, so `"Uber Eats"` is `Transport`, not
//! `Food & Drink`.

use std::fmt;

use api_types::categorize::TransactionKind;

/// Debits above this amount (in pence) get a second look for rent and wages.
const LARGE_AMOUNT_MINOR: i64 = 700_00;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Income,
    Transport,
    FoodAndDrink,
    Shopping,
    Groceries,
    Entertainment,
    BillsAndUtilities,
    Atm,
    Housing,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Transport => "Transport",
            Self::FoodAndDrink => "Food & Drink",
            Self::Shopping => "Shopping",
            Self::Groceries => "Groceries",
            Self::Entertainment => "Entertainment",
            Self::BillsAndUtilities => "Bills & Utilities",
            Self::Atm => "ATM",
            Self::Housing => "Housing",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const KEYWORD_GROUPS: &[(Category, &[&str])] = &[
    (Category::Income, &["salary", "deposit", "income", "gift"]),
    (
        Category::Transport,
        &[
            "uber", "lyft", "taxi", "transport", "tfl", "bus", "train", "metro", "subway",
        ],
    ),
    (
        Category::FoodAndDrink,
        &[
            "starbucks",
            "costa",
            "cafe",
            "restaurant",
            "mcdonalds",
            "kfc",
            "pizza",
            "food",
            "coffee",
            "tea",
        ],
    ),
    (
        Category::Shopping,
        &[
            "amazon", "ebay", "shop", "store", "retail", "market", "mall", "clothing", "fashion",
        ],
    ),
    (
        Category::Groceries,
        &[
            "tesco",
            "sainsbury",
            "asda",
            "morrisons",
            "waitrose",
            "aldi",
            "lidl",
            "grocery",
            "supermarket",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "cinema",
            "movie",
            "netflix",
            "spotify",
            "apple music",
            "game",
            "entertainment",
            "theatre",
        ],
    ),
    (
        Category::BillsAndUtilities,
        &[
            "electric",
            "gas",
            "water",
            "internet",
            "phone",
            "insurance",
            "council tax",
            "utility",
            "energy",
        ],
    ),
];

/// Picks a category for a transaction. Never fails: anything unmatched is
/// [`Category::Other`].
pub fn categorize(
    merchant: &str,
    description: Option<&str>,
    amount_minor: i64,
    kind: TransactionKind,
) -> Category {
    if kind == TransactionKind::Credit {
        return Category::Income;
    }

    let merchant = merchant.to_lowercase();
    let description = description.unwrap_or_default().to_lowercase();

    let matched = KEYWORD_GROUPS.iter().find(|(_, keywords)| {
        keywords
            .iter()
            .any(|keyword| merchant.contains(keyword) || description.contains(keyword))
    });
    if let Some((category, _)) = matched {
        return *category;
    }

    if merchant.contains("atm") || merchant.contains("cash") {
        return Category::Atm;
    }

    if amount_minor > LARGE_AMOUNT_MINOR {
        if description.contains("salary") || description.contains("wages") {
            return Category::Income;
        }
        if description.contains("rent") || description.contains("mortgage") {
            return Category::Housing;
        }
    }

    Category::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debit(merchant: &str, description: Option<&str>, amount_minor: i64) -> Category {
        categorize(merchant, description, amount_minor, TransactionKind::Debit)
    }

    #[test]
    fn credits_are_income() {
        let category = categorize("Tesco", None, 10_00, TransactionKind::Credit);
        assert_eq!(category, Category::Income);
    }

    #[test]
    fn merchant_keywords_are_case_insensitive() {
        assert_eq!(debit("TESCO Express", None, 12_00), Category::Groceries);
        assert_eq!(debit("Costa Coffee", None, 3_20), Category::FoodAndDrink);
        assert_eq!(debit("Spotify", None, 9_99), Category::Entertainment);
        assert_eq!(debit("British Gas", None, 80_00), Category::BillsAndUtilities);
    }

    #[test]
    fn description_keywords_count_too() {
        let category = debit("J Smith", Some("Birthday gift"), 20_00);
        assert_eq!(category, Category::Income);
    }

    #[test]
    fn earlier_group_wins() {
        assert_eq!(debit("Uber Eats", Some("food"), 15_00), Category::Transport);
        assert_eq!(debit("Amazon", Some("supermarket order"), 30_00), Category::Shopping);
    }

    #[test]
    fn keywords_match_inside_words() {
        // "netflix" contains "tfl"
        assert_eq!(debit("Netflix", None, 9_99), Category::Transport);
        assert_eq!(debit("Odeon cinema", None, 12_00), Category::Entertainment);
    }

    #[test]
    fn cash_machine_matches_merchant_only() {
        assert_eq!(debit("Barclays ATM", None, 50_00), Category::Atm);
        assert_eq!(debit("Mr Jones", Some("cash back"), 50_00), Category::Other);
    }

    #[test]
    fn large_debits_look_for_rent() {
        assert_eq!(debit("Landlord", Some("October rent"), 950_00), Category::Housing);
        assert_eq!(debit("Landlord", Some("October rent"), 700_00), Category::Other);
        assert_eq!(debit("ACME Ltd", Some("wages"), 1200_00), Category::Income);
    }

    #[test]
    fn unmatched_is_other() {
        assert_eq!(debit("Zzz", None, 1_00), Category::Other);
        assert_eq!(Category::Other.to_string(), "Other");
    }
}
