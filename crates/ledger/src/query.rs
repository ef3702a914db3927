//! Customer search predicate.

use crate::customer::Customer;

/// Case-insensitive substring search over name, phone and email.
///
/// An empty (or whitespace-only) term matches every customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    term: String,
}

impl CustomerQuery {
    pub fn new(term: impl AsRef<str>) -> Self {
        Self {
            term: term.as_ref().trim().to_lowercase(),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        if self.term.is_empty() {
            return true;
        }

        let profile = customer.profile();
        [
            Some(profile.name.as_str()),
            profile.phone.as_deref(),
            profile.email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&self.term))
    }

    /// Borrowing predicate usable with `LedgerStore::list_customers`.
    pub fn predicate(&self) -> impl Fn(&Customer) -> bool + Clone + '_ {
        move |customer| self.matches(customer)
    }
}
