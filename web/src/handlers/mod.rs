//! HTTP request handlers, one module per route group.
//!
//! Page content is deliberately thin: each page gets the shared header
//! fields from [`PageContext`] plus whatever the view needs.

pub mod health;
pub mod owners;
pub mod products;
pub mod shop;
pub mod users;

pub use health::health_check;

use serde::Serialize;
use storefront_session::Session;

/// Session key holding the number of items in the cart.
pub const CART_COUNT_KEY: &str = "cartCount";

/// Header fields every page renders.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    /// Page title
    pub title: String,
    /// A principal is signed in
    pub loggedin: bool,
    /// Items in the cart
    #[serde(rename = "cartCount")]
    pub cart_count: u32,
}

impl PageContext {
    /// Build the header fields for `session`.
    #[must_use]
    pub fn for_session(session: &Session, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            loggedin: session.identity().is_some(),
            cart_count: session.get(CART_COUNT_KEY).unwrap_or(0),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use storefront_session::{Identity, SessionRecord};

    #[test]
    fn test_page_context_reads_session() {
        let session = Session::loaded(SessionRecord::new());
        let page = PageContext::for_session(&session, "Shop");
        assert!(!page.loggedin);
        assert_eq!(page.cart_count, 0);

        session.insert(CART_COUNT_KEY, 3).unwrap();
        session.sign_in(Identity::shopper("shopper@example.com"));
        let page = PageContext::for_session(&session, "Shop");
        assert!(page.loggedin);
        assert_eq!(page.cart_count, 3);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["cartCount"], 3);
    }
}
