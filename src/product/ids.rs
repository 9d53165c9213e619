//! `ProductId` is a short, human-assigned catalog code (e.g. `"SKU-1029"`),
//! not a generated UUID (spec.md §3.1) — products are created by a catalog
//! process external to this service and carry their own identifier in.

use std::fmt;
use std::str::FromStr;

use fake::Fake;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(raw: impl Into<String>) -> Self {
        ProductId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProductId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ProductId(s.to_string()))
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        ProductId(value)
    }
}

impl From<ProductId> for String {
    fn from(value: ProductId) -> String {
        value.0
    }
}

impl fake::Dummy<fake::Faker> for ProductId {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &fake::Faker, rng: &mut R) -> Self {
        let code: String = fake::faker::lorem::en::Word().fake_with_rng(rng);
        let suffix: u32 = (1000..9999).fake_with_rng(rng);
        ProductId(format!("{code}-{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::ProductId;

    #[test]
    fn product_id_round_trips_through_display_and_from_str() {
        let id = ProductId::new("SKU-42");
        let parsed: ProductId = id.to_string().parse().expect("infallible");
        assert_eq!(id, parsed);
    }
}
