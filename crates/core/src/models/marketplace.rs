use serde::{Deserialize, Serialize};

use super::{null_default, Document};
use crate::types::DocId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Car,
    Parts,
    Accessories,
    Service,
    Wanted,
    #[default]
    #[serde(other)]
    Other,
}

impl ListingType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Car => "Auto",
            Self::Parts => "Díly",
            Self::Accessories => "Příslušenství",
            Self::Service => "Služba",
            Self::Wanted => "Poptávka",
            Self::Other => "Inzerát",
        }
    }
}

/// A `marketplace/{listingId}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketplaceListing {
    #[serde(skip)]
    pub id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub user_id: DocId,
    #[serde(deserialize_with = "null_default")]
    pub title: String,
    #[serde(rename = "type", deserialize_with = "null_default")]
    pub listing_type: ListingType,
    pub price: Option<f64>,
    #[serde(deserialize_with = "null_default")]
    pub is_active: bool,
}

impl Document for MarketplaceListing {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::decode;

    #[test]
    fn type_field_maps_to_listing_type() {
        let listing: MarketplaceListing = decode(
            "l1",
            json!({ "userId": "u1", "title": "Alu kola", "type": "parts", "price": 12000, "isActive": true }),
        )
        .unwrap();
        assert_eq!(listing.listing_type, ListingType::Parts);
        assert_eq!(listing.price, Some(12000.0));
        assert!(listing.is_active);
    }

    #[test]
    fn missing_is_active_means_inactive() {
        let listing: MarketplaceListing = decode("l1", json!({ "title": "x" })).unwrap();
        assert!(!listing.is_active);
    }
}
