//! Marketplace announcements: new listings and cars put up for sale.

use garage_core::channels::CHANNEL_MARKETPLACE;
use garage_core::models::{Car, MarketplaceListing};
use garage_core::notification_types::{TYPE_CAR_FOR_SALE, TYPE_MARKETPLACE_LISTING};
use garage_core::settings::Category;
use garage_core::text;

use super::{Delivery, Outgoing, TriggerContext, TriggerError};
use crate::bus::DocumentChange;

/// Body of a listing notification: title and, when set, the price.
pub fn listing_body(listing: &MarketplaceListing) -> String {
    match listing.price {
        Some(price) => format!("{} · {}", listing.title, text::format_price(price)),
        None => listing.title.clone(),
    }
}

/// An active listing is announced to opted-in users other than its author.
pub async fn on_listing_created(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let listing: MarketplaceListing = change.decode_after()?;
    if !listing.is_active {
        return Ok(Delivery::default());
    }

    let recipients = ctx
        .resolver
        .by_category(Category::MarketplaceNotifications)
        .await?;

    let title = format!("🛒 Nový inzerát: {}", listing.listing_type.label());
    let body = listing_body(&listing);

    let outgoing = recipients
        .iter()
        .filter(|r| r.uid != listing.user_id)
        .map(|r| {
            Outgoing::to(r, CHANNEL_MARKETPLACE, TYPE_MARKETPLACE_LISTING, &title, &body)
                .with_data("listingId", &listing.id)
        })
        .collect();

    Ok(ctx.fan_out("marketplace_listing", outgoing).await)
}

/// A car switching to `forSale` is announced like a listing.
pub async fn on_car_for_sale(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let before: Car = change.decode_before()?;
    let after: Car = change.decode_after()?;
    if before.for_sale || !after.for_sale {
        return Ok(Delivery::default());
    }

    let recipients = ctx
        .resolver
        .by_category(Category::MarketplaceNotifications)
        .await?;

    let car = after.make_and_model();
    let body = if car.is_empty() {
        after.display_name()
    } else {
        car
    };

    let outgoing = recipients
        .iter()
        .filter(|r| r.uid != after.owner_id)
        .map(|r| {
            Outgoing::to(r, CHANNEL_MARKETPLACE, TYPE_CAR_FOR_SALE, "🚗 Auto na prodej", &body)
                .with_data("carId", &after.id)
        })
        .collect();

    Ok(ctx.fan_out("car_for_sale", outgoing).await)
}
