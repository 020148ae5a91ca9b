//! SOS beacon handlers. Everything here goes out on the alerts channel.

use garage_core::channels::CHANNEL_ALERTS;
use garage_core::models::{BeaconStatus, HelpBeacon};
use garage_core::notification_types::{TYPE_BEACON_HELP_COMING, TYPE_BEACON_RESOLVED, TYPE_SOS_BEACON};
use garage_core::settings::Category;

use super::{Delivery, Outgoing, TriggerContext, TriggerError};
use crate::bus::DocumentChange;

/// A new beacon alerts every opted-in user except the one asking for help.
pub async fn on_beacon_created(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let beacon: HelpBeacon = change.decode_after()?;

    let title = format!("🆘 SOS: {}", beacon.beacon_type.label());
    let name = display_name_or_default(&beacon.display_name);
    let body = match beacon.description() {
        Some(description) => format!("{name} potřebuje pomoc: {description}"),
        None => format!("{name} potřebuje pomoc na cestě"),
    };

    let recipients = ctx.resolver.by_category(Category::SosAlerts).await?;
    let outgoing = recipients
        .iter()
        .filter(|r| r.uid != beacon.user_id)
        .map(|r| {
            Outgoing::to(r, CHANNEL_ALERTS, TYPE_SOS_BEACON, &title, &body)
                .with_data("beaconId", &beacon.id)
                .with_data("userId", &beacon.user_id)
        })
        .collect();

    Ok(ctx.fan_out("sos_beacon", outgoing).await)
}

/// Status transitions notify the other side of the rescue.
///
/// `active → help_coming` tells the creator that help is on the way;
/// `help_coming → resolved` thanks the helper. The two checks are
/// independent.
pub async fn on_beacon_status_changed(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let before: HelpBeacon = change.decode_before()?;
    let after: HelpBeacon = change.decode_after()?;
    let mut outgoing = Vec::new();

    if before.status == BeaconStatus::Active && after.status == BeaconStatus::HelpComing {
        let helper = after.helper_name.as_deref().unwrap_or("Někdo");
        let creator = ctx.resolver.single(&after.user_id).await?;
        let acting_on_own = after.helper_id.as_deref() == Some(after.user_id.as_str());

        if let Some(recipient) = creator.recipient(&after.user_id, Category::SosAlerts) {
            if !acting_on_own {
                outgoing.push(
                    Outgoing::to(
                        &recipient,
                        CHANNEL_ALERTS,
                        TYPE_BEACON_HELP_COMING,
                        "🚗 Pomoc je na cestě",
                        format!("{helper} ti jede na pomoc"),
                    )
                    .with_data("beaconId", &after.id)
                    .with_data("helperId", after.helper_id.clone().unwrap_or_default()),
                );
            }
        }
    }

    if before.status == BeaconStatus::HelpComing && after.status == BeaconStatus::Resolved {
        match after.helper_id.as_deref() {
            Some(helper_id) if helper_id != after.user_id => {
                let helper = ctx.resolver.single(helper_id).await?;
                if let Some(recipient) = helper.recipient(helper_id, Category::SosAlerts) {
                    let name = display_name_or_default(&after.display_name);
                    outgoing.push(
                        Outgoing::to(
                            &recipient,
                            CHANNEL_ALERTS,
                            TYPE_BEACON_RESOLVED,
                            "✅ SOS vyřešeno",
                            format!("{name} děkuje za pomoc"),
                        )
                        .with_data("beaconId", &after.id),
                    );
                }
            }
            Some(_) => {}
            None => tracing::debug!(beacon_id = %after.id, "Resolved beacon has no helper"),
        }
    }

    Ok(ctx.fan_out("beacon_status", outgoing).await)
}

fn display_name_or_default(name: &str) -> &str {
    match name.trim() {
        "" => "Řidič",
        trimmed => trimmed,
    }
}
