//! Static badge catalog used for "badge awarded" notifications.

/// Display name and description of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Shown for badge ids the catalog does not know yet.
pub const UNKNOWN_BADGE: BadgeInfo = BadgeInfo {
    name: "Nový odznak",
    description: "Získal/a jsi nový odznak. Podívej se na svůj profil!",
};

const BADGES: &[(&str, BadgeInfo)] = &[
    (
        "first_car",
        BadgeInfo {
            name: "První auto",
            description: "Přidal/a jsi své první auto do garáže.",
        },
    ),
    (
        "garage_collector",
        BadgeInfo {
            name: "Sběratel",
            description: "V garáži máš pět a více aut.",
        },
    ),
    (
        "first_event",
        BadgeInfo {
            name: "Nováček na srazu",
            description: "Zúčastnil/a ses své první akce.",
        },
    ),
    (
        "event_regular",
        BadgeInfo {
            name: "Štamgast",
            description: "Zúčastnil/a ses deseti akcí.",
        },
    ),
    (
        "event_organizer",
        BadgeInfo {
            name: "Organizátor",
            description: "Uspořádal/a jsi svou první akci.",
        },
    ),
    (
        "trackday_hero",
        BadgeInfo {
            name: "Okruhový jezdec",
            description: "Zúčastnil/a ses trackdaye.",
        },
    ),
    (
        "sos_helper",
        BadgeInfo {
            name: "Anděl strážný",
            description: "Pomohl/a jsi někomu v nouzi.",
        },
    ),
    (
        "social_butterfly",
        BadgeInfo {
            name: "Společenský typ",
            description: "Máš deset a více přátel.",
        },
    ),
    (
        "marketplace_seller",
        BadgeInfo {
            name: "Obchodník",
            description: "Vystavil/a jsi svůj první inzerát.",
        },
    ),
    (
        "road_tripper",
        BadgeInfo {
            name: "Cestovatel",
            description: "Sdílel/a jsi polohu během vyjížďky.",
        },
    ),
];

/// Look up a badge, falling back to [`UNKNOWN_BADGE`].
pub fn badge_info(id: &str) -> BadgeInfo {
    BADGES
        .iter()
        .find(|(badge_id, _)| *badge_id == id)
        .map(|(_, info)| *info)
        .unwrap_or(UNKNOWN_BADGE)
}
