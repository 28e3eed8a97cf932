// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Joins detail records with icon thumbnails into [`GameSummary`] values.
//!
//! The join is pure: the same inputs always produce the same output, no record
//! is dropped or duplicated, and a missing thumbnail (or a missing thumbnail
//! set) only ever results in a placeholder icon.

use std::collections::{HashMap, HashSet};

use crate::model::{DetailRecord, GameSummary, ListingRecord, ThumbnailRecord, UniverseId};

pub const PLACEHOLDER_ICON_BASE: &str = "https://placehold.co/150/1F2937/FFFFFF";

pub const DEFAULT_TITLE: &str = "Untitled game";
pub const DEFAULT_DEVELOPER: &str = "Unknown developer";
pub const DEFAULT_GENRE: &str = "Unknown genre";
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// Result of a join, with the number of records that fell back to a placeholder icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub games: Vec<GameSummary>,
    pub placeholder_icons: usize,
}

/// Identifiers of a listing in rank order, without gaps or repeats.
pub fn ranked_ids(listing: &[ListingRecord]) -> Vec<UniverseId> {
    let mut seen = HashSet::with_capacity(listing.len());
    listing
        .iter()
        .filter_map(|record| record.universe_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Arrange detail records in listing rank order.
///
/// Records without an identifier, records for identifiers that were never
/// requested, and repeats of an identifier are dropped.
pub fn order_details(details: Vec<DetailRecord>, ranking: &[UniverseId]) -> Vec<DetailRecord> {
    let rank: HashMap<UniverseId, usize> = ranking
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();

    let mut slots: Vec<Option<DetailRecord>> = vec![None; ranking.len()];
    for record in details {
        let Some(position) = record.id.and_then(|id| rank.get(&id).copied()) else {
            continue;
        };
        if slots[position].is_none() {
            slots[position] = Some(record);
        }
    }

    slots.into_iter().flatten().collect()
}

/// Join `details` with `thumbnails`, preserving the order of `details`.
///
/// `thumbnails` is `None` when the thumbnail call failed outright; every record
/// then receives a placeholder icon.
pub fn join(details: &[DetailRecord], thumbnails: Option<&[ThumbnailRecord]>) -> JoinOutcome {
    let index = thumbnail_index(thumbnails.unwrap_or_default());
    let mut placeholder_icons = 0;

    let games = details
        .iter()
        .filter_map(|record| {
            let id = record.id?;
            let title = non_blank(record.name.as_deref()).unwrap_or(DEFAULT_TITLE);
            let icon = match index.get(&id) {
                Some(url) => (*url).to_string(),
                None => {
                    placeholder_icons += 1;
                    placeholder_icon(title)
                }
            };

            Some(GameSummary {
                id,
                title: title.to_string(),
                developer: non_blank(
                    record.creator.as_ref().and_then(|creator| creator.name.as_deref()),
                )
                .unwrap_or(DEFAULT_DEVELOPER)
                .to_string(),
                genre: non_blank(record.genre.as_deref())
                    .unwrap_or(DEFAULT_GENRE)
                    .to_string(),
                icon,
                description: non_blank(record.description.as_deref())
                    .unwrap_or(DEFAULT_DESCRIPTION)
                    .to_string(),
                visits: record.visits.unwrap_or(0),
                players: record.playing.unwrap_or(0),
            })
        })
        .collect();

    JoinOutcome {
        games,
        placeholder_icons,
    }
}

/// Placeholder icon URL carrying the uppercased first character of `title`.
pub fn placeholder_icon(title: &str) -> String {
    let initial: String = title
        .trim_start()
        .chars()
        .next()
        .unwrap_or('?')
        .to_uppercase()
        .collect();
    format!("{PLACEHOLDER_ICON_BASE}?text={}", urlencoding::encode(&initial))
}

// First usable URL per target wins.
fn thumbnail_index(thumbnails: &[ThumbnailRecord]) -> HashMap<UniverseId, &str> {
    let mut index = HashMap::with_capacity(thumbnails.len());
    for thumbnail in thumbnails {
        let (Some(id), Some(url)) = (thumbnail.target_id, non_blank(thumbnail.image_url.as_deref()))
        else {
            continue;
        };
        index.entry(id).or_insert(url);
    }
    index
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Creator;

    fn detail(id: UniverseId, name: &str) -> DetailRecord {
        DetailRecord {
            id: Some(id),
            name: Some(name.to_string()),
            description: Some(format!("About {name}")),
            creator: Some(Creator {
                name: Some("Studio".to_string()),
            }),
            genre: Some("Adventure".to_string()),
            visits: Some(1_000),
            playing: Some(25),
        }
    }

    fn thumb(id: UniverseId, url: &str) -> ThumbnailRecord {
        ThumbnailRecord {
            target_id: Some(id),
            state: Some("Completed".to_string()),
            image_url: Some(url.to_string()),
        }
    }

    fn listed(id: Option<UniverseId>) -> ListingRecord {
        ListingRecord {
            universe_id: id,
            ..Default::default()
        }
    }

    #[test]
    fn missing_thumbnail_gets_placeholder_from_title() {
        let details = vec![DetailRecord {
            id: Some(1),
            name: Some("Foo".to_string()),
            ..Default::default()
        }];

        let outcome = join(&details, Some(&[][..]));

        assert_eq!(outcome.placeholder_icons, 1);
        assert_eq!(
            outcome.games,
            vec![GameSummary {
                id: 1,
                title: "Foo".to_string(),
                developer: DEFAULT_DEVELOPER.to_string(),
                genre: DEFAULT_GENRE.to_string(),
                icon: "https://placehold.co/150/1F2937/FFFFFF?text=F".to_string(),
                description: DEFAULT_DESCRIPTION.to_string(),
                visits: 0,
                players: 0,
            }]
        );
    }

    #[test]
    fn matching_thumbnail_is_used_as_icon() {
        let details = vec![detail(1, "Foo")];
        let thumbnails = vec![thumb(1, "https://img/1.png")];

        let outcome = join(&details, Some(thumbnails.as_slice()));

        assert_eq!(outcome.games[0].icon, "https://img/1.png");
        assert_eq!(outcome.placeholder_icons, 0);
        assert_eq!(outcome.games[0].developer, "Studio");
        assert_eq!(outcome.games[0].players, 25);
        assert_eq!(outcome.games[0].visits, 1_000);
    }

    #[test]
    fn failed_thumbnail_set_degrades_every_icon() {
        let details = vec![detail(1, "alpha"), detail(2, "beta"), detail(3, "gamma")];

        let outcome = join(&details, None);

        assert_eq!(outcome.games.len(), 3);
        assert_eq!(outcome.placeholder_icons, 3);
        let icons: Vec<_> = outcome.games.iter().map(|g| g.icon.as_str()).collect();
        assert_eq!(
            icons,
            vec![
                "https://placehold.co/150/1F2937/FFFFFF?text=A",
                "https://placehold.co/150/1F2937/FFFFFF?text=B",
                "https://placehold.co/150/1F2937/FFFFFF?text=G",
            ]
        );
    }

    #[test]
    fn output_preserves_input_order_and_length() {
        let details = vec![detail(30, "c"), detail(10, "a"), detail(20, "b")];
        let thumbnails = vec![thumb(20, "https://img/20.png"), thumb(99, "https://img/99.png")];

        let outcome = join(&details, Some(thumbnails.as_slice()));

        let ids: Vec<_> = outcome.games.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(outcome.games[2].icon, "https://img/20.png");
        assert_eq!(outcome.placeholder_icons, 2);
    }

    #[test]
    fn join_is_idempotent() {
        let details = vec![detail(1, "Foo"), detail(2, "Bar")];
        let thumbnails = vec![thumb(2, "https://img/2.png")];

        let first = serde_json::to_vec(&join(&details, Some(thumbnails.as_slice())).games).unwrap();
        let second = serde_json::to_vec(&join(&details, Some(thumbnails.as_slice())).games).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn blank_or_null_image_url_falls_back_to_placeholder() {
        let details = vec![detail(1, "Foo"), detail(2, "Bar")];
        let thumbnails = vec![
            ThumbnailRecord {
                target_id: Some(1),
                state: Some("Blocked".to_string()),
                image_url: None,
            },
            thumb(2, "   "),
        ];

        let outcome = join(&details, Some(thumbnails.as_slice()));

        assert!(outcome.games.iter().all(|g| g.icon.starts_with(PLACEHOLDER_ICON_BASE)));
    }

    #[test]
    fn first_thumbnail_for_a_target_wins() {
        let details = vec![detail(1, "Foo")];
        let thumbnails = vec![thumb(1, "https://img/first.png"), thumb(1, "https://img/second.png")];

        let outcome = join(&details, Some(thumbnails.as_slice()));

        assert_eq!(outcome.games[0].icon, "https://img/first.png");
    }

    #[test]
    fn records_without_identifier_are_skipped() {
        let details = vec![
            DetailRecord {
                name: Some("Ghost".to_string()),
                ..Default::default()
            },
            detail(4, "Real"),
        ];

        let outcome = join(&details, None);

        assert_eq!(outcome.games.len(), 1);
        assert_eq!(outcome.games[0].id, 4);
    }

    #[test]
    fn blank_strings_take_defaults() {
        let details = vec![DetailRecord {
            id: Some(5),
            name: Some("".to_string()),
            description: Some("  ".to_string()),
            creator: Some(Creator { name: None }),
            genre: Some(String::new()),
            ..Default::default()
        }];

        let game = &join(&details, None).games[0];

        assert_eq!(game.title, DEFAULT_TITLE);
        assert_eq!(game.developer, DEFAULT_DEVELOPER);
        assert_eq!(game.genre, DEFAULT_GENRE);
        assert_eq!(game.description, DEFAULT_DESCRIPTION);
        assert_eq!(game.icon, "https://placehold.co/150/1F2937/FFFFFF?text=U");
    }

    #[test]
    fn placeholder_initial_is_uppercased_and_encoded() {
        assert_eq!(placeholder_icon("éclair"), format!("{PLACEHOLDER_ICON_BASE}?text=%C3%89"));
        assert_eq!(placeholder_icon("#1 obby"), format!("{PLACEHOLDER_ICON_BASE}?text=%23"));
        assert_eq!(placeholder_icon("  spaced"), format!("{PLACEHOLDER_ICON_BASE}?text=S"));
    }

    #[test]
    fn ranked_ids_skip_missing_and_repeated_identifiers() {
        let listing = vec![listed(Some(3)), listed(None), listed(Some(1)), listed(Some(3))];

        assert_eq!(ranked_ids(&listing), vec![3, 1]);
    }

    #[test]
    fn details_follow_listing_rank() {
        let details = vec![
            detail(1, "one"),
            detail(7, "unrequested"),
            detail(3, "three"),
            detail(1, "one again"),
            DetailRecord::default(),
        ];

        let ordered = order_details(details, &[3, 1, 2]);

        let names: Vec<_> = ordered.iter().filter_map(|d| d.name.as_deref()).collect();
        assert_eq!(names, vec!["three", "one"]);
    }
}
