// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Upstream payload schemas and the normalized output record.
//!
//! Upstream records are deliberately loose: every field except the ones the
//! envelope itself depends on is optional, and defaulting happens in the
//! joiner rather than during decoding.

use serde::{Deserialize, Serialize};

/// Platform-assigned identifier shared by listing, detail and thumbnail records.
pub type UniverseId = u64;

/// One entry of the listing endpoint (`/v1/games/list`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    #[serde(default)]
    pub universe_id: Option<UniverseId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub place_id: Option<u64>,
    #[serde(default)]
    pub player_count: Option<u64>,
}

/// Listing envelope. An absent `games` array is treated as an empty listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub games: Option<Vec<ListingRecord>>,
}

impl ListingPage {
    pub fn into_records(self) -> Vec<ListingRecord> {
        self.games.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Creator {
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of the detail endpoint (`/v1/games?universeIds=`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetailRecord {
    #[serde(default)]
    pub id: Option<UniverseId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creator: Option<Creator>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub visits: Option<u64>,
    #[serde(default)]
    pub playing: Option<u64>,
}

/// One entry of the icon endpoint (`/v1/games/icons`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailRecord {
    #[serde(default)]
    pub target_id: Option<UniverseId>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `{ "data": [...] }` envelope used by both the detail and icon endpoints.
/// Unlike the listing envelope, a missing `data` array is a malformed body.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}

/// Normalized record returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: UniverseId,
    pub title: String,
    pub developer: String,
    pub genre: String,
    pub icon: String,
    pub description: String,
    pub visits: u64,
    pub players: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct GamesQuery {
    #[serde(default)]
    pub term: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_without_games_array_is_empty() {
        let page: ListingPage = serde_json::from_str(r#"{"nextPageToken": null}"#).unwrap();
        assert!(page.into_records().is_empty());
    }

    #[test]
    fn listing_record_tolerates_missing_identifier() {
        let page: ListingPage =
            serde_json::from_str(r#"{"games":[{"name":"No id"},{"universeId":7,"name":"Seven"}]}"#)
                .unwrap();
        let records = page.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].universe_id, None);
        assert_eq!(records[1].universe_id, Some(7));
    }

    #[test]
    fn detail_envelope_requires_data() {
        let result = serde_json::from_str::<DataEnvelope<DetailRecord>>(r#"{"errors":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn detail_record_reads_nested_creator() {
        let envelope: DataEnvelope<DetailRecord> = serde_json::from_str(
            r#"{"data":[{"id":1,"name":"Foo","creator":{"id":9,"name":"Builder","type":"User"},"playing":12,"visits":3400,"genre":"All"}]}"#,
        )
        .unwrap();
        let record = &envelope.data[0];
        assert_eq!(record.creator.as_ref().and_then(|c| c.name.as_deref()), Some("Builder"));
        assert_eq!(record.playing, Some(12));
        assert_eq!(record.description, None);
    }

    #[test]
    fn thumbnail_image_url_may_be_null() {
        let envelope: DataEnvelope<ThumbnailRecord> = serde_json::from_str(
            r#"{"data":[{"targetId":1,"state":"Blocked","imageUrl":null}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.data[0].target_id, Some(1));
        assert_eq!(envelope.data[0].image_url, None);
    }
}
