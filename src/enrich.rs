use crate::data::{CatalogEntry, EntryId, PageReference, RecordDetail};
use crate::source::{CatalogSource, SourceError};
use crate::translate::TranslationLookup;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("record #{id} ({name}) lists no types")]
    MissingCategory { id: EntryId, name: String },
    #[error("record {name} has id 0; ids start at 1")]
    InvalidId { name: String },
    #[error("enrichment of {name} did not finish: {reason}")]
    Interrupted { name: String, reason: String },
}

/// Fetches the detail record behind `reference` and resolves it into a
/// catalog entry.
pub async fn enrich<S, L>(
    source: &S,
    lookup: &L,
    reference: &PageReference,
) -> Result<CatalogEntry, EnrichError>
where
    S: CatalogSource + ?Sized,
    L: TranslationLookup + ?Sized,
{
    let record = source.fetch_record(reference).await?;
    build_entry(record, lookup)
}

pub fn build_entry<L>(record: RecordDetail, lookup: &L) -> Result<CatalogEntry, EnrichError>
where
    L: TranslationLookup + ?Sized,
{
    let RecordDetail {
        id,
        name,
        sprites,
        types,
    } = record;
    if id == 0 {
        return Err(EnrichError::InvalidId { name });
    }
    let Some(primary) = types.into_iter().next() else {
        return Err(EnrichError::MissingCategory { id, name });
    };
    let kind = primary.kind.name;
    let localized = lookup.localize(&name, &kind);
    Ok(CatalogEntry {
        id,
        name,
        image: sprites.other.official_artwork.front_default,
        icon_image: sprites.other.dream_world.front_default,
        kind,
        localized_name: localized.name,
        localized_type: localized.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{MemorySource, record_json, record_url};
    use crate::translate::{TranslationTables, UNKNOWN_NAME, UNKNOWN_TYPE};
    use serde_json::json;

    fn reference(name: &str) -> PageReference {
        PageReference::new(name, record_url(name))
    }

    #[test]
    fn first_type_becomes_primary() {
        let mut payload = record_json(1, "bulbasaur", Some("grass"));
        payload["types"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "slot": 2, "type": { "name": "poison" } }));
        let record: RecordDetail = serde_json::from_value(payload).unwrap();
        let entry = build_entry(record, TranslationTables::embedded()).unwrap();
        assert_eq!(entry.kind, "grass");
        assert_eq!(entry.localized_name, "フシギダネ");
        assert_eq!(entry.localized_type, "くさ");
        assert_eq!(entry.image.as_deref(), Some("https://img/art/1.png"));
        assert_eq!(entry.icon_image.as_deref(), Some("https://img/dream/1.svg"));
    }

    #[test]
    fn empty_type_list_fails() {
        let record: RecordDetail =
            serde_json::from_value(record_json(3, "venusaur", None)).unwrap();
        let err = build_entry(record, TranslationTables::embedded()).unwrap_err();
        assert!(matches!(err, EnrichError::MissingCategory { id: 3, .. }));
    }

    #[test]
    fn zero_id_fails() {
        let record: RecordDetail =
            serde_json::from_value(record_json(0, "missingno", Some("normal"))).unwrap();
        let err = build_entry(record, TranslationTables::embedded()).unwrap_err();
        assert!(matches!(err, EnrichError::InvalidId { ref name } if name == "missingno"));
    }

    #[test]
    fn lookup_miss_is_not_an_error() {
        let record: RecordDetail =
            serde_json::from_value(record_json(906, "sprigatito", Some("shadow"))).unwrap();
        let entry = build_entry(record, TranslationTables::embedded()).unwrap();
        assert_eq!(entry.localized_name, UNKNOWN_NAME);
        assert_eq!(entry.localized_type, UNKNOWN_TYPE);
    }

    #[tokio::test]
    async fn enrich_fetches_by_reference_url() {
        let source = MemorySource::new().record("charmander", 4, Some("fire"));
        let entry = enrich(&source, TranslationTables::embedded(), &reference("charmander"))
            .await
            .unwrap();
        assert_eq!(entry.id, 4);
        assert_eq!(entry.localized_name, "ヒトカゲ");
    }

    #[tokio::test]
    async fn malformed_detail_surfaces_decode_error() {
        let source = MemorySource::new().raw_record(
            "ditto",
            json!({ "id": 132, "name": "ditto", "sprites": {}, "types": [] }),
        );
        let err = enrich(&source, TranslationTables::embedded(), &reference("ditto"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::Source(SourceError::Decode { .. })));
    }
}
