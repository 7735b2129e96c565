//! Field mapper: merge one canonical record into one target item.
//!
//! The mapping is table-driven: a scalar rule set shared by every item type
//! plus per-type rule sets, each rule naming a canonical source field, a
//! target field and an optional transform. A rule whose source field is
//! absent from the record leaves the target field untouched, so re-applying
//! the same record is idempotent and never clears existing data.

use citefetch_bib::CanonicalRecord;

use crate::store::{Creator, ItemId, ItemStore, ItemType, StoreError, TypeChange};

/// Map a BibTeX entry type onto the target taxonomy.
///
/// Unknown tags resolve to [`ItemType::JournalArticle`].
pub fn resolve_item_type(entry_type: &str) -> ItemType {
    match entry_type {
        "article" => ItemType::JournalArticle,
        "inproceedings" | "conference" => ItemType::ConferencePaper,
        "incollection" => ItemType::BookSection,
        "phdthesis" | "mastersthesis" => ItemType::Thesis,
        "www" => ItemType::Webpage,
        "manual" | "misc" => ItemType::Document,
        "techreport" => ItemType::Report,
        "unpublished" => ItemType::Unpublished,
        "dataset" => ItemType::Dataset,
        "software" => ItemType::Software,
        "patent" => ItemType::Patent,
        _ => ItemType::JournalArticle,
    }
}

type Transform = fn(&str) -> String;

struct FieldRule {
    source: &'static str,
    target: &'static str,
    transform: Option<Transform>,
}

const fn rule(source: &'static str, target: &'static str) -> FieldRule {
    FieldRule {
        source,
        target,
        transform: None,
    }
}

/// Copied for every item type.
const SCALAR_RULES: &[FieldRule] = &[
    rule("title", "title"),
    rule("year", "date"),
    rule("doi", "DOI"),
    rule("url", "url"),
    rule("pages", "pages"),
    rule("volume", "volume"),
    rule("publisher", "publisher"),
    rule("series", "series"),
    rule("address", "place"),
    rule("isbn", "ISBN"),
    rule("abstract", "abstractNote"),
];

// Later rules overwrite earlier ones, so `journal` wins over `venue` and an
// explicit `issue` wins over `number`.
const JOURNAL_RULES: &[FieldRule] = &[
    rule("venue", "publicationTitle"),
    rule("journal", "publicationTitle"),
    rule("journal", "journalAbbreviation"),
    rule("number", "issue"),
    rule("issue", "issue"),
];

const CONFERENCE_RULES: &[FieldRule] = &[
    FieldRule {
        source: "booktitle",
        target: "proceedingsTitle",
        transform: Some(proceedings_title),
    },
    FieldRule {
        source: "booktitle",
        target: "conferenceName",
        transform: Some(conference_name),
    },
];

fn type_rules(item_type: ItemType) -> &'static [FieldRule] {
    match item_type {
        ItemType::JournalArticle => JOURNAL_RULES,
        ItemType::ConferencePaper => CONFERENCE_RULES,
        _ => &[],
    }
}

const PROCEEDINGS_PREFIX: &str = "Proceedings of the ";

/// Everything before the first comma of a `booktitle`.
fn venue_base(booktitle: &str) -> &str {
    booktitle.split(',').next().unwrap_or(booktitle).trim()
}

fn proceedings_title(booktitle: &str) -> String {
    let base = venue_base(booktitle);
    if base.starts_with(PROCEEDINGS_PREFIX) {
        base.to_string()
    } else {
        format!("{PROCEEDINGS_PREFIX}{base}")
    }
}

fn conference_name(booktitle: &str) -> String {
    let base = venue_base(booktitle);
    base.strip_prefix(PROCEEDINGS_PREFIX).unwrap_or(base).to_string()
}

/// Split raw author names into structured creators.
///
/// Last whitespace-separated token is the family name, everything before it
/// the given name. A heuristic: name particles ("van", "de"), suffixes and
/// mononyms are not handled specially.
pub fn split_creators<S: AsRef<str>>(authors: &[S]) -> Vec<Creator> {
    authors
        .iter()
        .map(|name| {
            let mut parts: Vec<&str> = name.as_ref().split_whitespace().collect();
            let family_name = parts.pop().unwrap_or("").to_string();
            Creator {
                given_name: parts.join(" "),
                family_name,
                role: "author".to_string(),
            }
        })
        .collect()
}

/// Merge `record` into the item behind `item_id` and commit the result.
///
/// Returns the id of the updated item, which differs from `item_id` when
/// the type transition had to rebuild the record. On error nothing is
/// committed and buffered changes are discarded.
pub fn apply(
    record: &CanonicalRecord,
    store: &mut dyn ItemStore,
    item_id: ItemId,
) -> Result<ItemId, StoreError> {
    let mut current = item_id;
    match apply_steps(record, store, &mut current) {
        Ok(()) => Ok(current),
        Err(e) => {
            store.discard(current);
            Err(e)
        }
    }
}

fn apply_steps(
    record: &CanonicalRecord,
    store: &mut dyn ItemStore,
    current: &mut ItemId,
) -> Result<(), StoreError> {
    let new_type = resolve_item_type(&record.entry_type);
    *current = transition_type(store, *current, new_type)?;

    for field_rule in SCALAR_RULES.iter().chain(type_rules(new_type)) {
        apply_rule(record, store, *current, field_rule)?;
    }

    if let Some(authors) = record.authors() {
        // Full replacement, not a merge.
        store.set_creators(*current, split_creators(&authors))?;
    }

    store.save(*current)
}

fn apply_rule(
    record: &CanonicalRecord,
    store: &mut dyn ItemStore,
    item_id: ItemId,
    field_rule: &FieldRule,
) -> Result<(), StoreError> {
    let Some(value) = record.get(field_rule.source) else {
        return Ok(());
    };
    let value = match field_rule.transform {
        Some(transform) => transform(value),
        None => value.to_string(),
    };
    match store.set_field(item_id, field_rule.target, &value) {
        Err(StoreError::InvalidField { field, item_type }) => {
            tracing::debug!(%field, %item_type, "field not valid for item type, skipped");
            Ok(())
        }
        other => other,
    }
}

/// Bring the item to `new_type`.
///
/// Tries an in-place change first; if the store cannot re-type a record, a
/// replacement item is built: fields valid under both types are carried
/// over, fields invalid in the new type are dropped without error, creators
/// are carried verbatim. The old item is erased only after the replacement
/// committed.
fn transition_type(
    store: &mut dyn ItemStore,
    item_id: ItemId,
    new_type: ItemType,
) -> Result<ItemId, StoreError> {
    if store.item_type(item_id)? == new_type {
        return Ok(item_id);
    }

    match store.change_type(item_id, new_type)? {
        TypeChange::InPlace => Ok(item_id),
        TypeChange::Unsupported => {
            let new_id = store.create_item(new_type)?;
            for (field, value) in store.fields(item_id)? {
                match store.set_field(new_id, &field, &value) {
                    Err(StoreError::InvalidField { .. }) => {}
                    other => other?,
                }
            }
            let creators = store.creators(item_id)?;
            if !creators.is_empty() {
                store.set_creators(new_id, creators)?;
            }
            store.save(new_id)?;
            store.erase(item_id)?;
            Ok(new_id)
        }
    }
}
