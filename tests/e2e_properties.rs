//! Property tests over randomly generated bibliographies.

use std::collections::{HashMap, HashSet};

use bibxref::xref::relatedness::related;
use bibxref::{CrossRefEngine, EngineConfig, MemoryStore, Record, RecordId, RecordStore, TxMode};
use proptest::prelude::*;

const WORDS: &[&str] = &["ACM", "SIGCOMM", "VLDB", "Proc", "Conf", "Data", "Web", "2020", "Intl"];
const YEARS: &[&str] = &["2019", "2020", "2021"];
const PUBLISHERS: &[&str] = &["ACM", "IEEE"];
const MANAGED: [&str; 7] = ["address", "booktitle", "isbn", "location", "month", "publisher", "year"];

fn venue() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..5).prop_map(|w| w.join(" "))
}

/// (booktitle, year, publisher, is_article)
fn row() -> impl Strategy<Value = (Option<String>, Option<&'static str>, Option<&'static str>, bool)> {
    (
        prop::option::of(venue()),
        prop::option::of(prop::sample::select(YEARS)),
        prop::option::of(prop::sample::select(PUBLISHERS)),
        prop::bool::weighted(0.2),
    )
}

fn corpus() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(row(), 0..14).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (booktitle, year, publisher, is_article))| {
                let mut rec = Record::new(format!("r{i}"), if is_article { "article" } else { "inproceedings" });
                if let Some(b) = booktitle {
                    rec.fields.set("booktitle", b);
                }
                if let Some(y) = year {
                    rec.fields.set("year", y);
                }
                if let Some(p) = publisher {
                    rec.fields.set("publisher", p);
                }
                rec
            })
            .collect()
    })
}

fn all(store: &MemoryStore) -> HashMap<RecordId, Record> {
    let tx = store.begin_tx(TxMode::ReadOnly).unwrap();
    store.all_records(&tx).unwrap().into_iter().map(|r| (r.id.clone(), r)).collect()
}

proptest! {
    #[test]
    fn threshold_is_half_the_words_rounded_down(words in prop::collection::vec("[a-z]{1,6}", 1..8)) {
        let reference = words.join(" ");
        prop_assert!(related(&reference, &reference).unwrap());
        let expected = words.len() < 2;
        prop_assert_eq!(related(&reference, "").unwrap(), expected);
    }

    #[test]
    fn every_record_in_at_most_one_aggregate(records in corpus(), seed in any::<u64>()) {
        let mut engine = CrossRefEngine::open_memory(records, EngineConfig::default().with_seed(seed)).unwrap();
        let report = engine.run().unwrap();

        let mut seen = HashSet::new();
        for agg in &report.aggregates {
            prop_assert!(agg.members.len() >= 2);
            for member in &agg.members {
                prop_assert!(seen.insert(member.clone()), "{} claimed twice", member);
            }
        }
    }

    #[test]
    fn members_linked_and_venue_fields_conserved(records in corpus(), seed in any::<u64>()) {
        let before: HashMap<RecordId, Record> = records.iter().map(|r| (r.id.clone(), r.clone())).collect();
        let mut engine = CrossRefEngine::open_memory(records, EngineConfig::default().with_seed(seed)).unwrap();
        let report = engine.run().unwrap();
        let after = all(engine.store());

        prop_assert_eq!(after.len(), before.len() + report.aggregates_created());

        let mut linked = HashSet::new();
        for summary in &report.aggregates {
            let key = summary.citation_key.as_deref().unwrap();
            let agg = &after[&summary.id];
            for name in MANAGED {
                let donors: Vec<&str> = summary.members.iter().filter_map(|m| before[m].get(name)).collect();
                match agg.get(name) {
                    Some(v) => prop_assert!(donors.contains(&v)),
                    None => prop_assert!(donors.is_empty()),
                }
            }
            for member in &summary.members {
                let rec = &after[member];
                prop_assert_eq!(rec.get("crossref"), Some(key));
                for name in MANAGED {
                    prop_assert!(!rec.has(name));
                }
                linked.insert(member.clone());
            }
        }

        // everything outside the aggregates is exactly as it was
        for (id, rec) in &before {
            if !linked.contains(id) {
                prop_assert_eq!(&after[id], rec);
            }
        }
    }
}
