//! Static reference library for grounding triage citations.
//!
//! A small, hardcoded set of public health excerpts (WHO, NHS, MedlinePlus).
//! `ReferenceLibrary` ranks them by keyword overlap with the symptom text.
//! No external systems are contacted; a production deployment would put a
//! vector store behind the same `Retriever` trait.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use medix_contracts::{error::MedixResult, provider::ReferenceDoc};
use medix_core::traits::Retriever;

/// Words too common to say anything about relevance.
const STOPWORDS: &[&str] = &[
    "and", "are", "but", "can", "for", "from", "had", "has", "have", "her", "his", "include",
    "may", "not", "one", "other", "over", "since", "some", "the", "there", "this", "was", "when",
    "with", "you", "your",
];

/// Shortest token that may match by prefix ("cough" ~ "coughing").
const MIN_PREFIX_LEN: usize = 4;

// ── Reference documents ───────────────────────────────────────────────────────

/// The built-in documents as `(title, url, excerpt)`.
const BUILTIN_DOCS: &[(&str, &str, &str)] = &[
    (
        "WHO: Headache Management",
        "https://who.int/news-room/fact-sheets/detail/headache-disorders",
        "Headache disorders are among the most common disorders of the nervous system. Treatment of tension-type headache include aspirin, paracetamol, and ibuprofen.",
    ),
    (
        "NHS: Fever in Adults",
        "https://www.nhs.uk/conditions/fever-in-adults/",
        "A fever is usually when your body temperature is 38C or higher. Drink plenty of fluids and look out for signs of dehydration. Paracetamol or ibuprofen can help.",
    ),
    (
        "MedlinePlus: Common Cold",
        "https://medlineplus.gov/commoncold.html",
        "There is no cure for the common cold. Symptoms include sore throat, runny nose, coughing, and sneezing. Over-the-counter medicines may help relieve symptoms.",
    ),
    (
        "NHS: Sore Throat",
        "https://www.nhs.uk/conditions/sore-throat/",
        "Sore throats are very common and usually nothing to worry about. They normally get better by themselves within a week. Gargling warm salty water and paracetamol or ibuprofen can ease the pain.",
    ),
    (
        "NHS: Diarrhoea and Vomiting",
        "https://www.nhs.uk/conditions/diarrhoea-and-vomiting/",
        "Diarrhoea and vomiting are common and usually stop within a few days. Drink lots of fluids such as water or squash to avoid dehydration, and get advice if you cannot keep fluids down.",
    ),
];

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

fn token_matches(query: &str, doc: &str) -> bool {
    if query == doc {
        return true;
    }
    let (short, long) = if query.len() <= doc.len() { (query, doc) } else { (doc, query) };
    short.len() >= MIN_PREFIX_LEN && long.starts_with(short)
}

/// A `Retriever` over a fixed in-memory document set.
#[derive(Debug, Clone)]
pub struct ReferenceLibrary {
    docs: Vec<ReferenceDoc>,
}

impl ReferenceLibrary {
    pub fn new(docs: Vec<ReferenceDoc>) -> Self {
        Self { docs }
    }

    /// The WHO / NHS / MedlinePlus excerpts shipped with this crate.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_DOCS
                .iter()
                .map(|(title, url, excerpt)| ReferenceDoc {
                    title: title.to_string(),
                    url: url.to_string(),
                    excerpt: excerpt.to_string(),
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Documents sharing at least one keyword with `query`, best first.
    ///
    /// Ties keep library order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ReferenceDoc> {
        let query_tokens = tokens(query);

        let mut scored: Vec<(usize, &ReferenceDoc)> = self
            .docs
            .iter()
            .map(|doc| {
                let doc_tokens = tokens(&format!("{} {}", doc.title, doc.excerpt));
                let score = query_tokens
                    .iter()
                    .filter(|q| doc_tokens.iter().any(|d| token_matches(q, d)))
                    .count();
                (score, doc)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(top_k).map(|(_, doc)| doc.clone()).collect()
    }
}

#[async_trait]
impl Retriever for ReferenceLibrary {
    async fn retrieve(&self, query: &str, top_k: usize) -> MedixResult<Vec<ReferenceDoc>> {
        let docs = self.search(query, top_k);
        debug!(matches = docs.len(), top_k, "reference library search");
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use medix_core::traits::Retriever;

    use super::ReferenceLibrary;

    #[test]
    fn test_builtin_library_has_sources() {
        let library = ReferenceLibrary::builtin();
        assert!(library.len() >= 3);
    }

    #[test]
    fn test_search_ranks_by_overlap() {
        let docs = ReferenceLibrary::builtin().search("runny nose, sore throat and sneezing", 5);
        assert_eq!(docs[0].title, "MedlinePlus: Common Cold");
        assert!(docs.iter().any(|d| d.title == "NHS: Sore Throat"));
    }

    #[test]
    fn test_prefix_matches_word_forms() {
        let docs = ReferenceLibrary::builtin().search("headaches", 1);
        assert_eq!(docs[0].title, "WHO: Headache Management");
    }

    #[test]
    fn test_search_respects_top_k_and_misses() {
        let library = ReferenceLibrary::builtin();
        assert_eq!(library.search("fever sore throat cold", 1).len(), 1);
        assert!(library.search("xyzzy", 5).is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_never_fails() {
        let docs = ReferenceLibrary::builtin().retrieve("", 5).await.unwrap();
        assert!(docs.is_empty());
    }
}
