//! Visible-node selection.
//!
//! The displayed tree is capped at a configured number of nodes. Phrases are
//! ranked by an interest score (lower is more interesting) and the best `N`
//! are taken, then every ancestor of a taken phrase is added so the visible
//! set is always connected up to its roots.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::corpus::{Corpus, Phrase, PhraseId};

/// Distance of a phrase from the ideal "longest and most frequent" corner.
///
/// `sqrt((1 - len/max_len)^2 + (1 - ln(1+freq)/ln(1+max_freq))^2)`
///
/// A ratio with a zero denominator counts as 0.
pub fn interest_score(length: usize, frequency: u64, max_length: usize, max_frequency: u64) -> f64 {
    let length_ratio = if max_length == 0 {
        0.0
    } else {
        length as f64 / max_length as f64
    };
    let max_log = (max_frequency as f64).ln_1p();
    let frequency_ratio = if max_log == 0.0 {
        0.0
    } else {
        (frequency as f64).ln_1p() / max_log
    };
    (1.0 - length_ratio).hypot(1.0 - frequency_ratio)
}

/// Scores for every phrase, indexed by id.
///
/// Supplied scores are used as they are; missing ones are computed with
/// [`interest_score`] against the corpus maxima.
pub fn scores(corpus: &Corpus) -> Vec<f64> {
    let max_length = corpus.max_length();
    let max_frequency = corpus.max_frequency();
    corpus
        .phrases()
        .iter()
        .map(|p| {
            p.score().unwrap_or_else(|| {
                interest_score(p.length(), p.frequency(), max_length, max_frequency)
            })
        })
        .collect()
}

/// Pick at most `max_nodes` phrases by score, then close the set over
/// ancestors.
///
/// Ties in score keep id order. NaN scores rank last.
#[tracing::instrument(skip(corpus), fields(phrases = corpus.len()))]
pub fn select_visible(corpus: &Corpus, max_nodes: usize) -> BTreeSet<PhraseId> {
    let scores = scores(corpus);
    let mut ranked: Vec<PhraseId> = corpus.phrases().iter().map(Phrase::id).collect();
    ranked.sort_by(|a, b| compare_scores(scores[a.index()], scores[b.index()]));
    ranked.truncate(max_nodes);

    let selected = ranked.len();
    let mut visible: BTreeSet<PhraseId> = ranked.iter().copied().collect();
    for id in ranked {
        let mut parent = corpus.get(id).and_then(Phrase::parent_id);
        while let Some(p) = parent {
            if !visible.insert(p) {
                break;
            }
            parent = corpus.get(p).and_then(Phrase::parent_id);
        }
    }

    tracing::debug!(
        selected,
        ancestors_added = visible.len() - selected,
        "visible set chosen"
    );
    visible
}

fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.total_cmp(&b),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{DuplicatePolicy, RawPhrase};
    use crate::index::TextIndex;
    use crate::link::ParentLinker;

    fn linked(rows: Vec<RawPhrase>) -> Corpus {
        let mut corpus = Corpus::build(rows, Vec::new(), DuplicatePolicy::KeepLast);
        let index = TextIndex::build(&corpus);
        ParentLinker::default().link(&mut corpus, &index);
        corpus
    }

    #[test]
    fn longest_most_frequent_scores_zero() {
        assert_eq!(interest_score(5, 100, 5, 100), 0.0);
    }

    #[test]
    fn shortest_rarest_scores_worst() {
        let worst = interest_score(0, 0, 5, 100);
        assert!((worst - 2f64.sqrt()).abs() < 1e-12);
        assert!(interest_score(3, 10, 5, 100) < worst);
    }

    #[test]
    fn zero_maxima_do_not_produce_nan() {
        let s = interest_score(0, 0, 0, 0);
        assert!(s.is_finite());
        assert!((s - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn supplied_score_is_used_verbatim() {
        let mut row = RawPhrase::new("a b", 2, 1);
        row.score = Some(0.42);
        let corpus = linked(vec![
            row,
            RawPhrase::new("c d", 2, 1),
            RawPhrase::new("e f g", 3, 5),
        ]);
        let s = scores(&corpus);
        assert_eq!(s[0], 0.42);
        assert_eq!(s[1], interest_score(2, 1, 3, 5));
        assert!(s[1] > 0.0);
        assert_eq!(s[2], interest_score(3, 5, 3, 5));
    }

    #[test]
    fn picks_lowest_scores() {
        let corpus = linked(vec![
            RawPhrase::new("red car", 2, 1),
            RawPhrase::new("blue car", 2, 50),
            RawPhrase::new("green car", 2, 10),
        ]);
        let visible = select_visible(&corpus, 1);
        let texts: Vec<_> = visible
            .iter()
            .map(|id| corpus.get(*id).unwrap().text())
            .collect();
        assert_eq!(texts, vec!["blue car"]);
    }

    #[test]
    fn single_pick_from_deep_chain_includes_all_ancestors() {
        let corpus = linked(vec![
            RawPhrase::new("a b", 2, 1),
            RawPhrase::new("a b c", 3, 1),
            RawPhrase::new("a b c d", 4, 1),
            RawPhrase::new("a b c d e", 5, 1),
            RawPhrase::new("a b c d e f", 6, 1),
            RawPhrase::new("a b c d e f g", 7, 1),
        ]);
        assert_eq!(corpus.phrases()[5].level(), 5);
        let visible = select_visible(&corpus, 1);
        assert_eq!(visible.len(), 6);
        assert!(visible.contains(&PhraseId(5)));
        assert!(visible.contains(&PhraseId(0)));
    }

    #[test]
    fn ancestor_closure_for_every_cap() {
        let corpus = linked(vec![
            RawPhrase::new("of the", 2, 90),
            RawPhrase::new("one of the", 3, 40),
            RawPhrase::new("of the year", 3, 30),
            RawPhrase::new("one of the best", 4, 20),
            RawPhrase::new("one of the best ever", 5, 2),
            RawPhrase::new("red car", 2, 5),
        ]);
        for cap in 0..=corpus.len() {
            let visible = select_visible(&corpus, cap);
            assert!(visible.len() >= cap.min(corpus.len()));
            for id in &visible {
                for ancestor in corpus.ancestors(*id) {
                    assert!(visible.contains(&ancestor.id()), "cap {cap}");
                }
            }
        }
    }

    #[test]
    fn zero_cap_selects_nothing() {
        let corpus = linked(vec![RawPhrase::new("a b", 2, 1)]);
        assert!(select_visible(&corpus, 0).is_empty());
    }

    #[test]
    fn nan_scores_rank_last() {
        let mut nan = RawPhrase::new("x y", 2, 100);
        nan.score = Some(f64::NAN);
        let mut good = RawPhrase::new("p q", 2, 1);
        good.score = Some(0.9);
        let corpus = linked(vec![nan, good]);
        let visible = select_visible(&corpus, 1);
        assert_eq!(visible.into_iter().collect::<Vec<_>>(), vec![PhraseId(1)]);
    }
}
