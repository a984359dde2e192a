// src/selector.rs

use crate::constants::*;
use crate::error::{EngineError, EngineResult};
use crate::models::{mean, Difficulty, PerformanceProfile, Question, Quiz};
use log::{debug, info, warn};
use std::collections::HashSet;

// --- Difficulty Mix ---

/// Fractional split of a quiz across easy/medium/hard. Only constructible when valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyMix {
    easy: f64,
    medium: f64,
    hard: f64,
}

/// Per-difficulty question counts. Always sums to the requested total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyTargets {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyTargets {
    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }

    pub fn get(&self, difficulty: Difficulty) -> usize {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    /// Questions still missing per difficulty, summed, given `candidates` so far.
    pub fn shortfall(&self, candidates: &[Question]) -> usize {
        [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .map(|d| {
                let have = candidates.iter().filter(|q| q.difficulty == d).count();
                self.get(d).saturating_sub(have)
            })
            .sum()
    }
}

impl DifficultyMix {
    pub fn new(easy: f64, medium: f64, hard: f64) -> EngineResult<Self> {
        let in_range = [easy, medium, hard]
            .iter()
            .all(|f| f.is_finite() && *f >= 0.0);
        if !in_range || (easy + medium + hard - 1.0).abs() > MIX_EPSILON {
            return Err(EngineError::InvalidMix(easy, medium, hard));
        }
        Ok(DifficultyMix { easy, medium, hard })
    }

    pub fn from_array(mix: [f64; 3]) -> EngineResult<Self> {
        Self::new(mix[0], mix[1], mix[2])
    }

    pub fn fractions(&self) -> [f64; 3] {
        [self.easy, self.medium, self.hard]
    }

    /// Rounds easy and medium; hard absorbs the rounding error.
    pub fn targets(&self, total: usize) -> DifficultyTargets {
        let easy = ((total as f64 * self.easy).round() as usize).min(total);
        let medium = ((total as f64 * self.medium).round() as usize).min(total - easy);
        DifficultyTargets {
            easy,
            medium,
            hard: total - easy - medium,
        }
    }

    /// Picks a mix from the student's mean understanding of `topics`
    /// (all profile topics when `topics` is empty). No history means balanced.
    pub fn adaptive(profile: &PerformanceProfile, topics: &[String]) -> Self {
        let known: Vec<f64> = profile
            .topics
            .values()
            .filter(|t| topics.is_empty() || topics.contains(&t.topic))
            .map(|t| t.understanding)
            .collect();

        let fractions = if known.is_empty() {
            MIX_BALANCED
        } else {
            let level = mean(known.iter().copied());
            if level >= SUGGEST_HARD_AT as f64 {
                MIX_CHALLENGE
            } else if level <= SUGGEST_EASY_AT as f64 {
                MIX_REMEDIAL
            } else {
                MIX_BALANCED
            }
        };

        debug!(
            "[Mix] Student {}: adaptive mix {:?} from {} known topic(s)",
            profile.student_id,
            fractions,
            known.len()
        );
        DifficultyMix {
            easy: fractions[0],
            medium: fractions[1],
            hard: fractions[2],
        }
    }
}

// --- Selection ---

/// Sizes of the output groups, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionGroups {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
    pub overflow: usize,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub quiz: Quiz,
    pub requested: usize,
    pub targets: DifficultyTargets,
    pub groups: SelectionGroups,
    /// Repeats appended by an opt-in padding step; `select` itself never pads.
    pub padded: usize,
}

impl Selection {
    pub fn is_exhausted(&self) -> bool {
        self.quiz.questions.len() < self.requested
    }

    /// Treats a short pool as an error.
    pub fn into_complete(self) -> EngineResult<Quiz> {
        if self.is_exhausted() {
            return Err(EngineError::PoolExhausted {
                requested: self.requested,
                available: self.quiz.questions.len(),
            });
        }
        Ok(self.quiz)
    }
}

/// Builds a quiz of `total` questions from `pool`.
///
/// Each difficulty bucket is filled with its highest-confidence questions; any
/// shortfall is covered from the remaining pool regardless of difficulty. Output
/// order is easy, medium, hard, then overflow, each group stable by confidence
/// then pool position. Only the first question with a given id is eligible.
/// A pool too small for `total` is not an error: check [`Selection::is_exhausted`].
pub fn select(
    topic: &str,
    pool: &[Question],
    profile: &PerformanceProfile,
    total: usize,
    mix: [f64; 3],
) -> EngineResult<Selection> {
    let mix = DifficultyMix::from_array(mix)?;
    let targets = mix.targets(total);
    debug!(
        "[Select] Student {}: targets easy {}, medium {}, hard {} from pool of {}",
        profile.student_id,
        targets.easy,
        targets.medium,
        targets.hard,
        pool.len()
    );

    // Later copies of an id are never eligible
    let mut seen: HashSet<&str> = HashSet::new();
    let mut taken: Vec<bool> = pool.iter().map(|q| !seen.insert(q.id.as_str())).collect();
    let duplicates = taken.iter().filter(|&&t| t).count();
    if duplicates > 0 {
        warn!(
            "[Select] Ignoring {} duplicate question id(s) in pool for {}",
            duplicates, topic
        );
    }

    let mut order: Vec<usize> = Vec::with_capacity(total);
    let mut groups = SelectionGroups::default();

    for (difficulty, target) in [
        (Difficulty::Easy, targets.easy),
        (Difficulty::Medium, targets.medium),
        (Difficulty::Hard, targets.hard),
    ] {
        let bucket: Vec<usize> = ranked(pool, |q| q.difficulty == difficulty)
            .into_iter()
            .filter(|&i| !taken[i])
            .collect();
        if bucket.len() < target {
            debug!(
                "[Select] Bucket {} short: {} of {}",
                difficulty,
                bucket.len(),
                target
            );
        }

        let chosen: Vec<usize> = bucket.into_iter().take(target).collect();
        match difficulty {
            Difficulty::Easy => groups.easy = chosen.len(),
            Difficulty::Medium => groups.medium = chosen.len(),
            Difficulty::Hard => groups.hard = chosen.len(),
        }
        for i in chosen {
            taken[i] = true;
            order.push(i);
        }
    }

    if order.len() < total {
        let deficit = total - order.len();
        let overflow: Vec<usize> = ranked(pool, |_| true)
            .into_iter()
            .filter(|&i| !taken[i])
            .take(deficit)
            .collect();
        groups.overflow = overflow.len();
        order.extend(overflow);
    }

    let questions: Vec<Question> = order.into_iter().map(|i| pool[i].clone()).collect();
    if questions.len() < total {
        warn!(
            "[Select] Pool exhausted for {}: {} of {} questions",
            topic,
            questions.len(),
            total
        );
    }

    info!(
        "[Select] Student {}: {} question(s) on {} (easy {}, medium {}, hard {}, overflow {})",
        profile.student_id,
        questions.len(),
        topic,
        groups.easy,
        groups.medium,
        groups.hard,
        groups.overflow
    );

    Ok(Selection {
        quiz: Quiz::new(topic, questions),
        requested: total,
        targets,
        groups,
        padded: 0,
    })
}

/// Pool indices matching `keep`, highest confidence first. `sort_by` is stable,
/// so equal confidences stay in pool order.
fn ranked(pool: &[Question], keep: impl Fn(&Question) -> bool) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..pool.len()).filter(|&i| keep(&pool[i])).collect();
    indices.sort_by(|&a, &b| pool[b].confidence.total_cmp(&pool[a].confidence));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TopicProgress;

    fn question(id: &str, difficulty: Difficulty, confidence: f64) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}", id),
            options: vec!["A".into(), "B".into()],
            correct_answer: "A".into(),
            topic: "Arrays".into(),
            difficulty,
            confidence,
        }
    }

    fn ids(selection: &Selection) -> Vec<&str> {
        selection.quiz.questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_rejects_mix_not_summing_to_one() {
        let profile = PerformanceProfile::new("s1");
        let err = select("Arrays", &[], &profile, 5, [0.5, 0.5, 0.5]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMix(..)));
    }

    #[test]
    fn test_rejects_negative_fraction() {
        assert!(DifficultyMix::new(1.2, -0.2, 0.0).is_err());
        assert!(DifficultyMix::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_targets_absorb_rounding_into_hard() {
        let mix = DifficultyMix::new(0.3, 0.5, 0.2).unwrap();
        let t = mix.targets(10);
        assert_eq!((t.easy, t.medium, t.hard), (3, 5, 2));

        let thirds = DifficultyMix::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0).unwrap();
        let t = thirds.targets(7);
        assert_eq!((t.easy, t.medium, t.hard), (2, 2, 3));
        assert_eq!(t.total(), 7);
    }

    #[test]
    fn test_shortfall_counts_each_difficulty() {
        let targets = DifficultyTargets {
            easy: 1,
            medium: 2,
            hard: 1,
        };
        let easy_only = vec![
            question("e1", Difficulty::Easy, 0.5),
            question("e2", Difficulty::Easy, 0.5),
            question("e3", Difficulty::Easy, 0.5),
            question("e4", Difficulty::Easy, 0.5),
        ];
        assert_eq!(targets.shortfall(&easy_only), 3);
        assert_eq!(targets.shortfall(&[]), 4);

        let covered = vec![
            question("e1", Difficulty::Easy, 0.5),
            question("m1", Difficulty::Medium, 0.5),
            question("m2", Difficulty::Medium, 0.5),
            question("h1", Difficulty::Hard, 0.5),
        ];
        assert_eq!(targets.shortfall(&covered), 0);
    }

    #[test]
    fn test_targets_never_exceed_total() {
        let mix = DifficultyMix::new(0.5, 0.5, 0.0).unwrap();
        let t = mix.targets(1);
        assert_eq!((t.easy, t.medium, t.hard), (1, 0, 0));
    }

    #[test]
    fn test_highest_confidence_first_within_bucket() {
        let pool = vec![
            question("e-low", Difficulty::Easy, 0.2),
            question("e-high", Difficulty::Easy, 0.9),
            question("m", Difficulty::Medium, 0.5),
        ];
        let profile = PerformanceProfile::new("s1");
        let selection = select("Arrays", &pool, &profile, 2, [0.5, 0.5, 0.0]).unwrap();
        assert_eq!(ids(&selection), vec!["e-high", "m"]);
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let pool = vec![
            question("a", Difficulty::Easy, 0.5),
            question("b", Difficulty::Easy, 0.5),
            question("c", Difficulty::Easy, 0.5),
        ];
        let profile = PerformanceProfile::new("s1");
        let selection = select("Arrays", &pool, &profile, 2, [1.0, 0.0, 0.0]).unwrap();
        assert_eq!(ids(&selection), vec!["a", "b"]);
    }

    #[test]
    fn test_short_bucket_filled_from_overflow() {
        let pool = vec![
            question("e1", Difficulty::Easy, 0.9),
            question("e2", Difficulty::Easy, 0.4),
            question("e3", Difficulty::Easy, 0.8),
            question("h1", Difficulty::Hard, 0.7),
        ];
        let profile = PerformanceProfile::new("s1");
        // Wants 1 easy, 2 medium, 1 hard; no medium exists.
        let selection = select("Arrays", &pool, &profile, 4, [0.25, 0.5, 0.25]).unwrap();

        assert_eq!(ids(&selection), vec!["e1", "h1", "e3", "e2"]);
        assert_eq!(selection.groups.overflow, 2);
        assert!(!selection.is_exhausted());
    }

    #[test]
    fn test_exhausted_pool_returns_partial_quiz() {
        let pool = vec![
            question("e1", Difficulty::Easy, 0.9),
            question("m1", Difficulty::Medium, 0.9),
        ];
        let profile = PerformanceProfile::new("s1");
        let selection = select("Arrays", &pool, &profile, 5, [0.2, 0.4, 0.4]).unwrap();

        assert_eq!(selection.quiz.questions.len(), 2);
        assert!(selection.is_exhausted());
        match selection.into_complete() {
            Err(EngineError::PoolExhausted {
                requested,
                available,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 2);
            }
            other => panic!("expected PoolExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids_selected_once() {
        let pool = vec![
            question("e1", Difficulty::Easy, 0.5),
            question("e1", Difficulty::Easy, 0.9),
            question("m1", Difficulty::Medium, 0.4),
            question("m1", Difficulty::Hard, 0.8),
        ];
        let profile = PerformanceProfile::new("s1");
        let selection = select("Arrays", &pool, &profile, 4, [0.5, 0.25, 0.25]).unwrap();

        assert_eq!(ids(&selection), vec!["e1", "m1"]);
        assert_eq!(selection.quiz.questions[0].confidence, 0.5);
        assert!(selection.is_exhausted());
    }

    #[test]
    fn test_zero_total_yields_empty_quiz() {
        let pool = vec![question("e1", Difficulty::Easy, 0.9)];
        let profile = PerformanceProfile::new("s1");
        let selection = select("Arrays", &pool, &profile, 0, [0.3, 0.5, 0.2]).unwrap();
        assert!(selection.quiz.questions.is_empty());
        assert!(!selection.is_exhausted());
    }

    #[test]
    fn test_adaptive_mix_follows_understanding() {
        let mut profile = PerformanceProfile::new("s1");
        assert_eq!(
            DifficultyMix::adaptive(&profile, &[]).fractions(),
            MIX_BALANCED
        );

        let mut strong = TopicProgress::new("Arrays");
        strong.understanding = 90.0;
        profile.topics.insert("Arrays".into(), strong);
        let mut weak = TopicProgress::new("Graphs");
        weak.understanding = 10.0;
        profile.topics.insert("Graphs".into(), weak);

        assert_eq!(
            DifficultyMix::adaptive(&profile, &["Arrays".to_string()]).fractions(),
            MIX_CHALLENGE
        );
        assert_eq!(
            DifficultyMix::adaptive(&profile, &["Graphs".to_string()]).fractions(),
            MIX_REMEDIAL
        );
        // Mean of 90 and 10
        assert_eq!(
            DifficultyMix::adaptive(&profile, &[]).fractions(),
            MIX_BALANCED
        );
    }
}
