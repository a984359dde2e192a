// src/constants.rs

// --- Selection ---
pub const MIX_EPSILON: f64 = 1e-6;

// Adaptive mixes: [easy, medium, hard]
pub const MIX_BALANCED: [f64; 3] = [0.3, 0.5, 0.2];
pub const MIX_CHALLENGE: [f64; 3] = [0.2, 0.3, 0.5];
pub const MIX_REMEDIAL: [f64; 3] = [0.5, 0.3, 0.2];

// --- Attempt Analysis ---
pub const STRENGTH_THRESHOLD: f64 = 0.70; // Per-topic correct ratio
pub const SUGGEST_HARD_AT: u8 = 80; // Understanding level >= this
pub const SUGGEST_EASY_AT: u8 = 40; // Understanding level <= this
pub const MAX_IMPERFECT_SCORE: u8 = 99;

// --- Progress ---
pub const UNDERSTANDING_MIN: f64 = 0.0;
pub const UNDERSTANDING_MAX: f64 = 100.0;
pub const STRENGTH_DELTA: f64 = 10.0; // Tunable
pub const WEAKNESS_DELTA: f64 = -5.0; // Tunable

pub const QUIZ_HISTORY_WEIGHT: f64 = 0.3;
pub const TOPIC_UNDERSTANDING_WEIGHT: f64 = 0.7;

// --- Study Plan ---
pub const DAYS_PER_WEEK: u32 = 7;
pub const ACCURACY_LEARN_BELOW: f64 = 0.5;
pub const ACCURACY_ADVANCE_AT: f64 = 0.75;
pub const REVIEW_OFFSETS_DAYS: [u32; 3] = [2, 5, 10];

// Understanding assumed for every topic of a bootstrap profile
pub const NEUTRAL_UNDERSTANDING: f64 = 50.0;
