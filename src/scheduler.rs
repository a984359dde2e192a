// src/scheduler.rs

use crate::constants::*;
use crate::error::{EngineError, EngineResult};
use crate::models::{PerformanceProfile, Priority, StudyPlanItem, TaskKind, TopicProgress};
use log::{debug, info};

/// Builds a day-indexed study plan, weakest topics first, with review echoes
/// at +2, +5 and +10 days.
///
/// Days are numbered sequentially from 1 (one study block per day), not by
/// calendar. Anything past `horizon_weeks * 7` is dropped. A profile without
/// topics produces an empty plan.
pub fn schedule(
    profile: &PerformanceProfile,
    hours_per_week: u32,
    block_minutes: u32,
    horizon_weeks: u32,
) -> EngineResult<Vec<StudyPlanItem>> {
    if block_minutes == 0 {
        return Err(EngineError::InvalidBudget);
    }
    if profile.topics.is_empty() {
        info!(
            "[Plan] Student {} has no topics yet; empty plan",
            profile.student_id
        );
        return Ok(Vec::new());
    }

    let blocks_per_week = (hours_per_week as u64 * 60 / block_minutes as u64).max(1);
    let last_day = horizon_weeks as u64 * DAYS_PER_WEEK as u64;

    let mut ranked: Vec<&TopicProgress> = profile.topics.values().collect();
    ranked.sort_by(|a, b| {
        a.accuracy()
            .total_cmp(&b.accuracy())
            .then_with(|| a.topic.cmp(&b.topic))
    });
    debug!(
        "[Plan] {} blocks/week over {} week(s); ranking {:?}",
        blocks_per_week,
        horizon_weeks,
        ranked.iter().map(|t| t.topic.as_str()).collect::<Vec<_>>()
    );

    let mut plan = Vec::new();
    for slot in 0..horizon_weeks as u64 * blocks_per_week {
        let day = slot + 1;
        if day > last_day {
            break;
        }
        let topic = ranked[(slot % ranked.len() as u64) as usize];
        let day = day as u32;
        let (task, priority) = classify(topic.accuracy());

        plan.push(StudyPlanItem {
            day,
            topic: topic.topic.clone(),
            task,
            description: describe(task, &topic.topic, day),
            priority,
        });

        for offset in REVIEW_OFFSETS_DAYS {
            let review_day = day + offset;
            if review_day as u64 <= last_day {
                plan.push(StudyPlanItem {
                    day: review_day,
                    topic: topic.topic.clone(),
                    task: TaskKind::Review,
                    description: describe(TaskKind::Review, &topic.topic, day),
                    priority: Priority::Low,
                });
            }
        }
    }

    plan.sort_by_key(|item| item.day);
    info!(
        "[Plan] Student {}: {} item(s) over {} day(s)",
        profile.student_id,
        plan.len(),
        last_day
    );
    Ok(plan)
}

/// Task and priority for a topic at accuracy `a` in [0, 1].
pub fn classify(a: f64) -> (TaskKind, Priority) {
    if a < ACCURACY_LEARN_BELOW {
        (TaskKind::Learn, Priority::High)
    } else if a < ACCURACY_ADVANCE_AT {
        (TaskKind::Practice, Priority::Medium)
    } else {
        (TaskKind::Advance, Priority::Low)
    }
}

fn describe(task: TaskKind, topic: &str, day: u32) -> String {
    match task {
        TaskKind::Learn => format!("Learn the fundamentals of {}", topic),
        TaskKind::Practice => format!("Practice {} problems", topic),
        TaskKind::Advance => format!("Tackle advanced {} problems", topic),
        TaskKind::Review => format!("Review {} (studied on day {})", topic, day),
    }
}

/// Explicit starting point for students without history: every topic at
/// neutral understanding. Never substituted automatically by [`schedule`].
pub fn neutral_profile(student_id: &str, topics: &[String]) -> PerformanceProfile {
    let mut profile = PerformanceProfile::new(student_id);
    for topic in topics {
        profile.topic_mut(topic).understanding = NEUTRAL_UNDERSTANDING;
    }
    profile
}
