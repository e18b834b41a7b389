//! XP and leveling accumulator.
//!
//! `xp` only grows, and only through [`award`]: the fixed enrollment bonus and
//! per-lesson rewards. `dailyXP` accumulates the same increments and resets on
//! the first award of each new UTC calendar day. The streak counts consecutive
//! UTC days with at least one award.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::Tier;
use crate::profile::UserProfile;
use crate::types::{DbId, Timestamp};

/// Granted once per successful enrollment.
pub const ENROLLMENT_BONUS_XP: i64 = 50;

/// Default width of one level for [`LinearLevelRule`].
pub const DEFAULT_XP_PER_LEVEL: i64 = 1000;

/// Maps total xp to a level. Thresholds are owned by the caller.
pub trait LevelRule: Send + Sync {
    fn level_for(&self, xp: i64) -> i64;
}

/// `level = xp / xp_per_level + 1`.
#[derive(Debug, Clone, Copy)]
pub struct LinearLevelRule {
    pub xp_per_level: i64,
}

impl Default for LinearLevelRule {
    fn default() -> Self {
        Self {
            xp_per_level: DEFAULT_XP_PER_LEVEL,
        }
    }
}

impl LevelRule for LinearLevelRule {
    fn level_for(&self, xp: i64) -> i64 {
        xp.max(0) / self.xp_per_level.max(1) + 1
    }
}

/// What a single award changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpAward {
    pub amount: i64,
    pub total_xp: i64,
    pub level: i64,
    pub leveled_up: bool,
}

/// Add `amount` to the running totals. Negative amounts are ignored and the
/// totals saturate at `i64::MAX`.
pub fn award(
    profile: &mut UserProfile,
    amount: i64,
    now: Timestamp,
    rule: &dyn LevelRule,
) -> XpAward {
    let amount = amount.max(0);
    roll_day(profile, now.date_naive());

    let before = profile.level;
    profile.xp = profile.xp.saturating_add(amount);
    profile.daily_xp = profile.daily_xp.saturating_add(amount);
    profile.level = rule.level_for(profile.xp);

    XpAward {
        amount,
        total_xp: profile.xp,
        level: profile.level,
        leveled_up: profile.level > before,
    }
}

/// Advance the daily counter and streak to `today`.
fn roll_day(profile: &mut UserProfile, today: NaiveDate) {
    match profile.last_active_on {
        Some(day) if day == today => {}
        Some(day) if day.succ_opt() == Some(today) => {
            profile.current_streak = profile.current_streak.saturating_add(1);
            profile.daily_xp = 0;
        }
        _ => {
            profile.current_streak = 1;
            profile.daily_xp = 0;
        }
    }
    profile.last_active_on = Some(today);
}

/// `dailyXP` as of `today`; a counter from an earlier day reads as zero.
pub fn effective_daily_xp(profile: &UserProfile, today: NaiveDate) -> i64 {
    match profile.last_active_on {
        Some(day) if day == today => profile.daily_xp,
        _ => 0,
    }
}

/// Streak as of `today`; broken once a full day passes without an award.
pub fn effective_streak(profile: &UserProfile, today: NaiveDate) -> i64 {
    match profile.last_active_on {
        Some(day) if day == today || day.succ_opt() == Some(today) => profile.current_streak,
        _ => 0,
    }
}

/// Read-only view of a profile's totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: DbId,
    pub xp: i64,
    pub level: i64,
    pub current_streak: i64,
    #[serde(rename = "dailyXP")]
    pub daily_xp: i64,
    pub tier: Tier,
    pub enrolled_courses: usize,
    pub completed_courses: usize,
}

/// The level is derived from xp with `rule`; the stored level may predate a
/// change of thresholds.
pub fn summarize(profile: &UserProfile, now: Timestamp, rule: &dyn LevelRule) -> ProfileSummary {
    let today = now.date_naive();
    ProfileSummary {
        id: profile.id,
        xp: profile.xp,
        level: rule.level_for(profile.xp),
        current_streak: effective_streak(profile, today),
        daily_xp: effective_daily_xp(profile, today),
        tier: profile.subscription_tier,
        enrolled_courses: profile.enrollments.len(),
        completed_courses: profile.completed_course_ids().len(),
    }
}
