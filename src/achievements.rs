use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::classifier::PostureStatus;

/// Distinct tracked days needed for the consistency badge
pub const WEEK_WARRIOR_DAYS: usize = 7;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AchievementId {
    FirstSession,
    #[serde(rename = "good-streak-5")]
    #[strum(serialize = "good-streak-5")]
    GoodStreak5,
    #[serde(rename = "good-streak-15")]
    #[strum(serialize = "good-streak-15")]
    GoodStreak15,
    #[serde(rename = "good-streak-30")]
    #[strum(serialize = "good-streak-30")]
    GoodStreak30,
    Calibrated,
    WeekWarrior,
}

impl AchievementId {
    pub const ALL: [AchievementId; 6] = [
        AchievementId::FirstSession,
        AchievementId::GoodStreak5,
        AchievementId::GoodStreak15,
        AchievementId::GoodStreak30,
        AchievementId::Calibrated,
        AchievementId::WeekWarrior,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AchievementId::FirstSession => "First Steps",
            AchievementId::GoodStreak5 => "Steady Start",
            AchievementId::GoodStreak15 => "Getting Strong",
            AchievementId::GoodStreak30 => "Posture Master",
            AchievementId::Calibrated => "Personalized",
            AchievementId::WeekWarrior => "Consistency King",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementId::FirstSession => "Complete your first monitoring session",
            AchievementId::GoodStreak5 => "Maintain good posture for 5 minutes",
            AchievementId::GoodStreak15 => "Maintain good posture for 15 minutes",
            AchievementId::GoodStreak30 => "Maintain good posture for 30 minutes",
            AchievementId::Calibrated => "Complete your calibration",
            AchievementId::WeekWarrior => "Use Spine Guard for 7 days",
        }
    }

    /// Unbroken Good minutes required, for the streak badges
    fn streak_minutes(&self) -> Option<i64> {
        match self {
            AchievementId::GoodStreak5 => Some(5),
            AchievementId::GoodStreak15 => Some(15),
            AchievementId::GoodStreak30 => Some(30),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Local>>,
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct AchievementTracker {
    achievements: Vec<Achievement>,
    good_streak_start: Option<DateTime<Local>>,
}

impl Default for AchievementTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self {
            achievements: AchievementId::ALL
                .iter()
                .map(|&id| Achievement {
                    id,
                    unlocked_at: None,
                })
                .collect(),
            good_streak_start: None,
        }
    }

    /// Catalogue with previously unlocked entries restored
    pub fn with_unlocked(stored: &[Achievement]) -> Self {
        let mut tracker = Self::new();
        for s in stored {
            if let Some(a) = tracker.achievements.iter_mut().find(|a| a.id == s.id) {
                a.unlocked_at = s.unlocked_at;
            }
        }
        tracker
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.is_unlocked()).count()
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.achievements
            .iter()
            .any(|a| a.id == id && a.is_unlocked())
    }

    /// Returns true only the first time
    pub fn unlock(&mut self, id: AchievementId, now: DateTime<Local>) -> bool {
        match self.achievements.iter_mut().find(|a| a.id == id) {
            Some(a) if !a.is_unlocked() => {
                a.unlocked_at = Some(now);
                tracing::info!("achievement unlocked: {}", id);
                true
            }
            _ => false,
        }
    }

    pub fn reset_streak(&mut self) {
        self.good_streak_start = None;
    }

    /// Feed one classified reading; returns newly unlocked achievements
    pub fn on_reading(&mut self, status: PostureStatus, now: DateTime<Local>) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();

        if self.unlock(AchievementId::FirstSession, now) {
            unlocked.push(AchievementId::FirstSession);
        }

        if status != PostureStatus::Good {
            self.good_streak_start = None;
            return unlocked;
        }

        let Some(start) = self.good_streak_start else {
            self.good_streak_start = Some(now);
            return unlocked;
        };

        let streak_minutes = (now - start).num_minutes();
        for id in AchievementId::ALL {
            if let Some(required) = id.streak_minutes() {
                if streak_minutes >= required && self.unlock(id, now) {
                    unlocked.push(id);
                }
            }
        }
        unlocked
    }
}

pub trait AchievementStore {
    fn load(&self) -> Vec<Achievement>;
    fn save(&self, achievements: &[Achievement]) -> crate::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileAchievementStore {
    path: PathBuf,
}

impl FileAchievementStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::achievements_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl AchievementStore for FileAchievementStore {
    fn load(&self) -> Vec<Achievement> {
        let Ok(bytes) = fs::read(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_slice(&bytes) {
            Ok(achievements) => achievements,
            Err(e) => {
                tracing::warn!("ignoring unreadable achievements {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    fn save(&self, achievements: &[Achievement]) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(achievements)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    #[test]
    fn ids_use_stable_names() {
        assert_eq!(AchievementId::FirstSession.to_string(), "first-session");
        assert_eq!(AchievementId::GoodStreak15.to_string(), "good-streak-15");
        assert_eq!(
            serde_json::to_string(&AchievementId::WeekWarrior).unwrap(),
            "\"week-warrior\""
        );
        assert_eq!(
            serde_json::to_string(&AchievementId::GoodStreak30).unwrap(),
            "\"good-streak-30\""
        );
    }

    #[test]
    fn first_reading_unlocks_first_session_once() {
        let mut tracker = AchievementTracker::new();
        let now = Local::now();
        assert_eq!(
            tracker.on_reading(PostureStatus::Poor, now),
            vec![AchievementId::FirstSession]
        );
        assert!(tracker.on_reading(PostureStatus::Poor, now).is_empty());
        assert_eq!(tracker.unlocked_count(), 1);
    }

    #[test]
    fn good_streak_unlocks_by_duration() {
        let mut tracker = AchievementTracker::new();
        let start = Local::now();
        tracker.on_reading(PostureStatus::Good, start);

        let at_4 = tracker.on_reading(PostureStatus::Good, start + Duration::minutes(4));
        assert!(at_4.is_empty());

        let at_5 = tracker.on_reading(PostureStatus::Good, start + Duration::minutes(5));
        assert_eq!(at_5, vec![AchievementId::GoodStreak5]);

        let at_31 = tracker.on_reading(PostureStatus::Good, start + Duration::minutes(31));
        assert_eq!(
            at_31,
            vec![AchievementId::GoodStreak15, AchievementId::GoodStreak30]
        );
    }

    #[test]
    fn non_good_reading_breaks_streak() {
        let mut tracker = AchievementTracker::new();
        let start = Local::now();
        tracker.on_reading(PostureStatus::Good, start);
        tracker.on_reading(PostureStatus::Moderate, start + Duration::minutes(3));
        tracker.on_reading(PostureStatus::Good, start + Duration::minutes(4));
        let unlocked = tracker.on_reading(PostureStatus::Good, start + Duration::minutes(8));
        assert!(unlocked.is_empty());
        assert!(!tracker.is_unlocked(AchievementId::GoodStreak5));
    }

    #[test]
    fn store_roundtrip_restores_unlocks() {
        let dir = tempdir().unwrap();
        let store = FileAchievementStore::with_path(dir.path().join("achievements.json"));
        assert!(store.load().is_empty());

        let mut tracker = AchievementTracker::new();
        tracker.unlock(AchievementId::Calibrated, Local::now());
        store.save(tracker.achievements()).unwrap();

        let restored = AchievementTracker::with_unlocked(&store.load());
        assert!(restored.is_unlocked(AchievementId::Calibrated));
        assert!(!restored.is_unlocked(AchievementId::FirstSession));
        assert_eq!(restored.achievements().len(), AchievementId::ALL.len());
    }

    #[test]
    fn corrupt_store_loads_empty_and_is_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("achievements.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileAchievementStore::with_path(&path);
        assert!(store.load().is_empty());

        let mut tracker = AchievementTracker::new();
        tracker.unlock(AchievementId::FirstSession, Local::now());
        store.save(tracker.achievements()).unwrap();
        let restored = AchievementTracker::with_unlocked(&store.load());
        assert!(restored.is_unlocked(AchievementId::FirstSession));
    }
}
