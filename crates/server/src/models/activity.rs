//! Activity log types.

use chrono::{DateTime, Utc};

use vitrine_core::{ActivityAction, ActivityEntity, ActivityLogId, ActivityStatus};

/// A recorded dashboard mutation.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: ActivityLogId,
    pub action: ActivityAction,
    pub entity: ActivityEntity,
    pub details: String,
    pub status: ActivityStatus,
    pub error: Option<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// An activity row about to be appended.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub action: ActivityAction,
    pub entity: ActivityEntity,
    pub details: String,
    pub status: ActivityStatus,
    pub error: Option<String>,
    pub author: String,
}

/// One page of the activity log, newest first.
#[derive(Debug, Clone)]
pub struct ActivityPage {
    pub entries: Vec<ActivityEntry>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    /// Total number of rows in the log.
    pub total: i64,
}

impl ActivityPage {
    /// Number of pages, at least 1.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let per_page = i64::from(self.per_page.max(1));
        let pages = (self.total + per_page - 1) / per_page;
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u32, total: i64) -> ActivityPage {
        ActivityPage {
            entries: Vec::new(),
            page,
            per_page: 20,
            total,
        }
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(page(1, 0).total_pages(), 1);
        assert_eq!(page(1, 20).total_pages(), 1);
        assert_eq!(page(1, 21).total_pages(), 2);
        assert_eq!(page(1, 45).total_pages(), 3);
    }

    #[test]
    fn test_navigation() {
        assert!(!page(1, 45).has_previous());
        assert!(page(1, 45).has_next());
        assert!(page(3, 45).has_previous());
        assert!(!page(3, 45).has_next());
    }
}
