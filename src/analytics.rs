//! Read-only aggregates over the task store. Nothing here is persisted;
//! every call recomputes from current rows.

use serde::Serialize;

use crate::database::{Database, DatabaseError};
use crate::models::{Priority, Status};

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: Status,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriorityStatusCount {
    pub priority: Priority,
    pub status: Status,
    pub count: i64,
}

/// Task count per status, zero-filled so all three statuses always appear
pub fn status_distribution(db: &Database) -> Result<Vec<StatusCount>, DatabaseError> {
    let counts = db.status_counts()?;
    Ok(Status::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: counts
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, n)| *n)
                .unwrap_or(0),
        })
        .collect())
}

/// Task count per (priority, status) pair, zero-filled to the full 3x3 grid
pub fn priority_status_breakdown(db: &Database) -> Result<Vec<PriorityStatusCount>, DatabaseError> {
    let counts = db.priority_status_counts()?;
    let mut grid = Vec::with_capacity(9);
    for &priority in &Priority::ALL {
        for &status in &Status::ALL {
            grid.push(PriorityStatusCount {
                priority,
                status,
                count: counts
                    .iter()
                    .find(|(p, s, _)| *p == priority && *s == status)
                    .map(|(_, _, n)| *n)
                    .unwrap_or(0),
            });
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn seed(db: &Database, priority: Priority, status: Status) {
        let task = Task::new("t".to_string(), "alice".to_string(), priority);
        let id = db.insert_task(&task).unwrap();
        db.update_task_status(id, status).unwrap();
    }

    #[test]
    fn status_distribution_matches_the_store() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, Priority::High, Status::Pending);
        seed(&db, Priority::High, Status::Pending);
        seed(&db, Priority::Low, Status::Completed);

        let dist = status_distribution(&db).unwrap();
        let count_of = |status: Status| {
            dist.iter().find(|c| c.status == status).unwrap().count
        };
        assert_eq!(count_of(Status::Pending), 2);
        assert_eq!(count_of(Status::InProgress), 0);
        assert_eq!(count_of(Status::Completed), 1);

        // Cross-check against a direct scan
        let tasks = db.get_all_tasks().unwrap();
        let pending = tasks.iter().filter(|t| t.status == Status::Pending).count() as i64;
        assert_eq!(count_of(Status::Pending), pending);
    }

    #[test]
    fn breakdown_covers_the_full_grid() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, Priority::High, Status::InProgress);
        seed(&db, Priority::Medium, Status::InProgress);
        seed(&db, Priority::High, Status::InProgress);

        let grid = priority_status_breakdown(&db).unwrap();
        assert_eq!(grid.len(), 9);

        let cell = |priority: Priority, status: Status| {
            grid.iter()
                .find(|c| c.priority == priority && c.status == status)
                .unwrap()
                .count
        };
        assert_eq!(cell(Priority::High, Status::InProgress), 2);
        assert_eq!(cell(Priority::Medium, Status::InProgress), 1);
        assert_eq!(cell(Priority::Low, Status::Completed), 0);
    }

    #[test]
    fn empty_store_yields_all_zeros() {
        let db = Database::open_in_memory().unwrap();
        assert!(status_distribution(&db).unwrap().iter().all(|c| c.count == 0));
        assert!(priority_status_breakdown(&db)
            .unwrap()
            .iter()
            .all(|c| c.count == 0));
    }
}
