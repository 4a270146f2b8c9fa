use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use fieldforce_core::{AppError, AppResult};
use fieldforce_domain::{
    AssignmentChoice, BulkAssignmentResult, CellKey, CommittedAssignment, DateWindow,
    NewAssignment,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{
    AssignmentGrid, CHOICE_DISPLAY_LIMIT, CellView, CommitOutcome, GridConfig, GridRow,
};
use crate::dashboard_ports::AssignmentGateway;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap_or_default()
}

fn choice(id: &str, name: &str) -> AssignmentChoice {
    AssignmentChoice {
        id: id.to_owned(),
        name: name.to_owned(),
        secondary: Some("Pune".to_owned()),
        category: None,
    }
}

#[derive(Default)]
struct FakeAssignmentGateway {
    committed: Mutex<Vec<CommittedAssignment>>,
    choice_fetches: Mutex<Vec<String>>,
    bulk_requests: Mutex<Vec<Vec<NewAssignment>>>,
    deleted: Mutex<Vec<String>>,
    reject_dates: Vec<NaiveDate>,
    fail_delete: bool,
    choice_count: usize,
}

#[async_trait]
impl AssignmentGateway for FakeAssignmentGateway {
    async fn list_choices_for_row(&self, employee_id: &str) -> AppResult<Vec<AssignmentChoice>> {
        self.choice_fetches.lock().await.push(employee_id.to_owned());
        let count = self.choice_count.max(3);
        Ok((0..count)
            .map(|index| choice(&format!("{employee_id}-s{index}"), &format!("Store {index}")))
            .collect())
    }

    async fn list_committed(
        &self,
        window: DateWindow,
        employee_ids: &[String],
    ) -> AppResult<Vec<CommittedAssignment>> {
        Ok(self
            .committed
            .lock()
            .await
            .iter()
            .filter(|visit| {
                window.contains(visit.date) && employee_ids.contains(&visit.employee_id)
            })
            .cloned()
            .collect())
    }

    async fn bulk_create(
        &self,
        assignments: Vec<NewAssignment>,
    ) -> AppResult<BulkAssignmentResult> {
        self.bulk_requests.lock().await.push(assignments.clone());

        let mut committed = self.committed.lock().await;
        let mut created = 0;
        let mut failed = 0;
        for assignment in assignments {
            if self.reject_dates.contains(&assignment.date) {
                failed += 1;
                continue;
            }

            created += 1;
            committed.push(CommittedAssignment {
                visit_id: format!("v-{}-{}", assignment.employee_id, assignment.date),
                employee_id: assignment.employee_id,
                date: assignment.date,
                location: choice(&assignment.location_id, "Store"),
            });
        }

        Ok(BulkAssignmentResult { created, failed })
    }

    async fn delete_assignment(&self, visit_id: &str) -> AppResult<()> {
        if self.fail_delete {
            return Err(AppError::http(500, "delete failed"));
        }

        self.deleted.lock().await.push(visit_id.to_owned());
        self.committed
            .lock()
            .await
            .retain(|visit| visit.visit_id != visit_id);
        Ok(())
    }
}

fn grid(gateway: Arc<FakeAssignmentGateway>) -> AssignmentGrid {
    let window = DateWindow::new(date(2), 7).unwrap_or_else(|_| unreachable!());
    let mut grid = AssignmentGrid::new(gateway, window, GridConfig::default());
    grid.set_rows(vec![
        GridRow {
            employee_id: "e1".to_owned(),
            label: "Anita Rao (FO-1)".to_owned(),
        },
        GridRow {
            employee_id: "e2".to_owned(),
            label: "Ravi Kumar (FO-2)".to_owned(),
        },
    ]);
    grid
}

async fn assign_first_choice(grid: &mut AssignmentGrid, cell: CellKey) {
    let opened = grid.open_cell(cell).await;
    assert!(matches!(opened, Ok(Some(_))));
    let choice_id = grid.search_choices("").visible[0].id.clone();
    assert!(grid.assign(&choice_id).is_ok());
}

#[tokio::test]
async fn partial_commit_keeps_unconfirmed_entries_pending() {
    let gateway = Arc::new(FakeAssignmentGateway {
        reject_dates: vec![date(5), date(6)],
        ..FakeAssignmentGateway::default()
    });
    let mut grid = grid(gateway.clone());

    for day in 2..=6 {
        assign_first_choice(&mut grid, CellKey::new("e1", date(day))).await;
    }
    assert_eq!(grid.pending_count(), 5);

    let outcome = grid.commit().await;
    assert!(outcome.is_ok());
    let outcome = outcome.unwrap_or_else(|_| unreachable!());
    assert_eq!(
        outcome,
        CommitOutcome::Partial {
            created: 3,
            failed: 2
        }
    );
    let message = outcome.message();
    assert!(message.contains('3'));
    assert!(message.contains('2'));

    // The refetch confirmed three visits; the other two stay pending.
    assert_eq!(gateway.bulk_requests.lock().await.len(), 1);
    let pending: Vec<NaiveDate> = grid.pending().map(|(cell, _)| cell.date).collect();
    assert_eq!(pending, vec![date(5), date(6)]);
    assert!(matches!(
        grid.cell(&CellKey::new("e1", date(2))),
        CellView::Committed(_)
    ));
    assert!(!grid.needs_reverification());
}

#[tokio::test]
async fn full_commit_clears_overlay() {
    let gateway = Arc::new(FakeAssignmentGateway::default());
    let mut grid = grid(gateway);

    assign_first_choice(&mut grid, CellKey::new("e2", date(3))).await;
    let outcome = grid.commit().await;

    assert_eq!(outcome, Ok(CommitOutcome::Completed { created: 1 }));
    assert_eq!(grid.pending_count(), 0);
}

#[tokio::test]
async fn commit_without_pending_entries_is_rejected() {
    let mut grid = grid(Arc::new(FakeAssignmentGateway::default()));
    assert!(matches!(grid.commit().await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn reopening_a_cell_refetches_choices_without_duplicates() {
    let gateway = Arc::new(FakeAssignmentGateway::default());
    let mut grid = grid(gateway.clone());
    let cell = CellKey::new("e1", date(4));

    let _ = grid.open_cell(cell.clone()).await;
    grid.close_cell();
    let _ = grid.open_cell(cell).await;

    assert_eq!(gateway.choice_fetches.lock().await.len(), 2);
    assert_eq!(grid.search_choices("").total_matches, 3);
}

#[tokio::test]
async fn blocked_and_committed_cells_do_not_open() {
    let gateway = Arc::new(FakeAssignmentGateway::default());
    gateway.committed.lock().await.push(CommittedAssignment {
        visit_id: "v1".to_owned(),
        employee_id: "e1".to_owned(),
        date: date(3),
        location: choice("s9", "Corner Shop"),
    });
    let mut grid = grid(gateway.clone());
    assert!(grid.refresh().await.is_ok());

    // 2026-03-08 is a Sunday.
    assert_eq!(grid.cell(&CellKey::new("e1", date(8))), CellView::Blocked);
    assert!(matches!(
        grid.open_cell(CellKey::new("e1", date(8))).await,
        Ok(None)
    ));
    assert!(matches!(
        grid.open_cell(CellKey::new("e1", date(3))).await,
        Ok(None)
    ));
    assert!(gateway.choice_fetches.lock().await.is_empty());
}

#[tokio::test]
async fn stale_choice_response_is_ignored() {
    let mut grid = grid(Arc::new(FakeAssignmentGateway::default()));

    let first = grid
        .begin_open(CellKey::new("e1", date(2)))
        .unwrap_or_else(|| unreachable!());
    let second = grid
        .begin_open(CellKey::new("e2", date(2)))
        .unwrap_or_else(|| unreachable!());

    assert_eq!(
        grid.finish_open(first.generation, Ok(vec![choice("late", "Late")])),
        Ok(false)
    );
    assert_eq!(
        grid.finish_open(second.generation, Ok(vec![choice("fresh", "Fresh")])),
        Ok(true)
    );
    let open = grid.open().unwrap_or_else(|| unreachable!());
    assert_eq!(open.cell.row, "e2");
    assert_eq!(grid.search_choices("").visible[0].id, "fresh");
}

#[tokio::test]
async fn choice_search_caps_visible_matches() {
    let gateway = Arc::new(FakeAssignmentGateway {
        choice_count: 120,
        ..FakeAssignmentGateway::default()
    });
    let mut grid = grid(gateway);
    let _ = grid.open_cell(CellKey::new("e1", date(2))).await;

    let matches = grid.search_choices("STORE");
    assert_eq!(matches.visible.len(), CHOICE_DISPLAY_LIMIT);
    assert_eq!(matches.total_matches, 120);

    let matches = grid.search_choices("store 11");
    assert_eq!(matches.total_matches, 11);
}

#[tokio::test]
async fn failed_removal_keeps_committed_visit() {
    let gateway = Arc::new(FakeAssignmentGateway {
        fail_delete: true,
        ..FakeAssignmentGateway::default()
    });
    gateway.committed.lock().await.push(CommittedAssignment {
        visit_id: "v7".to_owned(),
        employee_id: "e2".to_owned(),
        date: date(4),
        location: choice("s1", "Green Mart"),
    });
    let mut grid = grid(gateway);
    let _ = grid.refresh().await;
    let cell = CellKey::new("e2", date(4));

    assert!(grid.remove_committed(&cell).await.is_err());
    assert!(matches!(grid.cell(&cell), CellView::Committed(_)));
}

#[tokio::test]
async fn removal_is_sent_immediately() {
    let gateway = Arc::new(FakeAssignmentGateway::default());
    gateway.committed.lock().await.push(CommittedAssignment {
        visit_id: "v7".to_owned(),
        employee_id: "e2".to_owned(),
        date: date(4),
        location: choice("s1", "Green Mart"),
    });
    let mut grid = grid(gateway.clone());
    let _ = grid.refresh().await;
    let cell = CellKey::new("e2", date(4));

    assert!(grid.remove_committed(&cell).await.is_ok());
    assert_eq!(*gateway.deleted.lock().await, vec!["v7".to_owned()]);
    assert_eq!(grid.cell(&cell), CellView::Empty);
}

#[tokio::test]
async fn shifting_window_prunes_out_of_range_state() {
    let mut grid = grid(Arc::new(FakeAssignmentGateway::default()));
    assign_first_choice(&mut grid, CellKey::new("e1", date(2))).await;
    assign_first_choice(&mut grid, CellKey::new("e1", date(7))).await;
    assert!(grid.set_column_filter(date(2), "store").is_ok());

    assert!(grid.shift_window(3).is_ok());

    assert_eq!(grid.window().start(), date(5));
    let pending: Vec<NaiveDate> = grid.pending().map(|(cell, _)| cell.date).collect();
    assert_eq!(pending, vec![date(7)]);
    assert!(grid.column_filters().is_empty());
}

#[tokio::test]
async fn column_filter_matches_cell_location() {
    let mut grid = grid(Arc::new(FakeAssignmentGateway::default()));
    assign_first_choice(&mut grid, CellKey::new("e1", date(3))).await;

    assert!(grid.set_column_filter(date(3), "Store 0").is_ok());
    let rows: Vec<&str> = grid
        .visible_rows()
        .iter()
        .map(|row| row.employee_id.as_str())
        .collect();
    assert_eq!(rows, vec!["e1"]);

    assert!(grid.set_column_filter(date(20), "x").is_err());
}

#[tokio::test(start_paused = true)]
async fn row_search_applies_after_quiet_period() {
    let mut grid = grid(Arc::new(FakeAssignmentGateway::default()));
    let start = Instant::now();

    grid.set_row_search("ra", start);
    grid.set_row_search("ravi", start + Duration::from_millis(100));

    assert!(!grid.poll_row_search(start + Duration::from_millis(300)));
    assert_eq!(grid.visible_rows().len(), 2);

    assert!(grid.poll_row_search(start + Duration::from_millis(400)));
    let rows = grid.visible_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].employee_id, "e2");
}
