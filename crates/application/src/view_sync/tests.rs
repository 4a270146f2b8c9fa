use std::time::Duration;

use fieldforce_domain::{DashboardView, ViewState};
use tokio::time::Instant;

use super::{DEFAULT_ECHO_WINDOW, UrlChange, ViewSynchronizer};

fn status_list(status: &str) -> ViewState<DashboardView> {
    ViewState::new(DashboardView::StatusList, Some(status.to_owned()))
        .unwrap_or_else(|_| unreachable!())
}

fn employee(id: &str) -> ViewState<DashboardView> {
    ViewState::new(DashboardView::EmployeeDetail, Some(id.to_owned()))
        .unwrap_or_else(|_| unreachable!())
}

#[test]
fn mount_adopts_valid_url() {
    let sync =
        ViewSynchronizer::<DashboardView>::mount("?view=employee&id=17", DEFAULT_ECHO_WINDOW);
    assert_eq!(sync.current(), &employee("17"));
}

#[test]
fn mount_with_garbage_defaults_to_root() {
    let sync = ViewSynchronizer::<DashboardView>::mount("view=nope", DEFAULT_ECHO_WINDOW);
    assert!(sync.current().is_root());
}

#[test]
fn back_restores_immediate_parent_then_root() {
    let now = Instant::now();
    let mut sync = ViewSynchronizer::<DashboardView>::mount("", DEFAULT_ECHO_WINDOW);

    let _ = sync.navigate(status_list("absent"), now);
    let write = sync.navigate(employee("17"), now);
    assert_eq!(
        write.map(|write| write.query),
        Some("view=employee&id=17".to_owned())
    );

    let write = sync.back(now).unwrap_or_else(|| unreachable!());
    assert_eq!(write.query, "view=status&id=absent");
    assert_eq!(sync.current(), &status_list("absent"));

    let write = sync.back(now).unwrap_or_else(|| unreachable!());
    assert_eq!(write.query, "");
    assert!(sync.current().is_root());

    assert_eq!(sync.back(now), None);
}

#[test]
fn back_from_deep_link_without_parent_goes_to_root() {
    let now = Instant::now();
    let mut sync =
        ViewSynchronizer::<DashboardView>::mount("view=employee&id=3", DEFAULT_ECHO_WINDOW);

    let write = sync.back(now).unwrap_or_else(|| unreachable!());
    assert_eq!(write.query, "");
}

#[test]
fn echo_of_back_navigation_does_not_reopen_the_child() {
    let now = Instant::now();
    let mut sync = ViewSynchronizer::<DashboardView>::mount("", DEFAULT_ECHO_WINDOW);
    let _ = sync.navigate(status_list("late"), now);
    let _ = sync.navigate(employee("9"), now);
    let _ = sync.back(now);

    // The router replays the previous URL before the replacement lands.
    let stale = sync.on_url_changed("view=employee&id=9", now + Duration::from_millis(20));
    assert_eq!(stale, UrlChange::Superseded);
    assert_eq!(sync.current(), &status_list("late"));

    let echo = sync.on_url_changed("view=status&id=late", now + Duration::from_millis(40));
    assert_eq!(echo, UrlChange::Echo);
    assert_eq!(sync.current(), &status_list("late"));
}

#[test]
fn browser_navigation_after_echo_window_is_adopted() {
    let now = Instant::now();
    let mut sync = ViewSynchronizer::<DashboardView>::mount("", DEFAULT_ECHO_WINDOW);
    let _ = sync.navigate(employee("4"), now);

    let later = now + DEFAULT_ECHO_WINDOW + Duration::from_millis(1);
    let change = sync.on_url_changed("", later);

    assert_eq!(change, UrlChange::Adopted(ViewState::root()));
    assert!(sync.current().is_root());
    assert!(sync.breadcrumbs().is_empty());
}

#[test]
fn matching_url_is_unchanged() {
    let now = Instant::now();
    let mut sync =
        ViewSynchronizer::<DashboardView>::mount("view=status&id=present", DEFAULT_ECHO_WINDOW);
    assert_eq!(
        sync.on_url_changed("id=present&view=status", now),
        UrlChange::Unchanged
    );
}

#[test]
fn navigating_to_recorded_parent_unwinds_stack() {
    let now = Instant::now();
    let mut sync = ViewSynchronizer::<DashboardView>::mount("", DEFAULT_ECHO_WINDOW);
    let _ = sync.navigate(status_list("present"), now);
    let _ = sync.navigate(employee("1"), now);

    let _ = sync.navigate(status_list("present"), now);
    assert_eq!(sync.breadcrumbs(), [ViewState::root()]);
}

#[test]
fn restored_breadcrumbs_drive_back_navigation() {
    let now = Instant::now();
    let mut sync =
        ViewSynchronizer::<DashboardView>::mount("view=employee&id=8", DEFAULT_ECHO_WINDOW);
    sync.restore_breadcrumbs(vec![ViewState::root(), status_list("absent")]);

    let write = sync.back(now).unwrap_or_else(|| unreachable!());
    assert_eq!(write.query, "view=status&id=absent");
}
