use std::sync::Arc;

use chrono::NaiveDate;
use fieldforce_application::{
    ApprovalsBoard, AssignmentGrid, CellView, DEFAULT_ECHO_WINDOW, GridConfig, GridRow,
    ListController, ListSnapshot, PreferenceStore, RoleResolver, SectionState, UxPreferences,
    ViewSynchronizer,
};
use fieldforce_core::{AppError, AppResult, Identity};
use fieldforce_domain::{
    AggregateCounts, ApprovalStatus, AttendanceRequest, CellKey, CollectionQuery, DashboardView,
    DateWindow, Employee, Role, SortDirection, SortSpec, ViewAccess, ViewState,
};
use fieldforce_infrastructure::{
    HttpApiClient, HttpApiClientConfig, InMemoryCollectionSource, InMemoryPreferenceStore,
    JsonFilePreferenceStore, StaticTokenProvider,
};
use tokio::time::Instant;
use tracing::info;

use crate::console_config::{Command, ConsoleConfig};

const ATTENDANCE_FILTER: &str = "attendance";
const DASHBOARD_PAGE: &str = "dashboard";
const VISITS_LEGEND_NOTICE: &str = "visits-legend";
const GRID_EMPLOYEE_LIMIT: u32 = 50;
const CELL_WIDTH: usize = 12;

/// Services wired against the live backend.
pub struct Console {
    config: ConsoleConfig,
    client: Arc<HttpApiClient>,
    resolver: RoleResolver,
    preferences: UxPreferences,
}

impl Console {
    pub fn connect(config: ConsoleConfig) -> AppResult<Self> {
        let client_config =
            HttpApiClientConfig::new(&config.api_base_url)?.with_timeout(config.http_timeout);
        let tokens = Arc::new(StaticTokenProvider::new(config.api_token.clone()));
        let client = Arc::new(HttpApiClient::new(client_config, tokens)?);

        let store: Arc<dyn PreferenceStore> = match &config.preferences_path {
            Some(path) => Arc::new(JsonFilePreferenceStore::new(path)),
            None => Arc::new(InMemoryPreferenceStore::new()),
        };

        Ok(Self {
            config,
            resolver: RoleResolver::new(client.clone()),
            client,
            preferences: UxPreferences::new(store),
        })
    }

    pub async fn run(&self, command: Command) -> AppResult<()> {
        match command {
            Command::WhoAmI => self.whoami().await,
            Command::Approvals {
                status,
                page,
                search,
            } => self.approvals(status, page, search).await,
            Command::Counts => self.counts().await,
            Command::Visits { start, days } => self.visits(start, days).await,
            Command::Overview { view_query } => self.overview(&view_query).await,
            Command::Team { search } => self.team(search).await,
        }
    }

    async fn identity(&self) -> AppResult<&Identity> {
        self.resolver.resolve().await.identity.as_ref().ok_or_else(|| {
            AppError::Permission(
                "could not resolve the signed-in user; check FIELDFORCE_API_TOKEN".to_owned(),
            )
        })
    }

    async fn whoami(&self) -> AppResult<()> {
        let identity = self.identity().await?;
        let resolved = self.resolver.resolve().await;
        let flags = resolved.flags;

        println!("{} ({})", identity.display_name(), identity.id());
        println!("role:         {}", resolved.role.as_str());
        println!("primary role: {}", Role::primary_of(identity).as_str());
        println!("authorities:  {}", identity.authorities().join(", "));
        let held: Vec<&str> = Role::PRIORITY
            .iter()
            .filter(|role| **role != Role::Unassigned && flags.has(**role))
            .map(Role::as_str)
            .collect();
        println!("roles held:   {}", held.join(", "));
        Ok(())
    }

    async fn open_board(&self, status: ApprovalStatus) -> AppResult<ApprovalsBoard> {
        let query = CollectionQuery::new(self.config.page_size)?
            .with_status_filter(Some(status.as_str().to_owned()));

        ApprovalsBoard::open(
            &self.resolver,
            self.client.clone(),
            self.client.clone(),
            query,
            self.config.search_debounce,
        )
        .await
    }

    async fn approvals(
        &self,
        status: Option<ApprovalStatus>,
        page: u32,
        search: Option<String>,
    ) -> AppResult<()> {
        let status = match status {
            Some(status) => status,
            None => self
                .preferences
                .last_filter(ATTENDANCE_FILTER)
                .await
                .and_then(|filter| filter.parse().ok())
                .unwrap_or(ApprovalStatus::Pending),
        };

        let board = self.open_board(status).await?;
        info!(scope = board.scope().as_str(), status = status.as_str(), "loading approvals");
        let _ = board.load().await;
        if let Some(search) = search {
            board.list().set_search_term(search).await;
            let _ = board.list().flush_debounced().await;
        }
        if page > 0 {
            let _ = board.list().set_page(page).await;
        }
        self.preferences
            .remember_filter(ATTENDANCE_FILTER, Some(status.as_str()))
            .await;

        print_counts(&board.counts().await);
        println!();
        print_section(&board.snapshot().await, describe_request)
    }

    async fn counts(&self) -> AppResult<()> {
        let board = self.open_board(ApprovalStatus::Pending).await?;
        print_counts(&board.refresh_counts().await);
        Ok(())
    }

    async fn visits(&self, start: NaiveDate, days: u32) -> AppResult<()> {
        let scope = self.resolver.scope_for(ViewAccess::ASSIGN_VISITS).await?;
        let employees = match scope {
            Role::Coordinator => {
                let identity = self.identity().await?;
                self.client.list_subordinates(identity.id()).await?
            }
            _ => {
                let query = CollectionQuery::new(GRID_EMPLOYEE_LIMIT)?
                    .with_sort(Some(SortSpec::new("name", SortDirection::Asc)));
                self.client.list_employees(&query).await?.items
            }
        };

        let window = DateWindow::new(start, days)?;
        let mut grid = AssignmentGrid::new(self.client.clone(), window, GridConfig::default());
        grid.set_rows(employees.iter().map(GridRow::from).collect());
        grid.refresh().await?;

        print!("{:<24}", "employee");
        for date in window.dates() {
            print!("{:<CELL_WIDTH$}", date.format("%a %d %b").to_string());
        }
        println!();

        for row in grid.visible_rows() {
            print!("{:<24}", truncate(&row.label, 23));
            for date in window.dates() {
                let cell = CellKey::new(row.employee_id.clone(), date);
                let text = match grid.cell(&cell) {
                    CellView::Blocked => "----".to_owned(),
                    CellView::Empty => ".".to_owned(),
                    CellView::Pending(choice) => format!("*{}", choice.name),
                    CellView::Committed(visit) => visit.location.name.clone(),
                };
                print!("{:<CELL_WIDTH$}", truncate(&text, CELL_WIDTH - 1));
            }
            println!();
        }

        if self.preferences.mark_shown_once(VISITS_LEGEND_NOTICE).await {
            println!();
            println!("legend: '.' free, '----' non-working day, '*' not saved yet");
        }
        Ok(())
    }

    async fn overview(&self, view_query: &str) -> AppResult<()> {
        let scope = self.resolver.scope_for(ViewAccess::DASHBOARD).await?;
        let mut sync = ViewSynchronizer::<DashboardView>::mount(view_query, DEFAULT_ECHO_WINDOW);
        sync.restore_breadcrumbs(
            self.preferences
                .breadcrumbs::<DashboardView>(DASHBOARD_PAGE)
                .await,
        );
        let current = sync.current().clone();
        info!(scope = scope.as_str(), view = %current.to_query(), "rendering dashboard");

        match (current.mode(), current.selected_id()) {
            (DashboardView::StatusList, Some(status)) => {
                let query = CollectionQuery::new(self.config.page_size)?
                    .with_status_filter(Some(status.to_owned()));
                let page = self.client.list_employees(&query).await?;
                println!("employees with status '{status}': {}", page.total_items);
                for employee in &page.items {
                    println!("  {}", describe_employee(employee));
                }
            }
            (DashboardView::EmployeeDetail, Some(employee_id)) => {
                let employee = self.client.get_employee(employee_id).await?;
                println!("{}", describe_employee(&employee));
                let visits = self.client.list_employee_visits(employee_id).await?;
                if visits.is_empty() {
                    println!("  no visits recorded");
                }
                for visit in visits {
                    println!("  {}  {:<24} {}", visit.date, visit.location_name, visit.status);
                }
            }
            _ => {
                let overview = self.client.dashboard_overview().await?;
                let locations = self.client.live_locations().await?;
                println!("employees:          {}", overview.total_employees);
                println!("present today:      {}", overview.present_today);
                println!("on leave today:     {}", overview.on_leave_today);
                println!(
                    "visits today:       {} of {} completed",
                    overview.visits_completed_today, overview.visits_planned_today
                );
                println!("pending approvals:  {}", overview.pending_approvals);
                println!("live positions:     {}", locations.len());
            }
        }

        let mut trail: Vec<ViewState<DashboardView>> = sync.breadcrumbs().to_vec();
        if !current.is_root() {
            trail.push(current);
        }
        self.preferences
            .save_breadcrumbs(DASHBOARD_PAGE, &trail)
            .await;

        if let Some(parent) = sync.back(Instant::now()) {
            let target = if parent.query.is_empty() {
                "overview".to_owned()
            } else {
                parent.query
            };
            println!();
            println!("back: {target}");
        }
        Ok(())
    }

    async fn team(&self, search: Option<String>) -> AppResult<()> {
        let identity = self.identity().await?;
        let members = self.client.list_subordinates(identity.id()).await?;
        let source = Arc::new(InMemoryCollectionSource::new(members));
        let query = CollectionQuery::new(self.config.page_size)?
            .with_sort(Some(SortSpec::new("name", SortDirection::Asc)));
        let controller: ListController<Employee> =
            ListController::new(source, query, self.config.search_debounce);

        let _ = controller.load().await;
        if let Some(search) = search {
            controller.set_search_term(search).await;
            let _ = controller.flush_debounced().await;
        }

        print_section(&controller.snapshot().await, describe_employee)
    }
}

fn print_counts(counts: &AggregateCounts) {
    let tabs: Vec<String> = ApprovalStatus::ALL
        .iter()
        .map(|status| format!("{} {}", status.as_str(), counts.get(status.as_str())))
        .collect();
    println!("{}", tabs.join("  |  "));
    if !counts.failed().is_empty() {
        println!("(counts unavailable for: {})", counts.failed().join(", "));
    }
}

fn print_section<T>(snapshot: &ListSnapshot<T>, describe: fn(&T) -> String) -> AppResult<()> {
    match snapshot.rendered.section() {
        SectionState::Loading => {
            println!("loading...");
            Ok(())
        }
        SectionState::Failed { .. } => Err(snapshot
            .rendered
            .error
            .clone()
            .unwrap_or_else(|| AppError::Internal("list failed without an error".to_owned()))),
        SectionState::Ready(page) if page.is_empty() => {
            println!("nothing to show");
            Ok(())
        }
        SectionState::Ready(page) => {
            for item in &page.items {
                println!("{}", describe(item));
            }
            println!();
            println!(
                "page {} of {} ({} items)",
                page.page_index + 1,
                page.total_pages.max(1),
                page.total_items
            );
            Ok(())
        }
    }
}

fn describe_request(request: &AttendanceRequest) -> String {
    let range = if request.start_date == request.end_date {
        request.start_date.to_string()
    } else {
        format!("{} to {}", request.start_date, request.end_date)
    };

    format!(
        "{:<8} {:<24} {:<24} {:<9} {}",
        request.id,
        truncate(&request.employee_name, 23),
        range,
        request.status.as_str(),
        request.reason.as_deref().unwrap_or("")
    )
}

fn describe_employee(employee: &Employee) -> String {
    format!(
        "{:<8} {:<24} {:<14} {}",
        employee.code.as_deref().unwrap_or(&employee.id),
        truncate(&employee.name, 23),
        employee.role.as_deref().unwrap_or("-"),
        employee.city.as_deref().unwrap_or("")
    )
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }
    let mut shortened: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_marks_cut_values() {
        assert_eq!(truncate("Green Mart", 20), "Green Mart");
        assert_eq!(truncate("Green Mart Supermarket", 8), "Green M~");
    }
}
