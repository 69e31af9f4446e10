// src/main.rs
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use hrportal::admin::AdminService;
use hrportal::attendance::{
    AttendanceService, AttendanceSnapshot, DaySummary, WeekSummary, DEFAULT_HISTORY_DAYS,
};
use hrportal::expense::{load_receipt, ExpenseService};
use hrportal::leave::LeaveService;
use hrportal::models::{
    Decision, Department, DepartmentCreate, DurationKind, ExpenseCategory, ExpenseCategoryCreate,
    ExpenseForm, ExpenseRequest, LeaveForm, LeaveRequest, LeaveType, LeaveTypeCreate,
    RegisterRequest, Role, User, DEFAULT_DEPARTMENT_ID,
};
use hrportal::navigation::visible_views;
use hrportal::notify::{report, ConsoleNotifier, Notifier};
use hrportal::reports::ReportService;
use hrportal::{AppConfig, Clock, HrClient, HrError, SystemClock};

const DEFAULT_LOG_FILTER: &str = "hrportal=warn";

// --- Command line ---

#[derive(Parser, Debug)]
#[command(name = "hrportal", version, about = "Command-line client for the HR portal")]
struct Cli {
    /// API base URL (overrides HRPORTAL_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Where the session is stored (overrides HRPORTAL_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Request timeout in seconds (overrides HRPORTAL_REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and remember the session
    Login {
        email: String,
        #[arg(long, env = "HRPORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account (does not sign in)
    Register(RegisterArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Fetch the profile from the backend first
        #[arg(long)]
        refresh: bool,
    },
    /// Check that the backend is up
    Health,
    /// Pending/approved/rejected counts for leave and expenses
    Dashboard,
    /// List the views available to the current session
    Views,
    #[command(subcommand)]
    Leave(LeaveCommand),
    #[command(subcommand)]
    Expense(ExpenseCommand),
    #[command(subcommand)]
    Attendance(AttendanceCommand),
    #[command(subcommand)]
    Admin(AdminCommand),
    #[command(subcommand)]
    Reports(ReportsCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    employee_id: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "HRPORTAL_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, default_value = DEFAULT_DEPARTMENT_ID)]
    department: String,
    #[arg(long, default_value = "employee")]
    role: Role,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DurationArg {
    FullDay,
    HalfDay,
    Wfh,
}

impl From<DurationArg> for DurationKind {
    fn from(arg: DurationArg) -> Self {
        match arg {
            DurationArg::FullDay => DurationKind::FullDay,
            DurationArg::HalfDay => DurationKind::HalfDay,
            DurationArg::Wfh => DurationKind::WorkFromHome,
        }
    }
}

#[derive(Subcommand, Debug)]
enum LeaveCommand {
    Types,
    /// Every request visible to you
    List,
    /// Only your own requests
    Mine,
    Apply {
        #[arg(long = "type")]
        leave_type: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, value_enum, default_value = "full-day")]
        duration: DurationArg,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        manager: Option<String>,
    },
    Approve { id: String },
    Reject { id: String },
    CreateType {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        max_days: u32,
        #[arg(long, default_value_t = 0)]
        carry_forward: u32,
        #[arg(long)]
        unpaid: bool,
        #[arg(long)]
        no_approval: bool,
    },
    DeleteType { id: String },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Categories,
    List,
    Mine,
    Submit {
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: Decimal,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: String,
        #[arg(long)]
        manager: Option<String>,
        /// JPEG, PNG or PDF, at most 5 MB
        #[arg(long)]
        receipt: Option<PathBuf>,
    },
    Approve { id: String },
    Reject { id: String },
    UploadReceipt { id: String, path: PathBuf },
    CreateCategory {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        max_per_month: Option<Decimal>,
        #[arg(long)]
        requires_receipt: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AttendanceCommand {
    Status,
    CheckIn {
        #[arg(long)]
        location: Option<String>,
    },
    CheckOut {
        #[arg(long)]
        location: Option<String>,
    },
    Today,
    Week,
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: usize,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Departments,
    CreateDepartment {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Users,
}

#[derive(Subcommand, Debug)]
enum ReportsCommand {
    Leave,
    Expense,
}

// --- Application ---

struct App {
    client: Arc<HrClient>,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
}

impl App {
    fn report<T>(
        &self,
        result: Result<T, HrError>,
        success: impl FnOnce(&T) -> String,
        fallback: &str,
    ) -> Result<T, HrError> {
        report(self.notifier.as_ref(), result, success, fallback)
    }

    async fn dispatch(&self, command: Command) -> Result<(), HrError> {
        match command {
            Command::Login { email, password } => {
                self.report(
                    self.client.login(&email, &password).await,
                    |user| format!("Welcome, {} ({})", user.full_name, user.role),
                    "Login failed",
                )?;
            }
            Command::Register(args) => {
                let request = RegisterRequest {
                    full_name: args.full_name,
                    employee_id: args.employee_id,
                    email: args.email,
                    password: args.password,
                    department_id: args.department,
                    role: args.role,
                    phone: args.phone,
                };
                self.report(
                    self.client.register(&request).await,
                    |created| {
                        created
                            .message
                            .clone()
                            .unwrap_or_else(|| "Registration successful. Please log in.".into())
                    },
                    "Registration failed",
                )?;
            }
            Command::Logout => {
                self.report(self.client.logout(), |_| "Logged out".into(), "Logout failed")?;
            }
            Command::Whoami { refresh } => {
                let result = if refresh {
                    self.client.me().await
                } else {
                    self.client.require_session()
                };
                let user = self.report(result, |_| "Signed in".into(), "Failed to load profile")?;
                print_user(&user);
            }
            Command::Health => {
                self.report(
                    self.client.health().await,
                    |h| format!("Backend is {}", h.status),
                    "Backend unreachable",
                )?;
            }
            Command::Dashboard => {
                let service = ReportService::new(self.client.clone());
                let dashboard =
                    self.report(service.dashboard().await, |_| "Dashboard".into(), "Failed to load dashboard")?;
                println!("{:<10} {:>8} {:>9} {:>9}", "", "Pending", "Approved", "Rejected");
                for (label, counts) in [("Leave", Some(dashboard.leave)), ("Expense", dashboard.expense)] {
                    match counts {
                        Some(counts) => println!(
                            "{:<10} {:>8} {:>9} {:>9}",
                            label, counts.pending, counts.approved, counts.rejected
                        ),
                        None => println!("{:<10} {:>8}", label, "n/a"),
                    }
                }
            }
            Command::Views => {
                for view in visible_views(&self.client.session().snapshot()) {
                    println!("{}", view);
                }
            }
            Command::Leave(cmd) => self.leave(cmd).await?,
            Command::Expense(cmd) => self.expense(cmd).await?,
            Command::Attendance(cmd) => self.attendance(cmd).await?,
            Command::Admin(cmd) => self.admin(cmd).await?,
            Command::Reports(cmd) => self.reports(cmd).await?,
        }
        Ok(())
    }

    async fn leave(&self, command: LeaveCommand) -> Result<(), HrError> {
        let service = LeaveService::new(self.client.clone());
        match command {
            LeaveCommand::Types => {
                let types = self.report(service.types().await, count_msg("leave type"), "Failed to load leave types")?;
                print_leave_types(&types);
            }
            LeaveCommand::List => {
                let requests =
                    self.report(service.requests().await, count_msg("leave request"), "Failed to load leave requests")?;
                print_leave_requests(&requests);
            }
            LeaveCommand::Mine => {
                let requests =
                    self.report(service.my_requests().await, count_msg("leave request"), "Failed to load leave requests")?;
                print_leave_requests(&requests);
            }
            LeaveCommand::Apply {
                leave_type,
                start,
                end,
                duration,
                reason,
                manager,
            } => {
                let form = LeaveForm {
                    leave_type_id: leave_type,
                    start_date: Some(start),
                    end_date: Some(end),
                    duration_type: Some(duration.into()),
                    reason,
                    manager_id: manager,
                };
                let submitted = self.report(
                    service.submit_resolving_type(&form).await,
                    |s| {
                        s.message
                            .clone()
                            .unwrap_or_else(|| "Leave request submitted".into())
                    },
                    "Failed to submit leave request",
                )?;
                print_leave_requests(&submitted.records);
            }
            LeaveCommand::Approve { id } => {
                let requests = self.report(
                    service.decide(&id, Decision::Approve).await,
                    |_| format!("Leave request {} approved", id),
                    "Failed to update leave request",
                )?;
                print_leave_requests(&requests);
            }
            LeaveCommand::Reject { id } => {
                let requests = self.report(
                    service.decide(&id, Decision::Reject).await,
                    |_| format!("Leave request {} rejected", id),
                    "Failed to update leave request",
                )?;
                print_leave_requests(&requests);
            }
            LeaveCommand::CreateType {
                name,
                description,
                max_days,
                carry_forward,
                unpaid,
                no_approval,
            } => {
                let new_type = LeaveTypeCreate {
                    name,
                    description,
                    max_days_per_year: max_days,
                    carry_forward_days: carry_forward,
                    is_paid: !unpaid,
                    requires_approval: !no_approval,
                };
                let submitted = self.report(
                    service.create_type(&new_type).await,
                    |s| s.message.clone().unwrap_or_else(|| "Leave type created".into()),
                    "Failed to create leave type",
                )?;
                print_leave_types(&submitted.records);
            }
            LeaveCommand::DeleteType { id } => {
                let types = self.report(
                    service.delete_type(&id).await,
                    |_| format!("Leave type {} deleted", id),
                    "Failed to delete leave type",
                )?;
                print_leave_types(&types);
            }
        }
        Ok(())
    }

    async fn expense(&self, command: ExpenseCommand) -> Result<(), HrError> {
        let service = ExpenseService::new(self.client.clone(), self.clock.clone());
        match command {
            ExpenseCommand::Categories => {
                let categories = self.report(
                    service.categories().await,
                    count_msg("expense category"),
                    "Failed to load expense categories",
                )?;
                print_categories(&categories);
            }
            ExpenseCommand::List => {
                let requests =
                    self.report(service.requests().await, count_msg("expense request"), "Failed to load expenses")?;
                print_expenses(&requests);
            }
            ExpenseCommand::Mine => {
                let requests =
                    self.report(service.my_requests().await, count_msg("expense request"), "Failed to load expenses")?;
                print_expenses(&requests);
            }
            ExpenseCommand::Submit {
                category,
                amount,
                date,
                description,
                manager,
                receipt,
            } => {
                let today = self.clock.today();
                let result = async {
                    let form = ExpenseForm {
                        category_id: category,
                        amount: Some(amount),
                        expense_date: Some(date.unwrap_or(today)),
                        description,
                        manager_id: manager,
                        receipt: receipt.as_deref().map(load_receipt).transpose()?,
                    };
                    service.submit_resolving_category(&form).await
                }
                .await;
                let submitted = self.report(
                    result,
                    |s| {
                        s.message
                            .clone()
                            .unwrap_or_else(|| "Expense request submitted".into())
                    },
                    "Failed to submit expense",
                )?;
                print_expenses(&submitted.records);
            }
            ExpenseCommand::Approve { id } => {
                let requests = self.report(
                    service.decide(&id, Decision::Approve).await,
                    |_| format!("Expense request {} approved", id),
                    "Failed to update expense request",
                )?;
                print_expenses(&requests);
            }
            ExpenseCommand::Reject { id } => {
                let requests = self.report(
                    service.decide(&id, Decision::Reject).await,
                    |_| format!("Expense request {} rejected", id),
                    "Failed to update expense request",
                )?;
                print_expenses(&requests);
            }
            ExpenseCommand::UploadReceipt { id, path } => {
                let result = async {
                    let receipt = load_receipt(&path)?;
                    service.upload_receipt(&id, &receipt).await
                }
                .await;
                let uploaded = self.report(
                    result,
                    |u| u.message.clone().unwrap_or_else(|| "Receipt uploaded".into()),
                    "Failed to upload receipt",
                )?;
                if let Some(url) = uploaded.receipt_url {
                    println!("{}", url);
                }
            }
            ExpenseCommand::CreateCategory {
                name,
                description,
                max_per_month,
                requires_receipt,
            } => {
                let category = ExpenseCategoryCreate {
                    name,
                    description,
                    max_amount_per_month: max_per_month,
                    requires_receipt,
                };
                let submitted = self.report(
                    service.create_category(&category).await,
                    |s| s.message.clone().unwrap_or_else(|| "Expense category created".into()),
                    "Failed to create expense category",
                )?;
                print_categories(&submitted.records);
            }
        }
        Ok(())
    }

    async fn attendance(&self, command: AttendanceCommand) -> Result<(), HrError> {
        let service = AttendanceService::new(self.client.clone(), self.clock.clone());
        match command {
            AttendanceCommand::Status => {
                let snapshot =
                    self.report(service.snapshot().await, |_| "Attendance loaded".into(), "Failed to load attendance")?;
                print_snapshot(&snapshot);
            }
            AttendanceCommand::CheckIn { location } => {
                let snapshot = self.report(
                    service.check_in(location).await,
                    |_| "Checked in successfully".into(),
                    "Failed to check in",
                )?;
                print_snapshot(&snapshot);
            }
            AttendanceCommand::CheckOut { location } => {
                let snapshot = self.report(
                    service.check_out(location).await,
                    |_| "Checked out successfully".into(),
                    "Failed to check out",
                )?;
                print_snapshot(&snapshot);
            }
            AttendanceCommand::Today => {
                let day = self.report(service.today().await, |d| format!("Today: {}", d.status), "Failed to load attendance")?;
                print_days(std::slice::from_ref(&day));
            }
            AttendanceCommand::Week => {
                let week = self.report(
                    service.week().await,
                    |w| format!("Week of {}", w.start),
                    "Failed to load attendance",
                )?;
                print_week(&week);
            }
            AttendanceCommand::History { days } => {
                let history = self.report(
                    service.history(days).await,
                    count_msg("day"),
                    "Failed to load attendance",
                )?;
                print_days(&history);
            }
        }
        Ok(())
    }

    async fn admin(&self, command: AdminCommand) -> Result<(), HrError> {
        let service = AdminService::new(self.client.clone());
        match command {
            AdminCommand::Departments => {
                let departments =
                    self.report(service.departments().await, count_msg("department"), "Failed to load departments")?;
                print_departments(&departments);
            }
            AdminCommand::CreateDepartment { name, description } => {
                let submitted = self.report(
                    service
                        .create_department(&DepartmentCreate { name, description })
                        .await,
                    |s| s.message.clone().unwrap_or_else(|| "Department created".into()),
                    "Failed to create department",
                )?;
                print_departments(&submitted.records);
            }
            AdminCommand::Users => {
                let users = self.report(service.users().await, count_msg("user"), "Failed to load users")?;
                for user in &users {
                    print_user(user);
                }
            }
        }
        Ok(())
    }

    async fn reports(&self, command: ReportsCommand) -> Result<(), HrError> {
        let service = ReportService::new(self.client.clone());
        match command {
            ReportsCommand::Leave => {
                let summary =
                    self.report(service.leave_summary().await, |_| "Leave summary".into(), "Failed to load report")?;
                println!(
                    "Total {}  Pending {}  Approved {}  Rejected {}",
                    summary.total_requests, summary.pending, summary.approved, summary.rejected
                );
                for (leave_type, count) in &summary.by_type {
                    println!("  {:<24} {:>5}", leave_type, count);
                }
            }
            ReportsCommand::Expense => {
                let summary = self.report(
                    service.expense_summary().await,
                    |_| "Expense summary".into(),
                    "Failed to load report",
                )?;
                println!(
                    "Total {} ({})  Pending {}  Approved {}  Rejected {}",
                    summary.total_requests,
                    summary.total_amount,
                    summary.pending,
                    summary.approved,
                    summary.rejected
                );
                for (category, amount) in &summary.by_category {
                    println!("  {:<24} {:>12}", category, amount);
                }
            }
        }
        Ok(())
    }
}

fn count_msg<T>(noun: &'static str) -> impl FnOnce(&Vec<T>) -> String {
    move |items: &Vec<T>| {
        let plural = if items.len() == 1 { "" } else { "s" };
        format!("{} {}{}", items.len(), noun, plural)
    }
}

// --- Output ---

fn hhmm(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_user(user: &User) {
    println!(
        "{} <{}>  {}  role={}  dept={}",
        user.full_name,
        user.email,
        user.employee_id,
        user.role,
        user.department_id.as_deref().unwrap_or("-")
    );
}

fn print_leave_types(types: &[LeaveType]) {
    for t in types {
        println!(
            "{:<38} {:<20} {:>3} days/yr  paid={}  half-day={}  wfh={}",
            t.id, t.name, t.max_days_per_year, t.is_paid, t.supports_half_day, t.supports_wfh
        );
    }
}

fn print_leave_requests(requests: &[LeaveRequest]) {
    for r in requests {
        println!(
            "{:<38} {} .. {} ({} d) {:<14} {:<9} {}",
            r.id,
            r.start_date,
            r.end_date,
            r.days(),
            r.duration_type,
            r.status,
            r.reason
        );
    }
}

fn print_categories(categories: &[ExpenseCategory]) {
    for c in categories {
        println!(
            "{:<38} {:<20} limit={}  receipt={}",
            c.id,
            c.name,
            c.max_amount_per_month
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".into()),
            if c.requires_receipt { "required" } else { "optional" }
        );
    }
}

fn print_expenses(requests: &[ExpenseRequest]) {
    for r in requests {
        println!(
            "{:<38} {} {:>12} {:<9} {}{}",
            r.id,
            r.expense_date,
            r.amount,
            r.status,
            r.description,
            if r.receipt_url.is_some() { " [receipt]" } else { "" }
        );
    }
}

fn print_snapshot(snapshot: &AttendanceSnapshot) {
    let status = &snapshot.status;
    println!(
        "Checked in: {} ({})  Checked out: {} ({})",
        status.checked_in,
        hhmm(status.check_in_time),
        status.checked_out,
        hhmm(status.check_out_time)
    );
}

fn print_days(days: &[DaySummary]) {
    for d in days {
        println!(
            "{}  in {:>5}  out {:>5}  {:<10} {:>6.2} h",
            d.date,
            hhmm(d.check_in),
            hhmm(d.check_out),
            d.status,
            d.working_hours
        );
    }
}

fn print_week(week: &WeekSummary) {
    print_days(&week.days);
    println!(
        "Total {:.2} h over {} present day(s)",
        week.total_hours, week.present_days
    );
}

fn print_departments(departments: &[Department]) {
    for d in departments {
        println!("{:<38} {:<24} {}", d.id, d.name, d.description);
    }
}

// --- Entry point ---

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::from_env()
        .context("Loading configuration failed")?
        .with_overrides(cli.base_url, cli.session_file, cli.timeout);
    info!("Using API at {}", config.api_base_url);

    let client = Arc::new(HrClient::from_config(config).context("Creating HR client failed")?);
    let restored = client.initialize().context("Restoring session failed")?;
    debug!("Session restored: {}", restored);

    let app = App {
        client,
        clock: Arc::new(SystemClock),
        notifier: Box::new(ConsoleNotifier),
    };

    match app.dispatch(cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            debug!("Command failed: {:?}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
