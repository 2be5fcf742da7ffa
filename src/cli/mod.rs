use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{LeaveService, NewLeaveRequest};
use crate::domain::{LeaveCategory, LeaveRequest, LeaveTypeId};
use crate::telemetry;

/// Leavebook - Employee Leave Tracker
#[derive(Parser)]
#[command(name = "leavebook")]
#[command(about = "A local-first tracker for employee leave requests and balances")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "LEAVEBOOK_DATABASE", default_value = "leavebook.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Employee management commands
    #[command(subcommand)]
    Employee(EmployeeCommands),

    /// Leave type management commands
    #[command(subcommand)]
    LeaveType(LeaveTypeCommands),

    /// Leave request commands
    #[command(subcommand)]
    Request(RequestCommands),

    /// Print the leave report of an employee
    Report {
        /// Employee ID
        employee: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: employees, leave-types, requests, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EmployeeCommands {
    /// Register a new employee
    Create {
        /// Full name
        name: String,

        /// Email address (must be unique)
        #[arg(short, long)]
        email: String,

        /// Phone number in international format (e.g. +14155552671)
        #[arg(short, long)]
        phone: String,
    },

    /// List all employees
    List,

    /// Show an employee with their leave balances
    Show {
        /// Employee ID
        id: String,
    },

    /// Delete an employee and their leave history
    Delete {
        /// Employee ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum LeaveTypeCommands {
    /// Register a leave type
    Create {
        /// Category: annual, sick, maternity, paternity, unpaid
        category: String,

        /// Days consumed per approved request
        #[arg(short, long)]
        quota: i64,

        /// Allow unused days to carry over
        #[arg(long)]
        carryover: bool,
    },

    /// List all leave types
    List,

    /// Show a leave type
    Show {
        /// Leave type ID or category
        id: String,
    },
}

#[derive(Subcommand)]
pub enum RequestCommands {
    /// File a new leave request
    Create {
        /// Employee ID
        #[arg(long)]
        employee: String,

        /// Leave type ID or category
        #[arg(short = 't', long = "type")]
        leave_type: String,

        /// First day of leave (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day of leave (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Reason for the leave
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// List leave requests
    List {
        /// Only requests of this employee
        #[arg(long)]
        employee: Option<String>,
    },

    /// Show a leave request
    Show {
        /// Leave request ID
        id: String,
    },

    /// Approve a pending request
    Approve {
        /// Leave request ID
        id: String,
    },

    /// Accrue an approved request
    Accrue {
        /// Leave request ID
        id: String,
    },

    /// Reject a pending request
    Reject {
        /// Leave request ID
        id: String,
    },

    /// Cancel (delete) a request that has not been approved
    Cancel {
        /// Leave request ID
        id: String,
    },
}

fn parse_id(id: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("Invalid {} ID format (expected UUID)", what))
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

fn parse_category(category: &str) -> Result<LeaveCategory> {
    LeaveCategory::from_str(category).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid leave category '{}'. Valid categories: annual, sick, maternity, paternity, unpaid",
            category
        )
    })
}

/// Accept either a leave type UUID or a category name.
async fn resolve_leave_type(service: &LeaveService, arg: &str) -> Result<LeaveTypeId> {
    if let Ok(id) = Uuid::parse_str(arg) {
        return Ok(id);
    }
    let category = parse_category(arg)?;
    Ok(service.get_leave_type_by_category(category).await?.id)
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        telemetry::init(self.verbose);

        match self.command {
            Commands::Init => {
                LeaveService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Employee(cmd) => {
                let service = LeaveService::connect(&self.database).await?;
                run_employee_command(&service, cmd).await?;
            }

            Commands::LeaveType(cmd) => {
                let service = LeaveService::connect(&self.database).await?;
                run_leave_type_command(&service, cmd).await?;
            }

            Commands::Request(cmd) => {
                let service = LeaveService::connect(&self.database).await?;
                run_request_command(&service, cmd).await?;
            }

            Commands::Report { employee, format } => {
                let service = LeaveService::connect(&self.database).await?;
                let employee_id = parse_id(&employee, "employee")?;
                match format.as_str() {
                    "json" => {
                        let report = service.leave_report(employee_id).await?;
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    "text" => {
                        print!("{}", service.generate_leave_report(employee_id).await?);
                    }
                    other => anyhow::bail!("Invalid format '{}'. Valid formats: text, json", other),
                }
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = LeaveService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_employee_command(service: &LeaveService, cmd: EmployeeCommands) -> Result<()> {
    match cmd {
        EmployeeCommands::Create { name, email, phone } => {
            let employee = service.create_employee(name, email, phone).await?;
            println!("Created employee: {} ({})", employee.name, employee.id);
        }

        EmployeeCommands::List => {
            let employees = service.get_employees().await?;
            println!("{:<38} {:<24} {:<30}", "ID", "NAME", "EMAIL");
            println!("{}", "-".repeat(92));
            for employee in employees {
                println!(
                    "{:<38} {:<24} {:<30}",
                    employee.id, employee.name, employee.email
                );
            }
        }

        EmployeeCommands::Show { id } => {
            let employee = service.get_employee(parse_id(&id, "employee")?).await?;

            println!("Employee: {}", employee.name);
            println!("  ID:       {}", employee.id);
            println!("  Email:    {}", employee.email);
            println!("  Phone:    {}", employee.phone);
            println!(
                "  Created:  {}",
                employee.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!();
            println!("  Leave balances:");
            for category in LeaveCategory::ALL {
                println!(
                    "    {:<10} {:>4}",
                    category.label(),
                    employee.leave_balances.get(category)
                );
            }
        }

        EmployeeCommands::Delete { id } => {
            let message = service.delete_employee(parse_id(&id, "employee")?).await?;
            println!("{}", message);
        }
    }
    Ok(())
}

async fn run_leave_type_command(service: &LeaveService, cmd: LeaveTypeCommands) -> Result<()> {
    match cmd {
        LeaveTypeCommands::Create {
            category,
            quota,
            carryover,
        } => {
            let leave_type = service
                .create_leave_type(parse_category(&category)?, quota, carryover)
                .await?;
            println!(
                "Created leave type: {} (quota {}, {})",
                leave_type.name, leave_type.quota, leave_type.id
            );
        }

        LeaveTypeCommands::List => {
            let leave_types = service.get_leave_types().await?;
            println!("{:<38} {:<10} {:>6} {:<9}", "ID", "NAME", "QUOTA", "CARRYOVER");
            println!("{}", "-".repeat(66));
            for lt in leave_types {
                println!(
                    "{:<38} {:<10} {:>6} {:<9}",
                    lt.id,
                    lt.name.label(),
                    lt.quota,
                    if lt.carryover_allowed { "yes" } else { "no" }
                );
            }
        }

        LeaveTypeCommands::Show { id } => {
            let leave_type_id = resolve_leave_type(service, &id).await?;
            let lt = service.get_leave_type(leave_type_id).await?;
            println!("Leave type: {}", lt.name);
            println!("  ID:        {}", lt.id);
            println!("  Quota:     {}", lt.quota);
            println!(
                "  Carryover: {}",
                if lt.carryover_allowed { "yes" } else { "no" }
            );
            println!("  Created:   {}", lt.created_at.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    Ok(())
}

fn print_requests(requests: &[LeaveRequest]) {
    println!(
        "{:<38} {:<38} {:<10} {:<10} {:<9}",
        "ID", "EMPLOYEE", "START", "END", "STATUS"
    );
    println!("{}", "-".repeat(109));
    for r in requests {
        println!(
            "{:<38} {:<38} {:<10} {:<10} {:<9}",
            r.id,
            r.employee_id,
            r.start_date.to_string(),
            r.end_date.to_string(),
            r.status.as_str()
        );
    }
}

async fn run_request_command(service: &LeaveService, cmd: RequestCommands) -> Result<()> {
    match cmd {
        RequestCommands::Create {
            employee,
            leave_type,
            start,
            end,
            reason,
        } => {
            let input = NewLeaveRequest {
                employee_id: parse_id(&employee, "employee")?,
                leave_type_id: resolve_leave_type(service, &leave_type).await?,
                start_date: parse_date(&start)?,
                end_date: parse_date(&end)?,
                reason,
            };
            let request = service.create_leave_request(input).await?;
            println!(
                "Created leave request: {} to {} [{}] ({})",
                request.start_date, request.end_date, request.status, request.id
            );
        }

        RequestCommands::List { employee } => {
            let requests = match employee {
                Some(id) => {
                    service
                        .get_employee_leave_requests(parse_id(&id, "employee")?)
                        .await?
                }
                None => service.get_leave_requests().await?,
            };
            print_requests(&requests);
        }

        RequestCommands::Show { id } => {
            let r = service.get_leave_request(parse_id(&id, "leave request")?).await?;
            let lt = service.get_leave_type(r.leave_type_id).await?;
            println!("Leave request: {}", r.id);
            println!("  Employee:   {}", r.employee_id);
            println!("  Leave type: {} (quota {})", lt.name, lt.quota);
            println!("  Dates:      {} to {} ({} days)", r.start_date, r.end_date, r.days());
            println!("  Status:     {}", r.status);
            if !r.reason.is_empty() {
                println!("  Reason:     {}", r.reason);
            }
            println!("  Filed:      {}", r.created_at.format("%Y-%m-%d %H:%M:%S"));
        }

        RequestCommands::Approve { id } => {
            let message = service
                .approve_leave_request(parse_id(&id, "leave request")?)
                .await?;
            println!("{}", message);
        }

        RequestCommands::Accrue { id } => {
            let message = service.accrue_leave(parse_id(&id, "leave request")?).await?;
            println!("{}", message);
        }

        RequestCommands::Reject { id } => {
            let message = service
                .reject_leave_request(parse_id(&id, "leave request")?)
                .await?;
            println!("{}", message);
        }

        RequestCommands::Cancel { id } => {
            let message = service
                .cancel_leave_request(parse_id(&id, "leave request")?)
                .await?;
            println!("{}", message);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LeaveService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "employees" => {
            let count = exporter.export_employees_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} employees", count);
            }
        }
        "leave-types" => {
            let count = exporter.export_leave_types_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} leave types", count);
            }
        }
        "requests" => {
            let count = exporter.export_leave_requests_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} leave requests", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full database: {} employees, {} leave types, {} leave requests",
                    snapshot.employees.len(),
                    snapshot.leave_types.len(),
                    snapshot.leave_requests.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: employees, leave-types, requests, full",
                export_type
            );
        }
    }

    Ok(())
}
