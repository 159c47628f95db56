use crate::infra::{build_lead_controller, parse_local_datetime};
use chrono::{Local, NaiveDateTime};
use clap::Args;
use siteline::availability::{compute_status, format_hour, AvailabilityStatus, DaySchedule};
use siteline::config::AppConfig;
use siteline::error::AppError;
use siteline::leads::FormField;
use siteline::telemetry;

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Args, Debug, Default)]
pub(crate) struct StatusArgs {
    /// Local time to evaluate (YYYY-MM-DDTHH:MM). Defaults to now.
    #[arg(long, value_parser = parse_local_datetime)]
    pub(crate) at: Option<NaiveDateTime>,
    /// Print the weekly schedule after the status
    #[arg(long)]
    pub(crate) show_schedule: bool,
    /// Emit the status as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SubmitArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) phone: String,
    #[arg(long)]
    pub(crate) email: String,
    /// Service requested, e.g. "pumping" or "inspection"
    #[arg(long)]
    pub(crate) service: String,
    #[arg(long, default_value = "routine")]
    pub(crate) urgency: String,
    #[arg(long, default_value = "")]
    pub(crate) message: String,
    #[arg(long)]
    pub(crate) address: Option<String>,
}

pub(crate) fn run_status(args: StatusArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let schedule = &config.availability.schedule;
    let now = args.at.unwrap_or_else(|| Local::now().naive_local());
    let status = compute_status(now, schedule);

    if args.json {
        let payload = serde_json::to_string_pretty(&status)
            .map_err(std::io::Error::from)?;
        println!("{payload}");
        return Ok(());
    }

    render_status(now, &status);
    if args.show_schedule {
        println!("\nWeekly hours");
        for (index, day) in schedule.days().iter().enumerate() {
            match day {
                DaySchedule::Open {
                    open_hour,
                    close_hour,
                } => println!(
                    "  {}  {} - {}",
                    WEEKDAY_LABELS[index],
                    format_hour(*open_hour),
                    format_hour(*close_hour)
                ),
                DaySchedule::Closed => println!("  {}  closed", WEEKDAY_LABELS[index]),
            }
        }
    }
    Ok(())
}

fn render_status(now: NaiveDateTime, status: &AvailabilityStatus) {
    println!("Availability at {}", now.format("%A %Y-%m-%d %H:%M"));
    println!("  {}", status.status_message);
    if let Some(next_open) = status.next_open {
        println!("  Next opening: {}", next_open.format("%A %Y-%m-%d %-I:%M %p"));
    }
    if status.emergency_available {
        println!("  Emergency service: available 24/7");
    }
}

pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let controller = build_lead_controller(&config.leads)?;
    controller.update_field(FormField::Name, args.name);
    controller.update_field(FormField::Phone, args.phone);
    controller.update_field(FormField::Email, args.email);
    controller.update_field(FormField::Service, args.service);
    controller.update_field(FormField::Urgency, args.urgency);
    controller.update_field(FormField::Message, args.message);
    if let Some(address) = args.address {
        controller.update_field(FormField::Address, address);
    }

    println!("Sending lead to {}", config.leads.endpoint);
    let outcome = controller.submit_form().await;
    let snapshot = controller.snapshot();
    controller.shutdown();

    match outcome {
        Ok(()) => println!("Lead accepted (submission #{})", snapshot.submit_count),
        Err(err) if err.is_transmitted() => println!("Lead not delivered: {err}"),
        Err(err) => println!("Lead not sent: {}", err.user_message()),
    }
    for message in &snapshot.errors {
        println!("  - {message}");
    }
    Ok(())
}
