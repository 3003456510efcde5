use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::info;
use tracing_subscriber::EnvFilter;

use practice_calendar::display::{print_day, write_day_to_file};
use practice_calendar::grid::{effective_columns, layout_day, ViewMode};
use practice_calendar::practice::{AppointmentSource, InMemoryPractice, ResourceSource};
use practice_calendar::{web, CalendarConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config = CalendarConfig::load(None)?;
    let practice = Arc::new(InMemoryPractice::from_data_dir(&config.data_dir)?);

    // Check if we should run in web mode
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "web" {
        let mut config = config;
        if let Some(port) = args.get(2).and_then(|p| p.parse::<u16>().ok()) {
            config.port = port;
        }
        println!("Access the calendar API at http://localhost:{}/api/calendar/<date>", config.port);

        web::start_server(config, practice).await?;
        return Ok(());
    }

    // CLI mode: print [YYYY-MM-DD] [operatory|provider]
    let mut rest = args.iter().skip(1).skip_while(|a| a.as_str() == "print");
    let date = match rest.next() {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")?,
        None => Local::now().date_naive(),
    };
    let view_mode = match rest.next() {
        Some(v) => v.parse::<ViewMode>()?,
        None => config.default_view_mode,
    };

    let view = config.view_state(date).with_view_mode(view_mode);
    let columns = effective_columns(practice.list_resources(view_mode), view_mode);
    let appointments = practice.list_appointments(date);
    info!(%date, %view_mode, appointments = appointments.len(), "laying out day");

    let layout = layout_day(&view, &columns, &appointments)?;
    print_day(&layout);

    let filename = format!("calendar_{}.txt", date);
    write_day_to_file(&layout, &filename)?;
    println!("Calendar saved to {}", filename);

    Ok(())
}
