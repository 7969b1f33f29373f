use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::database::queries::UserQueries;
use crate::errors::Result;
use crate::services::notifier::Notifier;

/// One reservation of the reporting period, joined with its lot's city.
#[derive(Debug, FromRow)]
pub struct ReportRow {
    pub booked_at: DateTime<Utc>,
    pub parking_cost: Option<f64>,
    pub city: Option<String>,
}

/// Periodically checks for a calendar month rollover and, when one happens,
/// emails every registered user a summary of their previous month's parking
/// activity. Runs for the lifetime of the process.
pub async fn run_monthly_report_loop(pool: PgPool, notifier: Arc<Notifier>, check_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(check_secs.max(1)));
    let mut last_seen = month_of(Utc::now().date_naive());

    loop {
        interval.tick().await;

        let today = Utc::now().date_naive();
        let current = month_of(today);
        if current == last_seen {
            continue;
        }
        last_seen = current;

        tracing::info!(year = current.0, month = current.1, "month rolled over, sending reports");
        if let Err(e) = send_monthly_reports(&pool, &notifier, today).await {
            tracing::error!(error = %e, "monthly report run failed");
        }
    }
}

/// Send the previous month's activity report to every non-admin user.
pub async fn send_monthly_reports(
    pool: &PgPool,
    notifier: &Notifier,
    today: NaiveDate,
) -> Result<()> {
    let (start, end) = previous_month_bounds(today);
    let start_ts = start.and_time(NaiveTime::MIN).and_utc();
    let end_ts = end.and_time(NaiveTime::MIN).and_utc();

    let users = UserQueries::list_non_admin(pool).await?;
    for user in users {
        let rows: Vec<ReportRow> = sqlx::query_as(
            "SELECT r.booked_at, r.parking_cost, l.city \
             FROM reservations r \
             LEFT JOIN parking_spots s ON s.id = r.spot_id \
             LEFT JOIN parking_lots l ON l.id = s.lot_id \
             WHERE r.user_id = $1 AND r.booked_at >= $2 AND r.booked_at < $3",
        )
        .bind(user.id)
        .bind(start_ts)
        .bind(end_ts)
        .fetch_all(pool)
        .await?;

        let subject = format!("Your parking report for {}", start.format("%B %Y"));
        let body = render_report(&user.name, start, &rows);
        notifier.send_email(&user.email, &subject, &body).await;
    }

    Ok(())
}

/// Half-open [first day of previous month, first day of current month).
pub fn previous_month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let month_start = today - Days::new(today.day0() as u64);
    let prev_end = month_start - Days::new(1);
    let prev_start = prev_end - Days::new(prev_end.day0() as u64);
    (prev_start, month_start)
}

pub fn render_report(user_name: &str, period_start: NaiveDate, rows: &[ReportRow]) -> String {
    let total = rows.len();
    let spent: f64 = rows.iter().filter_map(|r| r.parking_cost).sum();

    let mut by_city: HashMap<&str, usize> = HashMap::new();
    for r in rows {
        if let Some(city) = &r.city {
            *by_city.entry(city.as_str()).or_insert(0) += 1;
        }
    }
    // Ties break toward the lexicographically smaller city name.
    let favourite = by_city
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(city, _)| city);

    let mut body = format!(
        "Hi {user_name},\n\nHere is your parking summary for {}:\n\n\
         Reservations made: {total}\n\
         Total spent: {:.2}\n",
        period_start.format("%B %Y"),
        (spent * 100.0).round() / 100.0,
    );
    if let Some(city) = favourite {
        body.push_str(&format!("Most visited city: {city}\n"));
    }
    body.push_str("\nThanks for parking with us.\n");
    body
}

fn month_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn bounds_cover_the_whole_previous_month() {
        assert_eq!(previous_month_bounds(d(2025, 7, 1)), (d(2025, 6, 1), d(2025, 7, 1)));
        assert_eq!(previous_month_bounds(d(2025, 7, 15)), (d(2025, 6, 1), d(2025, 7, 1)));
        assert_eq!(previous_month_bounds(d(2025, 3, 3)), (d(2025, 2, 1), d(2025, 3, 1)));
    }

    #[test]
    fn bounds_cross_the_year_boundary() {
        assert_eq!(previous_month_bounds(d(2025, 1, 10)), (d(2024, 12, 1), d(2025, 1, 1)));
    }

    #[test]
    fn report_sums_spend_and_picks_top_city() {
        let booked = Utc.with_ymd_and_hms(2025, 6, 5, 9, 0, 0).unwrap();
        let rows = vec![
            ReportRow { booked_at: booked, parking_cost: Some(7.5), city: Some("Pune".into()) },
            ReportRow { booked_at: booked, parking_cost: Some(2.5), city: Some("Pune".into()) },
            ReportRow { booked_at: booked, parking_cost: None, city: Some("Mumbai".into()) },
        ];

        let body = render_report("Asha", d(2025, 6, 1), &rows);
        assert!(body.contains("June 2025"));
        assert!(body.contains("Reservations made: 3"));
        assert!(body.contains("Total spent: 10.00"));
        assert!(body.contains("Most visited city: Pune"));
    }

    #[test]
    fn empty_month_still_renders() {
        let body = render_report("Asha", d(2025, 6, 1), &[]);
        assert!(body.contains("Reservations made: 0"));
        assert!(body.contains("Total spent: 0.00"));
        assert!(!body.contains("Most visited city"));
    }
}
