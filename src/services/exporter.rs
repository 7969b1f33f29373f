use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::queries::ReservationQueries;
use crate::errors::Result;
use crate::models::Reservation;

const CSV_HEADER: &str =
    "reservation_id,user_id,spot_id,vehicle_number,booked_at,parking_timestamp,leaving_timestamp,parking_cost";

/// Writes a user's full reservation history as a CSV file under the
/// configured export directory.
pub struct CsvExporter;

impl CsvExporter {
    /// Export every reservation of `user_id` and return the file name of
    /// the written CSV (relative to `export_dir`).
    pub async fn export_for_user(
        pool: &PgPool,
        export_dir: &str,
        user_id: i64,
    ) -> Result<String> {
        let reservations = ReservationQueries::list_by_user(pool, user_id).await?;
        let body = render_csv(&reservations);

        let filename = format!(
            "reservations_{user_id}_{}.csv",
            Utc::now().format("%Y%m%d%H%M%S")
        );
        tokio::fs::create_dir_all(export_dir).await?;
        tokio::fs::write(Path::new(export_dir).join(&filename), body).await?;

        tracing::info!(user_id, filename, "reservation export written");
        Ok(filename)
    }
}

pub fn render_csv(reservations: &[Reservation]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in reservations {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            r.id,
            r.user_id,
            r.spot_id,
            csv_field(r.vehicle_number.as_deref().unwrap_or("")),
            format_ts(Some(r.booked_at)),
            format_ts(r.parking_timestamp),
            format_ts(r.leaving_timestamp),
            r.parking_cost.map(|c| format!("{c:.2}")).unwrap_or_default(),
        ));
    }
    out
}

fn format_ts(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Quote a field when it contains a comma, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reservation(id: i64) -> Reservation {
        Reservation {
            id,
            spot_id: 3,
            user_id: 7,
            vehicle_number: Some("MH12AB1234".to_string()),
            booked_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            parking_timestamp: Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 15, 0).unwrap()),
            leaving_timestamp: Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()),
            parking_cost: Some(7.5),
        }
    }

    #[test]
    fn renders_header_and_rows() {
        let csv = render_csv(&[reservation(1)]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("1,7,3,MH12AB1234,2025-06-01 09:00:00,2025-06-01 09:15:00,2025-06-01 10:00:00,7.50")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn open_reservation_leaves_cells_empty() {
        let mut r = reservation(2);
        r.vehicle_number = None;
        r.parking_timestamp = None;
        r.leaving_timestamp = None;
        r.parking_cost = None;

        let csv = render_csv(&[r]);
        assert_eq!(
            csv.lines().nth(1),
            Some("2,7,3,,2025-06-01 09:00:00,,,")
        );
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

}
