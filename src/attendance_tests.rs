// src/attendance_tests.rs

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::attendance::{
        history_view, summarize_day, today_view, week_start, week_view, working_hours,
        AttendanceService, DayStatus,
    };
    use crate::error::HrError;
    use crate::models::{AttendanceAction::*, Role};
    use crate::test_support::{at, client_as, clock, log, TEST_TOKEN};

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    // --- Aggregation ---

    #[test]
    fn check_in_only_is_incomplete() {
        let logs = vec![log(CheckIn, "2024-05-02T09:00:00")];
        let day = summarize_day(&logs, d("2024-05-02"));
        assert_eq!(day.status, DayStatus::Incomplete);
        assert_eq!(day.working_hours, dec!(0));
        assert!(day.check_out.is_none());
    }

    #[test]
    fn full_day_is_present_with_hours() {
        let logs = vec![
            log(CheckIn, "2024-05-02T09:00:00"),
            log(CheckOut, "2024-05-02T17:00:00"),
        ];
        let day = summarize_day(&logs, d("2024-05-02"));
        assert_eq!(day.status, DayStatus::Present);
        assert_eq!(day.working_hours, dec!(8.00));
    }

    #[test]
    fn no_logs_is_absent() {
        let day = summarize_day(&[], d("2024-05-02"));
        assert_eq!(day.status, DayStatus::Absent);
        assert_eq!(day.working_hours, dec!(0));
    }

    #[test]
    fn check_out_alone_is_absent() {
        let logs = vec![log(CheckOut, "2024-05-02T17:00:00")];
        let day = summarize_day(&logs, d("2024-05-02"));
        assert_eq!(day.status, DayStatus::Absent);
        assert_eq!(day.working_hours, dec!(0));
    }

    #[test]
    fn unsorted_logs_use_earliest_in_and_latest_out() {
        let logs = vec![
            log(CheckOut, "2024-05-02T17:30:00"),
            log(CheckIn, "2024-05-02T13:00:00"),
            log(CheckOut, "2024-05-02T12:00:00"),
            log(CheckIn, "2024-05-02T08:30:00"),
        ];
        let day = summarize_day(&logs, d("2024-05-02"));
        assert_eq!(day.check_in, Some(at("2024-05-02T08:30:00")));
        assert_eq!(day.check_out, Some(at("2024-05-02T17:30:00")));
        assert_eq!(day.working_hours, dec!(9.00));
    }

    #[test]
    fn hours_round_to_two_places() {
        // 7h 20m = 7.333.. h
        assert_eq!(
            working_hours(at("2024-05-02T09:00:00"), at("2024-05-02T16:20:00")),
            dec!(7.33)
        );
        // 45s = 0.0125 h, midpoint rounds away from zero
        assert_eq!(
            working_hours(at("2024-05-02T09:00:00"), at("2024-05-02T09:00:45")),
            dec!(0.01)
        );
        // 54s = 0.015 h
        assert_eq!(
            working_hours(at("2024-05-02T09:00:00"), at("2024-05-02T09:00:54")),
            dec!(0.02)
        );
    }

    #[test]
    fn check_out_before_check_in_counts_zero() {
        assert_eq!(
            working_hours(at("2024-05-02T17:00:00"), at("2024-05-02T09:00:00")),
            dec!(0)
        );
    }

    #[test]
    fn days_are_grouped_by_utc_date() {
        let logs = vec![
            log(CheckIn, "2024-05-02T23:30:00"),
            log(CheckOut, "2024-05-03T00:30:00"),
        ];
        assert_eq!(summarize_day(&logs, d("2024-05-02")).status, DayStatus::Incomplete);
        assert_eq!(summarize_day(&logs, d("2024-05-03")).status, DayStatus::Absent);
    }

    #[test]
    fn today_view_uses_given_date() {
        let logs = vec![
            log(CheckIn, "2024-05-01T09:00:00"),
            log(CheckOut, "2024-05-01T17:00:00"),
            log(CheckIn, "2024-05-02T09:15:00"),
        ];
        let today = today_view(&logs, d("2024-05-02"));
        assert_eq!(today.date, d("2024-05-02"));
        assert_eq!(today.status, DayStatus::Incomplete);
    }

    #[test]
    fn week_runs_sunday_to_saturday() {
        // 2024-05-02 is a Thursday
        assert_eq!(week_start(d("2024-05-02")), d("2024-04-28"));
        assert_eq!(week_start(d("2024-04-28")), d("2024-04-28"));
        assert_eq!(week_start(d("2024-05-04")), d("2024-04-28"));

        let logs = vec![
            log(CheckIn, "2024-04-29T09:00:00"),
            log(CheckOut, "2024-04-29T17:00:00"),
            log(CheckIn, "2024-04-30T09:00:00"),
            log(CheckOut, "2024-04-30T13:30:00"),
            log(CheckIn, "2024-05-02T09:00:00"),
            // previous week, must not count
            log(CheckIn, "2024-04-27T09:00:00"),
            log(CheckOut, "2024-04-27T17:00:00"),
        ];
        let week = week_view(&logs, d("2024-05-02"));

        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].date, d("2024-04-28"));
        assert_eq!(week.days[6].date, d("2024-05-04"));
        assert_eq!(week.days[0].status, DayStatus::Absent);
        assert_eq!(week.days[1].status, DayStatus::Present);
        assert_eq!(week.days[4].status, DayStatus::Incomplete);
        assert_eq!(week.total_hours, dec!(12.50));
        assert_eq!(week.present_days, 2);
    }

    #[test]
    fn history_keeps_latest_days_newest_first() {
        let mut logs = Vec::new();
        for day in 1..=12 {
            logs.push(log(CheckIn, &format!("2024-05-{:02}T09:00:00", day)));
            logs.push(log(CheckOut, &format!("2024-05-{:02}T17:00:00", day)));
        }
        let history = history_view(&logs, 10);
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].date, d("2024-05-12"));
        assert_eq!(history[9].date, d("2024-05-03"));
        assert!(history.iter().all(|h| h.status == DayStatus::Present));
    }

    // --- Service ---

    fn status_body(checked_in: bool, checked_out: bool) -> serde_json::Value {
        json!({
            "checked_in": checked_in,
            "checked_out": checked_out,
            "check_in_time": if checked_in { json!("2024-05-02T09:00:00") } else { json!(null) },
            "check_out_time": null,
        })
    }

    #[tokio::test]
    async fn check_in_posts_then_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/attendance/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(false, false)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/attendance/log"))
            .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .and(body_json(json!({"action": "check_in", "location": "Office"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Check in recorded"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/attendance/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(true, false)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/attendance/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"log_id": "l1", "user_id": "u-employee", "action": "check_in",
                 "timestamp": "2024-05-02T09:00:00", "location": "Office", "date": "2024-05-02"}
            ])))
            .mount(&server)
            .await;

        let service = AttendanceService::new(
            client_as(&server, Role::Employee),
            clock("2024-05-02 09:00:00"),
        );
        let snapshot = service.check_in(Some("Office".into())).await.unwrap();

        assert!(snapshot.status.checked_in);
        assert_eq!(snapshot.logs.len(), 1);
        assert_eq!(service.today().await.unwrap().status, DayStatus::Incomplete);
    }

    #[tokio::test]
    async fn check_in_twice_is_refused_without_posting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/attendance/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(true, false)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/attendance/log"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let service = AttendanceService::new(
            client_as(&server, Role::Employee),
            clock("2024-05-02 10:00:00"),
        );
        let err = service.check_in(None).await.unwrap_err();
        assert!(matches!(err, HrError::Validation { ref message, .. } if message == "Already checked in today"));
    }

    #[tokio::test]
    async fn check_out_requires_check_in_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/attendance/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(false, false)))
            .mount(&server)
            .await;

        let service = AttendanceService::new(
            client_as(&server, Role::Employee),
            clock("2024-05-02 10:00:00"),
        );
        let err = service.check_out(None).await.unwrap_err();
        assert_eq!(err.user_message("Failed to check out"), "Please check in first");
    }

    #[tokio::test]
    async fn check_out_twice_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/attendance/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body(true, true)))
            .mount(&server)
            .await;

        let service = AttendanceService::new(
            client_as(&server, Role::Employee),
            clock("2024-05-02 18:00:00"),
        );
        let err = service.check_out(None).await.unwrap_err();
        assert_eq!(err.user_message("Failed to check out"), "Already checked out today");
    }
}
