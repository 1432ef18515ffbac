//! Message formatting utilities for client display.

use noriba_server::infrastructure::dto::websocket::{RideAcceptedMessage, RideRequestDto};
use noriba_shared::time::timestamp_to_rfc3339;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the connection greeting
    pub fn format_connection_success(party_id: &str, role: &str) -> String {
        format!("\nConnected as '{}' ({})\n", party_id, role)
    }

    /// Format a newly broadcast ride request (driver side)
    pub fn format_new_ride_request(request: &RideRequestDto) -> String {
        format!(
            "\n\n------------------------------------------------------------\n\
             New ride request {}\n\
             {} -> {}\n\
             {:.1} km, fare {:.0}, requested at {}\n\
             Type 'accept {}' to take it\n\
             ------------------------------------------------------------\n",
            request.ride_id,
            request.pickup_location.address,
            request.drop_location.address,
            request.distance,
            request.fare,
            timestamp_to_rfc3339(request.created_at),
            request.ride_id,
        )
    }

    /// Format the back-fill list of open requests (driver side)
    pub fn format_active_requests(requests: &[RideRequestDto]) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str("Open ride requests:\n");

        if requests.is_empty() {
            output.push_str("(No open requests)\n");
        } else {
            for request in requests {
                output.push_str(&format!(
                    "{} - {} -> {} ({:.1} km, fare {:.0})\n",
                    request.ride_id,
                    request.pickup_location.address,
                    request.drop_location.address,
                    request.distance,
                    request.fare,
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format the submission ack (user side)
    pub fn format_request_confirmed(
        success: bool,
        ride_id: Option<&str>,
        error: Option<&str>,
    ) -> String {
        if success {
            format!(
                "\nRide request {} created, waiting for a driver...\n",
                ride_id.unwrap_or("?")
            )
        } else {
            format!(
                "\nRide request failed: {}\n",
                error.unwrap_or("unknown error")
            )
        }
    }

    /// Format the match notification (user side)
    pub fn format_ride_accepted(msg: &RideAcceptedMessage) -> String {
        let mut output = format!(
            "\n\n------------------------------------------------------------\n\
             Driver {} accepted your ride {}\n\
             Phone: {}\n",
            msg.driver_name, msg.ride_id, msg.driver_phone,
        );
        if let (Some(make), Some(model)) = (&msg.vehicle_make, &msg.vehicle_model) {
            output.push_str(&format!("Vehicle: {} {}", make, model));
            if let Some(plate) = &msg.license_plate {
                output.push_str(&format!(" ({})", plate));
            }
            output.push('\n');
        }
        output.push_str(&format!(
            "accepted at {}\n\
             ------------------------------------------------------------\n",
            timestamp_to_rfc3339(msg.timestamp)
        ));
        output
    }

    /// Format the accept ack (winning driver side)
    pub fn format_accept_confirmed(ride_id: &str) -> String {
        format!("\nYou got ride {}. Head to the pickup point.\n", ride_id)
    }

    /// Format an accept rejection (losing driver side)
    pub fn format_accept_error(message: &str) -> String {
        format!("\nCould not accept: {}\n", message)
    }

    /// Format an offer withdrawal (driver side)
    pub fn format_request_closed(ride_id: &str) -> String {
        format!("\n- Ride request {} is no longer available\n", ride_id)
    }

    /// Format a live location update (user side)
    pub fn format_location_update(ride_id: &str, lat: f64, lng: f64, timestamp: i64) -> String {
        format!(
            "\nDriver location for {}: ({:.5}, {:.5}) at {}\n",
            ride_id,
            lat,
            lng,
            timestamp_to_rfc3339(timestamp)
        )
    }

    /// Format a completion notification
    pub fn format_ride_completed(ride_id: &str, timestamp: i64) -> String {
        format!(
            "\nRide {} completed at {}\n",
            ride_id,
            timestamp_to_rfc3339(timestamp)
        )
    }

    /// Format a cancellation notification
    pub fn format_ride_cancelled(ride_id: &str, reason: Option<&str>, timestamp: i64) -> String {
        match reason {
            Some(reason) => format!(
                "\nRide {} cancelled at {} ({})\n",
                ride_id,
                timestamp_to_rfc3339(timestamp),
                reason
            ),
            None => format!(
                "\nRide {} cancelled at {}\n",
                ride_id,
                timestamp_to_rfc3339(timestamp)
            ),
        }
    }

    /// Format a status update ack
    pub fn format_status_updated(success: bool) -> String {
        if success {
            "\nStatus updated\n".to_string()
        } else {
            "\nStatus update rejected\n".to_string()
        }
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noriba_server::infrastructure::dto::websocket::{MessageType, PlaceDto};

    fn sample_request() -> RideRequestDto {
        RideRequestDto {
            ride_id: "ride-42".to_string(),
            user_id: "user-1".to_string(),
            user_name: "Alice".to_string(),
            user_phone: "080-0000-0001".to_string(),
            pickup_location: PlaceDto {
                address: "booth-1".to_string(),
                lat: 35.0,
                lng: 135.0,
            },
            drop_location: PlaceDto {
                address: "main-st".to_string(),
                lat: 35.1,
                lng: 135.1,
            },
            distance: 4.2,
            fare: 50.0,
            status: "pending".to_string(),
            driver_id: None,
            created_at: 1672531200000,
            accepted_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    #[test]
    fn test_format_new_ride_request() {
        // テスト項目: 新規配車リクエストの通知が正しくフォーマットされる
        // given (前提条件):
        let request = sample_request();

        // when (操作):
        let result = MessageFormatter::format_new_ride_request(&request);

        // then (期待する結果):
        assert!(result.contains("ride-42"));
        assert!(result.contains("booth-1 -> main-st"));
        assert!(result.contains("accept ride-42"));
        assert!(result.contains("2023-01-01"));
    }

    #[test]
    fn test_format_active_requests_with_empty_list() {
        // テスト項目: オープンなリクエストが無い場合、適切なメッセージが表示される
        // given (前提条件):
        let requests = vec![];

        // when (操作):
        let result = MessageFormatter::format_active_requests(&requests);

        // then (期待する結果):
        assert!(result.contains("Open ride requests:"));
        assert!(result.contains("(No open requests)"));
    }

    #[test]
    fn test_format_active_requests_with_entries() {
        // テスト項目: オープンなリクエストが一覧表示される
        // given (前提条件):
        let requests = vec![sample_request()];

        // when (操作):
        let result = MessageFormatter::format_active_requests(&requests);

        // then (期待する結果):
        assert!(result.contains("ride-42 - booth-1 -> main-st"));
    }

    #[test]
    fn test_format_ride_accepted_with_vehicle() {
        // テスト項目: マッチング通知に車両情報が含まれる
        // given (前提条件):
        let msg = RideAcceptedMessage {
            r#type: MessageType::RideAccepted,
            ride_id: "ride-42".to_string(),
            driver_id: "driver-1".to_string(),
            driver_name: "Bob".to_string(),
            driver_phone: "080-0000-0002".to_string(),
            driver_rating: Some(4.8),
            vehicle_make: Some("Toyota".to_string()),
            vehicle_model: Some("Prius".to_string()),
            license_plate: Some("ABC-123".to_string()),
            timestamp: 1672531200000,
        };

        // when (操作):
        let result = MessageFormatter::format_ride_accepted(&msg);

        // then (期待する結果):
        assert!(result.contains("Driver Bob accepted your ride ride-42"));
        assert!(result.contains("Toyota Prius (ABC-123)"));
        assert!(result.contains("2023-01-01"));
    }

    #[test]
    fn test_format_request_confirmed_failure() {
        // テスト項目: 失敗した送信 ack がエラーを表示する
        // given (前提条件):

        // when (操作):
        let result =
            MessageFormatter::format_request_confirmed(false, None, Some("invalid location"));

        // then (期待する結果):
        assert!(result.contains("Ride request failed: invalid location"));
    }

    #[test]
    fn test_format_ride_cancelled_with_reason() {
        // テスト項目: 理由つきキャンセル通知が正しくフォーマットされる
        // given (前提条件):

        // when (操作):
        let result = MessageFormatter::format_ride_cancelled(
            "ride-42",
            Some("plans changed"),
            1672531200000,
        );

        // then (期待する結果):
        assert!(result.contains("ride-42"));
        assert!(result.contains("plans changed"));
        assert!(result.contains("2023-01-01"));
    }

    #[test]
    fn test_format_raw_message() {
        // テスト項目: 生メッセージが正しくフォーマットされる
        // given (前提条件):
        let text = "unknown message format";

        // when (操作):
        let result = MessageFormatter::format_raw_message(text);

        // then (期待する結果):
        assert!(result.contains("unknown message format"));
        assert!(result.contains("Received:"));
    }
}
