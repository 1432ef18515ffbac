//! Command line grammar for the interactive prompt.
//!
//! Each input line is parsed into a [`Command`], gated by the connection
//! role, and then turned into a wire message. Parsing is pure so the
//! grammar can be tested without a socket.
//!
//! User commands:
//! - `request <pickup> <lat> <lng> <drop> <lat> <lng> <distanceKm> <fare>`
//! - `cancel <rideId> [reason...]`
//!
//! Driver commands:
//! - `accept <rideId>`
//! - `loc <lat> <lng> [rideId]`
//! - `complete <rideId>`
//! - `cancel <rideId> [reason...]`
//! - `online [<lat> <lng>]` / `offline`

use thiserror::Error;

use noriba_server::infrastructure::dto::websocket::{ClientMessage, CoordinateDto, PlaceDto};

use crate::domain::{Profile, Role};

/// Parsed prompt command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Request {
        pickup: PlaceDto,
        drop: PlaceDto,
        distance: f64,
        fare: f64,
    },
    Accept {
        ride_id: String,
    },
    Location {
        location: CoordinateDto,
        ride_id: Option<String>,
    },
    Complete {
        ride_id: String,
    },
    Cancel {
        ride_id: String,
        reason: Option<String>,
    },
    Online {
        location: Option<CoordinateDto>,
    },
    Offline,
    Help,
}

/// Command parse errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (type 'help' for usage)")]
    UnknownCommand(String),
    #[error("command '{0}' is not available for role '{1}'")]
    WrongRole(String, &'static str),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

fn parse_f64(token: &str) -> Result<f64, CommandError> {
    token
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidNumber(token.to_string()))
}

/// Parse one input line into a command, enforcing role gating
pub fn parse(role: Role, line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = tokens.split_first() else {
        return Err(CommandError::UnknownCommand(String::new()));
    };

    match verb {
        "help" => Ok(Command::Help),
        "request" => {
            if role != Role::User {
                return Err(CommandError::WrongRole("request".to_string(), "driver"));
            }
            let [pickup_address, pickup_lat, pickup_lng, drop_address, drop_lat, drop_lng, distance, fare] =
                args
            else {
                return Err(CommandError::Usage(
                    "request <pickup> <lat> <lng> <drop> <lat> <lng> <distanceKm> <fare>",
                ));
            };
            Ok(Command::Request {
                pickup: PlaceDto {
                    address: pickup_address.to_string(),
                    lat: parse_f64(pickup_lat)?,
                    lng: parse_f64(pickup_lng)?,
                },
                drop: PlaceDto {
                    address: drop_address.to_string(),
                    lat: parse_f64(drop_lat)?,
                    lng: parse_f64(drop_lng)?,
                },
                distance: parse_f64(distance)?,
                fare: parse_f64(fare)?,
            })
        }
        "accept" => {
            if role != Role::Driver {
                return Err(CommandError::WrongRole("accept".to_string(), "user"));
            }
            let [ride_id] = args else {
                return Err(CommandError::Usage("accept <rideId>"));
            };
            Ok(Command::Accept {
                ride_id: ride_id.to_string(),
            })
        }
        "loc" => {
            if role != Role::Driver {
                return Err(CommandError::WrongRole("loc".to_string(), "user"));
            }
            match args {
                [lat, lng] => Ok(Command::Location {
                    location: CoordinateDto {
                        lat: parse_f64(lat)?,
                        lng: parse_f64(lng)?,
                    },
                    ride_id: None,
                }),
                [lat, lng, ride_id] => Ok(Command::Location {
                    location: CoordinateDto {
                        lat: parse_f64(lat)?,
                        lng: parse_f64(lng)?,
                    },
                    ride_id: Some(ride_id.to_string()),
                }),
                _ => Err(CommandError::Usage("loc <lat> <lng> [rideId]")),
            }
        }
        "complete" => {
            if role != Role::Driver {
                return Err(CommandError::WrongRole("complete".to_string(), "user"));
            }
            let [ride_id] = args else {
                return Err(CommandError::Usage("complete <rideId>"));
            };
            Ok(Command::Complete {
                ride_id: ride_id.to_string(),
            })
        }
        "cancel" => {
            let Some((&ride_id, reason_tokens)) = args.split_first() else {
                return Err(CommandError::Usage("cancel <rideId> [reason...]"));
            };
            let reason = if reason_tokens.is_empty() {
                None
            } else {
                Some(reason_tokens.join(" "))
            };
            Ok(Command::Cancel {
                ride_id: ride_id.to_string(),
                reason,
            })
        }
        "online" => {
            if role != Role::Driver {
                return Err(CommandError::WrongRole("online".to_string(), "user"));
            }
            match args {
                [] => Ok(Command::Online { location: None }),
                [lat, lng] => Ok(Command::Online {
                    location: Some(CoordinateDto {
                        lat: parse_f64(lat)?,
                        lng: parse_f64(lng)?,
                    }),
                }),
                _ => Err(CommandError::Usage("online [<lat> <lng>]")),
            }
        }
        "offline" => {
            if role != Role::Driver {
                return Err(CommandError::WrongRole("offline".to_string(), "user"));
            }
            Ok(Command::Offline)
        }
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Turn a parsed command into its wire message
///
/// `Help` has no wire form and returns `None`.
pub fn into_message(command: Command, profile: &Profile) -> Option<ClientMessage> {
    match command {
        Command::Request {
            pickup,
            drop,
            distance,
            fare,
        } => Some(ClientMessage::UserRideRequest {
            user_name: profile.name.clone(),
            user_phone: profile.phone.clone(),
            pickup_location: pickup,
            drop_location: drop,
            distance,
            fare,
        }),
        Command::Accept { ride_id } => Some(ClientMessage::DriverAcceptRide {
            ride_id,
            driver_name: profile.name.clone(),
            driver_phone: profile.phone.clone(),
            driver_rating: None,
            vehicle_make: None,
            vehicle_model: None,
            license_plate: None,
        }),
        Command::Location { location, ride_id } => {
            Some(ClientMessage::UpdateDriverLocation { ride_id, location })
        }
        Command::Complete { ride_id } => Some(ClientMessage::UpdateRideStatus {
            ride_id,
            status: "completed".to_string(),
            reason: None,
        }),
        Command::Cancel { ride_id, reason } => Some(ClientMessage::UpdateRideStatus {
            ride_id,
            status: "cancelled".to_string(),
            reason,
        }),
        Command::Online { location } => Some(ClientMessage::UpdateDriverStatus {
            is_online: true,
            location,
        }),
        Command::Offline => Some(ClientMessage::UpdateDriverStatus {
            is_online: false,
            location: None,
        }),
        Command::Help => None,
    }
}

/// Usage text for the `help` command
pub fn usage(role: Role) -> &'static str {
    match role {
        Role::User => {
            "Commands:\n\
             \x20 request <pickup> <lat> <lng> <drop> <lat> <lng> <distanceKm> <fare>\n\
             \x20 cancel <rideId> [reason...]\n\
             \x20 help"
        }
        Role::Driver => {
            "Commands:\n\
             \x20 accept <rideId>\n\
             \x20 loc <lat> <lng> [rideId]\n\
             \x20 complete <rideId>\n\
             \x20 cancel <rideId> [reason...]\n\
             \x20 online [<lat> <lng>] / offline\n\
             \x20 help"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            name: "Alice".to_string(),
            phone: "080-0000-0001".to_string(),
        }
    }

    #[test]
    fn test_parse_request_command() {
        // テスト項目: request コマンドが座標つきでパースできる
        // given (前提条件):
        let line = "request booth-1 35.0 135.0 main-st 35.1 135.1 4.2 50";

        // when (操作):
        let result = parse(Role::User, line).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            Command::Request {
                pickup: PlaceDto {
                    address: "booth-1".to_string(),
                    lat: 35.0,
                    lng: 135.0,
                },
                drop: PlaceDto {
                    address: "main-st".to_string(),
                    lat: 35.1,
                    lng: 135.1,
                },
                distance: 4.2,
                fare: 50.0,
            }
        );
    }

    #[test]
    fn test_parse_request_rejected_for_driver() {
        // テスト項目: ドライバーは request コマンドを使えない
        // given (前提条件):
        let line = "request booth-1 35.0 135.0 main-st 35.1 135.1 4.2 50";

        // when (操作):
        let result = parse(Role::Driver, line);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(CommandError::WrongRole("request".to_string(), "driver"))
        );
    }

    #[test]
    fn test_parse_accept_command() {
        // テスト項目: accept コマンドがパースできる
        // given (前提条件):
        let line = "accept ride-42";

        // when (操作):
        let result = parse(Role::Driver, line).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            Command::Accept {
                ride_id: "ride-42".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_loc_command_with_ride_id() {
        // テスト項目: loc コマンドが配車スコープつきでパースできる
        // given (前提条件):
        let line = "loc 35.05 135.05 ride-42";

        // when (操作):
        let result = parse(Role::Driver, line).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            Command::Location {
                location: CoordinateDto {
                    lat: 35.05,
                    lng: 135.05,
                },
                ride_id: Some("ride-42".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_cancel_with_multi_word_reason() {
        // テスト項目: cancel コマンドの理由が複数語でもパースできる
        // given (前提条件):
        let line = "cancel ride-42 plans changed today";

        // when (操作):
        let result = parse(Role::User, line).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            Command::Cancel {
                ride_id: "ride-42".to_string(),
                reason: Some("plans changed today".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        // テスト項目: 未知のコマンドが拒否される
        // given (前提条件):
        let line = "teleport ride-42";

        // when (操作):
        let result = parse(Role::User, line);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(CommandError::UnknownCommand("teleport".to_string()))
        );
    }

    #[test]
    fn test_parse_invalid_number() {
        // テスト項目: 数値でない座標が拒否される
        // given (前提条件):
        let line = "loc north 135.0";

        // when (操作):
        let result = parse(Role::Driver, line);

        // then (期待する結果):
        assert_eq!(result, Err(CommandError::InvalidNumber("north".to_string())));
    }

    #[test]
    fn test_into_message_for_request_carries_profile() {
        // テスト項目: request の wire メッセージにプロフィールが載る
        // given (前提条件):
        let command = parse(
            Role::User,
            "request booth-1 35.0 135.0 main-st 35.1 135.1 4.2 50",
        )
        .unwrap();

        // when (操作):
        let message = into_message(command, &profile()).unwrap();

        // then (期待する結果):
        match message {
            ClientMessage::UserRideRequest {
                user_name,
                user_phone,
                ..
            } => {
                assert_eq!(user_name, "Alice");
                assert_eq!(user_phone, "080-0000-0001");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_into_message_for_complete_is_status_update() {
        // テスト項目: complete が completed への status 更新になる
        // given (前提条件):
        let command = parse(Role::Driver, "complete ride-42").unwrap();

        // when (操作):
        let message = into_message(command, &profile()).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            ClientMessage::UpdateRideStatus {
                ride_id: "ride-42".to_string(),
                status: "completed".to_string(),
                reason: None,
            }
        );
    }

    #[test]
    fn test_into_message_for_help_is_none() {
        // テスト項目: help は wire メッセージを生成しない
        // given (前提条件):
        let command = parse(Role::User, "help").unwrap();

        // when (操作):
        let message = into_message(command, &profile());

        // then (期待する結果):
        assert!(message.is_none());
    }
}
