//! Conversion logic between DTOs and domain entities.
//!
//! Domain → DTO は常に成功する。DTO → Domain は境界バリデーション
//! （座標レンジ・空ラベル）を伴うため `TryFrom` になる。

use crate::domain::{Coordinate, Place, RideRequest, ValueError};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<Coordinate> for dto::CoordinateDto {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            lat: coordinate.latitude(),
            lng: coordinate.longitude(),
        }
    }
}

impl From<&Place> for dto::PlaceDto {
    fn from(place: &Place) -> Self {
        Self {
            address: place.address().to_string(),
            lat: place.coordinate().latitude(),
            lng: place.coordinate().longitude(),
        }
    }
}

impl From<&RideRequest> for dto::RideRequestDto {
    fn from(ride: &RideRequest) -> Self {
        Self {
            ride_id: ride.id.as_str().to_string(),
            user_id: ride.user_id.as_str().to_string(),
            user_name: ride.user_name.clone(),
            user_phone: ride.user_phone.clone(),
            pickup_location: dto::PlaceDto::from(&ride.pickup),
            drop_location: dto::PlaceDto::from(&ride.drop),
            distance: ride.distance_km,
            fare: ride.fare,
            status: ride.status.as_str().to_string(),
            driver_id: ride.driver_id.as_ref().map(|id| id.as_str().to_string()),
            created_at: ride.created_at.value(),
            accepted_at: ride.accepted_at.map(|t| t.value()),
            completed_at: ride.completed_at.map(|t| t.value()),
            cancelled_at: ride.cancelled_at.map(|t| t.value()),
            cancellation_reason: ride.cancellation_reason.clone(),
        }
    }
}

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<dto::CoordinateDto> for Coordinate {
    type Error = ValueError;

    fn try_from(dto: dto::CoordinateDto) -> Result<Self, Self::Error> {
        Coordinate::new(dto.lat, dto.lng)
    }
}

impl TryFrom<dto::PlaceDto> for Place {
    type Error = ValueError;

    fn try_from(dto: dto::PlaceDto) -> Result<Self, Self::Error> {
        let coordinate = Coordinate::new(dto.lat, dto.lng)?;
        Place::new(dto.address, coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PartyId, RideId, RideStatus, Timestamp};

    #[test]
    fn test_ride_request_to_dto_pending() {
        // テスト項目: PENDING のリクエストが DTO に正しく変換される
        // given (前提条件):
        let ride = RideRequest::new(
            RideId::from_string("r-1".to_string()),
            PartyId::new("user-1".to_string()).unwrap(),
            "Alice".to_string(),
            "080-0000-0001".to_string(),
            Place::new("Booth 1".to_string(), Coordinate::new(35.0, 135.0).unwrap()).unwrap(),
            Place::new(
                "123 Main St".to_string(),
                Coordinate::new(35.1, 135.1).unwrap(),
            )
            .unwrap(),
            4.2,
            50.0,
            Timestamp::new(1_700_000_000_000),
        );

        // when (操作):
        let dto = dto::RideRequestDto::from(&ride);

        // then (期待する結果):
        assert_eq!(dto.ride_id, "r-1");
        assert_eq!(dto.user_id, "user-1");
        assert_eq!(dto.status, "pending");
        assert_eq!(dto.driver_id, None);
        assert_eq!(dto.accepted_at, None);
        assert_eq!(dto.pickup_location.address, "Booth 1");
        assert_eq!(dto.drop_location.lat, 35.1);
    }

    #[test]
    fn test_ride_request_to_dto_accepted_carries_driver() {
        // テスト項目: 受諾済みリクエストの DTO に driver_id と accepted_at が入る
        // given (前提条件):
        let mut ride = RideRequest::new(
            RideId::from_string("r-1".to_string()),
            PartyId::new("user-1".to_string()).unwrap(),
            "Alice".to_string(),
            "080-0000-0001".to_string(),
            Place::new("Booth 1".to_string(), Coordinate::new(35.0, 135.0).unwrap()).unwrap(),
            Place::new(
                "123 Main St".to_string(),
                Coordinate::new(35.1, 135.1).unwrap(),
            )
            .unwrap(),
            4.2,
            50.0,
            Timestamp::new(1_700_000_000_000),
        );
        ride.accept(
            PartyId::new("driver-1".to_string()).unwrap(),
            Timestamp::new(1_700_000_001_000),
        )
        .unwrap();
        assert_eq!(ride.status, RideStatus::Accepted);

        // when (操作):
        let dto = dto::RideRequestDto::from(&ride);

        // then (期待する結果):
        assert_eq!(dto.status, "accepted");
        assert_eq!(dto.driver_id, Some("driver-1".to_string()));
        assert_eq!(dto.accepted_at, Some(1_700_000_001_000));
    }

    #[test]
    fn test_place_dto_to_domain_validates_coordinate() {
        // テスト項目: 範囲外座標の PlaceDto がドメインに変換できない
        // given (前提条件):
        let dto = dto::PlaceDto {
            address: "Booth 1".to_string(),
            lat: 95.0,
            lng: 135.0,
        };

        // when (操作):
        let result = Place::try_from(dto);

        // then (期待する結果):
        assert_eq!(result, Err(ValueError::LatitudeOutOfRange(95.0)));
    }

    #[test]
    fn test_coordinate_dto_round_trip() {
        // テスト項目: 有効な座標が DTO 経由で往復できる
        // given (前提条件):
        let coordinate = Coordinate::new(35.6812, 139.7671).unwrap();

        // when (操作):
        let dto = dto::CoordinateDto::from(coordinate);
        let back = Coordinate::try_from(dto).unwrap();

        // then (期待する結果):
        assert_eq!(back, coordinate);
    }
}
