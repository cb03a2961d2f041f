use tracing::debug;

use crate::types::Room;

/// Drop rooms smaller than `min_room_area`, returning how many were dropped.
///
/// Filtering never fails: an empty result is a valid outcome.
pub fn filter_by_min_area(rooms: &mut Vec<Room>, min_room_area: f64) -> usize {
    let before = rooms.len();
    rooms.retain(|room| room.area_pixels >= min_room_area);
    let dropped = before - rooms.len();
    if dropped > 0 {
        debug!(dropped, min_room_area, "Filtered small rooms");
    }
    dropped
}
