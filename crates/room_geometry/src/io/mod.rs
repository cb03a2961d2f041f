pub mod geojson;

pub use self::geojson::RoomLayout;
