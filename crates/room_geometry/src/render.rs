//! Overlay rendering for detected rooms.
//!
//! The conversion itself only produces geometry; this module is the
//! downstream consumer that turns a room list into a PNG preview.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::{
    error::Result,
    types::{Canvas, Room},
};

/// Colour palette cycled through room by room
pub const PALETTE: [[u8; 3]; 10] = [
    [0, 0, 255],
    [0, 255, 0],
    [255, 0, 0],
    [0, 255, 255],
    [255, 0, 255],
    [255, 255, 0],
    [255, 0, 128],
    [0, 128, 255],
    [128, 255, 0],
    [0, 255, 128],
];

#[derive(Debug, Clone)]
pub struct RoomRenderer {
    pub background: [u8; 3],
    /// Draw each room's bounding box in addition to its outline
    pub draw_bounding_boxes: bool,
    pub centroid_radius: i32,
}

impl Default for RoomRenderer {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
            draw_bounding_boxes: true,
            centroid_radius: 4,
        }
    }
}

impl RoomRenderer {
    /// Draw room outlines, bounding boxes and centroids on a blank canvas
    pub fn render(&self, rooms: &[Room], canvas: Canvas) -> RgbImage {
        let mut image = RgbImage::from_pixel(canvas.width, canvas.height, Rgb(self.background));

        for (index, room) in rooms.iter().enumerate() {
            let color = Rgb(PALETTE[index % PALETTE.len()]);
            let vertices = &room.polygon_vertices;

            // Box first: for rectangular rooms it coincides with the outline
            if self.draw_bounding_boxes {
                let bbox = &room.bounding_box;
                let width = bbox.width().round().max(1.0) as u32;
                let height = bbox.height().round().max(1.0) as u32;
                let rect = Rect::at(bbox.x_min.round() as i32, bbox.y_min.round() as i32).of_size(width, height);
                draw_hollow_rect_mut(&mut image, rect, lighten(color));
            }

            for (i, &[x0, y0]) in vertices.iter().enumerate() {
                let [x1, y1] = vertices[(i + 1) % vertices.len()];
                draw_line_segment_mut(&mut image, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), color);
            }

            let [cx, cy] = room.centroid;
            draw_filled_circle_mut(
                &mut image,
                (cx.round() as i32, cy.round() as i32),
                self.centroid_radius,
                color,
            );
        }

        image
    }

    /// Render and encode as PNG
    pub fn render_png(&self, rooms: &[Room], canvas: Canvas) -> Result<Vec<u8>> {
        let image = self.render(rooms, canvas);
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Render, encode as PNG and base64 the result
    pub fn render_base64(&self, rooms: &[Room], canvas: Canvas) -> Result<String> {
        Ok(STANDARD.encode(self.render_png(rooms, canvas)?))
    }
}

fn lighten(Rgb([r, g, b]): Rgb<u8>) -> Rgb<u8> {
    let blend = |c: u8| ((u16::from(c) + 255) / 2) as u8;
    Rgb([blend(r), blend(g), blend(b)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, ShapeType};

    fn square_room() -> Room {
        Room {
            id: "room_001".to_string(),
            polygon_vertices: vec![[10.0, 10.0], [40.0, 10.0], [40.0, 40.0], [10.0, 40.0]],
            bounding_box: BoundingBox {
                x_min: 10.0,
                y_min: 10.0,
                x_max: 40.0,
                y_max: 40.0,
            },
            area_pixels: 900.0,
            centroid: [25.0, 25.0],
            confidence: 0.9,
            shape_type: ShapeType::Rectangle,
            num_vertices: 4,
        }
    }

    #[test]
    fn test_render_draws_outline_and_centroid() {
        let image = RoomRenderer::default().render(&[square_room()], Canvas::new(50, 50));
        assert_eq!(image.dimensions(), (50, 50));
        assert_eq!(image.get_pixel(25, 10), &Rgb(PALETTE[0]));
        assert_eq!(image.get_pixel(25, 25), &Rgb(PALETTE[0]));
        assert_eq!(image.get_pixel(2, 2), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_bounding_box_shows_around_non_rectangular_room() {
        let mut room = square_room();
        // Triangle inside the same box: the box's bottom-left corner is left uncovered
        room.polygon_vertices = vec![[10.0, 10.0], [40.0, 10.0], [40.0, 40.0]];
        room.num_vertices = 3;
        room.centroid = [30.0, 20.0];
        let image = RoomRenderer::default().render(&[room], Canvas::new(50, 50));
        assert_eq!(image.get_pixel(10, 39), &lighten(Rgb(PALETTE[0])));
        assert_eq!(image.get_pixel(40, 25), &Rgb(PALETTE[0]));
    }

    #[test]
    fn test_png_round_trips_through_decoder() {
        let bytes = RoomRenderer::default()
            .render_png(&[square_room()], Canvas::new(50, 50))
            .expect("Should encode");
        let decoded = image::load_from_memory(&bytes).expect("Should decode");
        assert_eq!(decoded.width(), 50);
        assert_eq!(decoded.height(), 50);
    }
}
