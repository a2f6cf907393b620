use crate::shapes::{Point, RoundedRect};
use ab_glyph::{FontArc, PxScale};
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{self, Blend};
use std::io::Cursor;
use tracing::{Level, span};

const ARC_SEGMENTS: usize = 6;

/// Drawing target the try-on output is composited onto.
pub trait Surface {
    fn dimensions(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn draw_image(&mut self, img: &RgbaImage);
    fn fill_rounded_rect(&mut self, shape: RoundedRect, color: Rgba<u8>);
    fn stroke_rounded_rect(&mut self, shape: RoundedRect, color: Rgba<u8>, width: f32);
    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba<u8>, width: f32);
    fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Rgba<u8>);
    fn pixels(&self) -> &RgbaImage;
}

/// Still image of a surface at capture time.
#[derive(Debug, Clone)]
pub struct Still {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl Still {
    pub fn capture(img: &RgbaImage) -> crate::Result<Still> {
        let span = span!(Level::DEBUG, "capture");
        let _guard = span.enter();

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Still {
            png,
            width: img.width(),
            height: img.height(),
        })
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// In-memory RGBA surface.
pub struct ImageCanvas {
    img: RgbaImage,
    font: Option<FontArc>,
}

impl ImageCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbaImage::new(width, height),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    fn blended<F: FnOnce(&mut Blend<RgbaImage>)>(&mut self, draw: F) {
        let mut blend = Blend(std::mem::take(&mut self.img));
        draw(&mut blend);
        self.img = blend.0;
    }

    fn fill_polygon(&mut self, points: &[Point], color: Rgba<u8>) {
        let poly = to_polygon(points);
        if poly.len() < 3 {
            return;
        }
        self.blended(|canvas| drawing::draw_polygon_mut(canvas, &poly, color));
    }
}

/// Integer polygon without repeated neighbours or a closing point, as imageproc expects.
fn to_polygon(points: &[Point]) -> Vec<imageproc::point::Point<i32>> {
    let mut poly: Vec<imageproc::point::Point<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let p = (*p).into();
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    poly
}

/// Quad covering a line of the given width.
fn thick_line(from: Point, to: Point, width: f32) -> Option<[Point; 4]> {
    let len = from.distance_to(&to);
    if len == 0. || !len.is_finite() {
        return None;
    }
    let half = width.max(1.) / 2.;
    let nx = -(to.y - from.y) / len * half;
    let ny = (to.x - from.x) / len * half;

    Some([
        Point::new(from.x + nx, from.y + ny),
        Point::new(to.x + nx, to.y + ny),
        Point::new(to.x - nx, to.y - ny),
        Point::new(from.x - nx, from.y - ny),
    ])
}

impl Surface for ImageCanvas {
    fn dimensions(&self) -> (u32, u32) {
        self.img.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.img.dimensions() != (width, height) {
            self.img = RgbaImage::new(width, height);
        }
    }

    fn clear(&mut self) {
        for p in self.img.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_image(&mut self, img: &RgbaImage) {
        image::imageops::replace(&mut self.img, img, 0, 0);
    }

    fn fill_rounded_rect(&mut self, shape: RoundedRect, color: Rgba<u8>) {
        self.fill_polygon(&shape.outline(ARC_SEGMENTS), color);
    }

    fn stroke_rounded_rect(&mut self, shape: RoundedRect, color: Rgba<u8>, width: f32) {
        let outline = shape.outline(ARC_SEGMENTS);
        for (i, from) in outline.iter().enumerate() {
            let to = outline[(i + 1) % outline.len()];
            self.stroke_line(*from, to, color, width);
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba<u8>, width: f32) {
        if let Some(quad) = thick_line(from, to, width) {
            self.fill_polygon(&quad, color);
        }
    }

    fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Rgba<u8>) {
        let Some(font) = self.font.clone() else {
            return;
        };
        let (x, y) = (at.x.round() as i32, at.y.round() as i32);
        self.blended(|canvas| {
            drawing::draw_text_mut(canvas, color, x, y, PxScale::from(size), &font, text)
        });
    }

    fn pixels(&self) -> &RgbaImage {
        &self.img
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shapes::Rect;

    /// Records draw calls instead of rasterizing them.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub calls: Vec<String>,
        img: RgbaImage,
    }

    impl Surface for Recorder {
        fn dimensions(&self) -> (u32, u32) {
            self.img.dimensions()
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.img = RgbaImage::new(width, height);
            self.calls.push(format!("resize {width}x{height}"));
        }
        fn clear(&mut self) {
            self.calls.push("clear".into());
        }
        fn draw_image(&mut self, img: &RgbaImage) {
            self.calls
                .push(format!("image {}x{}", img.width(), img.height()));
        }
        fn fill_rounded_rect(&mut self, _: RoundedRect, _: Rgba<u8>) {
            self.calls.push("fill_rounded_rect".into());
        }
        fn stroke_rounded_rect(&mut self, _: RoundedRect, _: Rgba<u8>, _: f32) {
            self.calls.push("stroke_rounded_rect".into());
        }
        fn stroke_line(&mut self, _: Point, _: Point, _: Rgba<u8>, _: f32) {
            self.calls.push("stroke_line".into());
        }
        fn fill_text(&mut self, text: &str, _: Point, _: f32, _: Rgba<u8>) {
            self.calls.push(format!("text {text}"));
        }
        fn pixels(&self) -> &RgbaImage {
            &self.img
        }
    }

    #[test]
    fn polygon_drops_duplicates_and_closing_point() {
        let poly = to_polygon(&[
            Point::new(0., 0.),
            Point::new(0.2, 0.1),
            Point::new(5., 0.),
            Point::new(5., 5.),
            Point::new(0., 0.),
        ]);
        assert_eq!(poly.len(), 3);
    }

    #[test]
    fn fill_rounded_rect_paints_inside_only() {
        let mut canvas = ImageCanvas::new(40, 40);
        let red = Rgba([255, 0, 0, 255]);
        canvas.fill_rounded_rect(
            RoundedRect::new(Rect::from_tl(10., 10., 20., 20.), 4.),
            red,
        );

        assert_eq!(*canvas.pixels().get_pixel(20, 20), red);
        assert_eq!(*canvas.pixels().get_pixel(2, 2), Rgba([0, 0, 0, 0]));
        // rounded corner stays clear
        assert_eq!(*canvas.pixels().get_pixel(10, 10), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn thick_line_covers_its_width() {
        let mut canvas = ImageCanvas::new(20, 20);
        let white = Rgba([255, 255, 255, 255]);
        canvas.stroke_line(Point::new(2., 10.), Point::new(18., 10.), white, 4.);

        assert_eq!(*canvas.pixels().get_pixel(10, 9), white);
        assert_eq!(*canvas.pixels().get_pixel(10, 11), white);
        assert_eq!(*canvas.pixels().get_pixel(10, 2), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn zero_length_line_draws_nothing() {
        let mut canvas = ImageCanvas::new(8, 8);
        let p = Point::new(4., 4.);
        canvas.stroke_line(p, p, Rgba([255, 255, 255, 255]), 3.);
        assert!(canvas.pixels().pixels().all(|px| px[3] == 0));
    }

    #[test]
    fn clear_resets_pixels() {
        let mut canvas = ImageCanvas::new(4, 4);
        canvas.draw_image(&RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
        canvas.clear();
        assert!(canvas.pixels().pixels().all(|px| *px == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn still_is_a_png_data_url() -> anyhow::Result<()> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let still = Still::capture(&img)?;

        assert_eq!(still.dimensions(), (3, 2));
        assert_eq!(&still.png()[1..4], b"PNG");
        assert!(still.data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));

        let decoded = image::load_from_memory(still.png())?.into_rgba8();
        assert_eq!(decoded, img);
        Ok(())
    }
}
