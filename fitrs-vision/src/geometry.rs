/// Integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint with floor division on both axes.
    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        Point2D {
            x: (self.x + other.x).div_euclid(2),
            y: (self.y + other.y).div_euclid(2),
        }
    }
}

/// Keypoint in normalized image coordinates, as produced by a pose model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32, // [0, 1] of width
    pub y: f32, // [0, 1] of height
    pub score: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, score: 1.0 }
    }

    pub const fn with_score(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, score }
    }

    /// Project onto an image of `width` x `height` pixels.
    pub fn to_pixel(&self, width: u32, height: u32) -> Point2D {
        Point2D {
            x: (self.x as f64 * width as f64).round() as i32,
            y: (self.y as f64 * height as f64).round() as i32,
        }
    }
}

/// Left and right shoulder keypoints of a single person.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shoulders {
    pub left: Landmark,
    pub right: Landmark,
}

impl Shoulders {
    pub fn to_pixels(&self, width: u32, height: u32) -> (Point2D, Point2D) {
        (
            self.left.to_pixel(width, height),
            self.right.to_pixel(width, height),
        )
    }
}
