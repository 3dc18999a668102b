/*!
    Minimal 2D geometry for orientation correction.

    Video tracks carry a preferred display transform; the pipeline applies
    its inverse so decoded buffers display upright. Only the orthogonal
    subset (quarter turns, flips, translations) is ever produced by real
    tracks, but the affine type is kept general so inversion and extent
    mapping stay exact.
*/

/**
    A point in frame coordinates.
*/
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/**
    An axis-aligned rectangle (a frame's content extent).
*/
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    /**
        Rectangle with origin at (0,0) and the given size.
    */
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    fn corners(&self) -> [Point; 4] {
        let Point { x, y } = self.origin;
        [
            Point::new(x, y),
            Point::new(x + self.width, y),
            Point::new(x, y + self.height),
            Point::new(x + self.width, y + self.height),
        ]
    }
}

/**
    A 2D affine transform.

    Maps (x, y) to (a*x + c*y + tx, b*x + d*y + ty), the row-vector
    convention used by track preferred transforms.
*/
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

/**
    Classification of an affine transform's orthogonal linear part.

    Used to pick the pixel operation when applying orientation correction.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Identity,
    /// Quarter turn clockwise (in y-down frame coordinates).
    QuarterCw,
    Half,
    /// Quarter turn counterclockwise.
    QuarterCcw,
    FlipHorizontal,
    FlipVertical,
    /// Mirror across the main diagonal (swap x and y).
    Transpose,
    /// Mirror across the anti-diagonal.
    AntiTranspose,
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /**
        A pure translation.
    */
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx,
            ty,
        }
    }

    /**
        Rotation by the given angle in radians (y-down coordinates, so
        positive angles rotate clockwise on screen).
    */
    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /**
        Rotation by the given number of quarter turns (clockwise).
    */
    pub fn quarter_turns(turns: u32) -> Self {
        match turns % 4 {
            0 => Self::IDENTITY,
            1 => Self {
                a: 0.0,
                b: 1.0,
                c: -1.0,
                d: 0.0,
                tx: 0.0,
                ty: 0.0,
            },
            2 => Self {
                a: -1.0,
                b: 0.0,
                c: 0.0,
                d: -1.0,
                tx: 0.0,
                ty: 0.0,
            },
            _ => Self {
                a: 0.0,
                b: -1.0,
                c: 1.0,
                d: 0.0,
                tx: 0.0,
                ty: 0.0,
            },
        }
    }

    /**
        Apply this transform, then `other`.
    */
    pub fn then(&self, other: &Affine2) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.tx * other.a + self.ty * other.c + other.tx,
            ty: self.tx * other.b + self.ty * other.d + other.ty,
        }
    }

    /**
        The inverse transform, or None if this transform is singular.
    */
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        Some(Self {
            a,
            b,
            c,
            d,
            tx: -(self.tx * a + self.ty * c),
            ty: -(self.tx * b + self.ty * d),
        })
    }

    /**
        Transform a point.
    */
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /**
        The bounding rectangle of a transformed rectangle.
    */
    pub fn map_rect(&self, rect: Rect) -> Rect {
        let corners = rect.corners().map(|p| self.apply(p));
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = corners
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /**
        Classify the linear part as one of the eight orthogonal frame
        orientations, ignoring translation. Returns None for transforms
        that scale or shear.
    */
    pub fn orientation(&self) -> Option<Orientation> {
        fn snap(v: f64) -> Option<i8> {
            if (v - 1.0).abs() < 1e-9 {
                Some(1)
            } else if (v + 1.0).abs() < 1e-9 {
                Some(-1)
            } else if v.abs() < 1e-9 {
                Some(0)
            } else {
                None
            }
        }

        let key = (snap(self.a)?, snap(self.b)?, snap(self.c)?, snap(self.d)?);
        match key {
            (1, 0, 0, 1) => Some(Orientation::Identity),
            (0, 1, -1, 0) => Some(Orientation::QuarterCw),
            (-1, 0, 0, -1) => Some(Orientation::Half),
            (0, -1, 1, 0) => Some(Orientation::QuarterCcw),
            (-1, 0, 0, 1) => Some(Orientation::FlipHorizontal),
            (1, 0, 0, -1) => Some(Orientation::FlipVertical),
            (0, 1, 1, 0) => Some(Orientation::Transpose),
            (0, -1, -1, 0) => Some(Orientation::AntiTranspose),
            _ => None,
        }
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
