//! Cohen–Sutherland segment clipping against the viewport
//!
//! Endpoints are inclusive pixels, so segments clip to `max_x`/`max_y`
//! rather than the `+1` boundaries the polygon clipper uses.

use super::math::Vec3;
use super::viewport::Viewport;

pub const REGION_CENTER: u8 = 0b0000;
pub const REGION_LEFT: u8 = 0b0001;
pub const REGION_RIGHT: u8 = 0b0010;
/// y < min_y
pub const REGION_BOTTOM: u8 = 0b0100;
/// y > max_y
pub const REGION_TOP: u8 = 0b1000;

/// Outcode of a point relative to the viewport
pub fn region_code(p: Vec3, vp: &Viewport) -> u8 {
    let mut code = REGION_CENTER;

    if p.x < vp.min_x as f32 {
        code |= REGION_LEFT;
    } else if p.x > vp.max_x as f32 {
        code |= REGION_RIGHT;
    }

    if p.y < vp.min_y as f32 {
        code |= REGION_BOTTOM;
    } else if p.y > vp.max_y as f32 {
        code |= REGION_TOP;
    }

    code
}

/// Outcome of comparing two outcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trivial {
    Accept,
    Reject,
    /// Needs at least one intersection step
    Undecided,
}

pub fn classify(code1: u8, code2: u8) -> Trivial {
    if code1 | code2 == REGION_CENTER {
        Trivial::Accept
    } else if code1 & code2 != REGION_CENTER {
        Trivial::Reject
    } else {
        Trivial::Undecided
    }
}

/// Move `p` onto the first boundary it violates (TOP, BOTTOM, RIGHT, LEFT),
/// sliding along the line towards `other`. Depth is re-interpolated in 1/z.
fn clip_endpoint(p: Vec3, other: Vec3, code: u8, vp: &Viewport) -> Vec3 {
    let (t, x, y) = if code & REGION_TOP != 0 {
        let bound = vp.max_y as f32;
        let t = (bound - p.y) / (other.y - p.y);
        (t, p.x + (other.x - p.x) * t, bound)
    } else if code & REGION_BOTTOM != 0 {
        let bound = vp.min_y as f32;
        let t = (bound - p.y) / (other.y - p.y);
        (t, p.x + (other.x - p.x) * t, bound)
    } else if code & REGION_RIGHT != 0 {
        let bound = vp.max_x as f32;
        let t = (bound - p.x) / (other.x - p.x);
        (t, bound, p.y + (other.y - p.y) * t)
    } else {
        let bound = vp.min_x as f32;
        let t = (bound - p.x) / (other.x - p.x);
        (t, bound, p.y + (other.y - p.y) * t)
    };

    let w = 1.0 / p.z + (1.0 / other.z - 1.0 / p.z) * t;
    Vec3::new(x, y, 1.0 / w)
}

/// Clip a screen-space segment to the viewport.
///
/// Returns the visible part, or `None` when nothing of it is inside.
pub fn clip_line(start: Vec3, end: Vec3, vp: &Viewport) -> Option<(Vec3, Vec3)> {
    if !start.is_finite() || !end.is_finite() {
        return None;
    }

    let mut p1 = start;
    let mut p2 = end;
    let mut code1 = region_code(p1, vp);
    let mut code2 = region_code(p2, vp);

    // Each step resolves one boundary of one endpoint; 8 is a hard upper bound
    for _ in 0..8 {
        match classify(code1, code2) {
            Trivial::Accept => return Some((p1, p2)),
            Trivial::Reject => return None,
            Trivial::Undecided => {}
        }

        // Always clip the endpoint that is outside
        if code1 == REGION_CENTER {
            std::mem::swap(&mut p1, &mut p2);
            std::mem::swap(&mut code1, &mut code2);
        }

        p1 = clip_endpoint(p1, p2, code1, vp);
        code1 = region_code(p1, vp);
    }

    log::trace!("line clip did not converge: {:?} -> {:?}", start, end);
    None
}
