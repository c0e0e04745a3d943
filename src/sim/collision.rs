//! Collision detection and impulse resolution for axis-aligned vehicle boxes
//!
//! Vehicle pairs (player or traffic) go through a minimum-overlap box test.
//! Road edges are half-planes: a body crossing one is always pushed back
//! toward the road, however far out it has drifted.

use std::cmp::Ordering;

use glam::Vec2;

/// An axis-aligned box (center + half-extents)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    /// Box of full `size` centered on `center`
    pub fn from_size(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size / 2.0,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    /// Smallest y (further ahead)
    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    /// Largest y (further behind)
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }

    /// Strict interior overlap (touching edges don't count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// Direction the first box is pushed out of the second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Unit push vector (y grows toward "behind")
    pub fn unit(self) -> Vec2 {
        match self {
            Side::Left => Vec2::new(-1.0, 0.0),
            Side::Right => Vec2::new(1.0, 0.0),
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
        }
    }
}

/// Minimum-translation result of an overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Push direction for the first box; the second is pushed the opposite way
    pub side: Side,
    /// Unit impact vector for the first box
    pub impact: Vec2,
    /// Overlap along the push axis
    pub depth: f32,
}

/// Overlap test plus minimum-overlap push axis for `a` against `b`
///
/// The smallest of the four edge overlaps picks the axis. Ties between the
/// horizontal and vertical axis resolve horizontally. Boxes with coincident
/// centers on the chosen axis are ordered by size, then by the other axis,
/// so swapping the arguments still flips the push.
pub fn box_contact(a: &Aabb, b: &Aabb) -> Option<Contact> {
    if !a.overlaps(b) {
        return None;
    }

    // Penetration through each of `b`'s edges
    let left_overlap = a.right() - b.left();
    let right_overlap = b.right() - a.left();
    let top_overlap = a.bottom() - b.top();
    let bottom_overlap = b.bottom() - a.top();

    let x_depth = left_overlap.min(right_overlap);
    let y_depth = top_overlap.min(bottom_overlap);

    let (side, depth) = if x_depth <= y_depth {
        if positive_side(a, b, 0) {
            (Side::Right, x_depth)
        } else {
            (Side::Left, x_depth)
        }
    } else if positive_side(a, b, 1) {
        (Side::Bottom, y_depth)
    } else {
        (Side::Top, y_depth)
    };

    Some(Contact {
        side,
        impact: side.unit(),
        depth,
    })
}

/// Whether `a` sits on the positive side of `b` along `axis` (0 = x, 1 = y)
///
/// Centers decide; exact ties fall through to the extents and then the other
/// axis. A strict total order, so at most one argument order answers true.
fn positive_side(a: &Aabb, b: &Aabb, axis: usize) -> bool {
    let other = 1 - axis;
    let key = |aabb: &Aabb| {
        [
            aabb.center[axis],
            aabb.half[axis],
            aabb.center[other],
            aabb.half[other],
        ]
    };
    let (ka, kb) = (key(a), key(b));
    ka.iter()
        .zip(&kb)
        .map(|(x, y)| x.total_cmp(y))
        .find(|ord| *ord != Ordering::Equal)
        == Some(Ordering::Greater)
}

/// Impact direction (for the first body) and force of a collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    pub impact: Vec2,
    pub force: f32,
}

/// Vehicle-vehicle force: relative speed, never below `min_force`
#[inline]
pub fn vehicle_force(speed_a: f32, speed_b: f32, min_force: f32) -> f32 {
    (speed_a - speed_b).abs().max(min_force)
}

/// Resolve two vehicles. `a` receives `impact`, `b` receives `-impact`.
pub fn vehicle_impulse(
    a: &Aabb,
    speed_a: f32,
    b: &Aabb,
    speed_b: f32,
    min_force: f32,
) -> Option<Impulse> {
    box_contact(a, b).map(|contact| Impulse {
        impact: contact.impact,
        force: vehicle_force(speed_a, speed_b, min_force),
    })
}

/// Resolve a body against the road edges (fixed `wall_force`)
///
/// The push points back at the road from whichever edge the body is further
/// past, so a body wider than the road is still sent the right way.
pub fn wall_impulse(
    body: &Aabb,
    road_left: f32,
    road_right: f32,
    wall_force: f32,
) -> Option<Impulse> {
    let past_left = road_left - body.left();
    let past_right = body.right() - road_right;
    if past_left <= 0.0 && past_right <= 0.0 {
        return None;
    }
    let impact = if past_left >= past_right {
        Vec2::X
    } else {
        Vec2::NEG_X
    };
    Some(Impulse {
        impact,
        force: wall_force,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn car_at(x: f32, y: f32) -> Aabb {
        Aabb::from_size(Vec2::new(x, y), Vec2::new(36.0, 60.0))
    }

    #[test]
    fn test_separate_boxes_miss() {
        assert!(box_contact(&car_at(0.0, 0.0), &car_at(100.0, 0.0)).is_none());
        // Touching edges don't overlap
        assert!(box_contact(&car_at(0.0, 0.0), &car_at(36.0, 0.0)).is_none());
        assert!(box_contact(&car_at(0.0, 0.0), &car_at(0.0, 60.0)).is_none());
    }

    #[test]
    fn test_rear_end_pushes_vertically() {
        // Same lane, 50px apart: `a` is ahead (smaller y)
        let a = car_at(200.0, 0.0);
        let b = car_at(200.0, 50.0);
        let contact = box_contact(&a, &b).expect("overlap");
        assert_eq!(contact.side, Side::Top);
        assert_eq!(contact.impact, Vec2::new(0.0, -1.0));
        assert_eq!(contact.depth, 10.0);

        let reverse = box_contact(&b, &a).expect("overlap");
        assert_eq!(reverse.impact, -contact.impact);
    }

    #[test]
    fn test_side_swipe_pushes_horizontally() {
        let a = car_at(0.0, 0.0);
        let b = car_at(30.0, 5.0);
        let contact = box_contact(&a, &b).expect("overlap");
        assert_eq!(contact.side, Side::Left);
        assert_eq!(contact.depth, 6.0);
    }

    #[test]
    fn test_vehicle_force_policy() {
        assert_eq!(vehicle_force(3.0, 5.0, 1.0), 2.0);
        assert_eq!(vehicle_force(4.0, 4.2, 1.0), 1.0);

        let impulse = vehicle_impulse(&car_at(0.0, 0.0), 3.0, &car_at(0.0, 50.0), 5.0, 1.0)
            .expect("overlap");
        assert_eq!(impulse.force, 2.0);
        assert_eq!(impulse.impact, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_wall_impulse() {
        let (left, right) = (160.0, 640.0);
        // Inside the road: no hit
        assert!(wall_impulse(&car_at(400.0, 0.0), left, right, 2.0).is_none());

        // Scraping the left edge: pushed right
        let hit = wall_impulse(&car_at(170.0, -300.0), left, right, 2.0).expect("hit");
        assert_eq!(hit.impact, Vec2::new(1.0, 0.0));
        assert_eq!(hit.force, 2.0);

        // Scraping the right edge: pushed left
        let hit = wall_impulse(&car_at(630.0, 900.0), left, right, 2.0).expect("hit");
        assert_eq!(hit.impact, Vec2::new(-1.0, 0.0));

        // A bus is taller than it is wide; still a lateral push
        let bus = Aabb::from_size(Vec2::new(165.0, 0.0), Vec2::new(40.0, 100.0));
        let hit = wall_impulse(&bus, left, right, 2.0).expect("hit");
        assert_eq!(hit.impact, Vec2::new(1.0, 0.0));

        // Touching the edge is not a hit
        assert!(wall_impulse(&car_at(178.0, 0.0), left, right, 2.0).is_none());
    }

    #[test]
    fn test_wall_push_from_far_outside_points_at_road() {
        let (left, right) = (160.0, 640.0);
        let hit = wall_impulse(&car_at(-1000.0, 0.0), left, right, 2.0).expect("hit");
        assert_eq!(hit.impact, Vec2::X);
        let hit = wall_impulse(&car_at(2000.0, 0.0), left, right, 2.0).expect("hit");
        assert_eq!(hit.impact, Vec2::NEG_X);

        // Just past the outer half of the old wall width
        let hit = wall_impulse(&car_at(left - 700.0, 50.0), left, right, 2.0).expect("hit");
        assert_eq!(hit.impact, Vec2::X);
    }

    #[test]
    fn test_coincident_centers_still_flip() {
        let small = car_at(100.0, 100.0);
        let wide = Aabb::from_size(Vec2::new(100.0, 100.0), Vec2::new(40.0, 60.0));
        let ab = box_contact(&small, &wide).expect("overlap");
        let ba = box_contact(&wide, &small).expect("overlap");
        assert_eq!(ab.impact, -ba.impact);
        assert_eq!(ab.side, Side::Left);
        assert_eq!(ba.side, Side::Right);

        // Same box shifted only along y: the x push falls back to the y order
        let a = car_at(50.0, 0.0);
        let b = car_at(50.0, 10.0);
        let ab = box_contact(&a, &b).expect("overlap");
        let ba = box_contact(&b, &a).expect("overlap");
        assert_eq!(ab.side, Side::Left);
        assert_eq!(ba.side, Side::Right);
    }

    proptest! {
        #[test]
        fn prop_contact_is_symmetric(
            ax in -100.0f32..100.0, ay in -100.0f32..100.0,
            bx in -100.0f32..100.0, by in -100.0f32..100.0,
            aw in 10.0f32..60.0, ah in 10.0f32..120.0,
            bw in 10.0f32..60.0, bh in 10.0f32..120.0,
        ) {
            let a = Aabb::from_size(Vec2::new(ax, ay), Vec2::new(aw, ah));
            let b = Aabb::from_size(Vec2::new(bx, by), Vec2::new(bw, bh));
            // Identical boxes have no side to push toward
            prop_assume!(a != b);

            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
            match (box_contact(&a, &b), box_contact(&b, &a)) {
                (Some(ab), Some(ba)) => {
                    prop_assert_eq!(ab.impact, -ba.impact);
                    prop_assert_eq!(ab.depth, ba.depth);
                    prop_assert!((ab.impact.length() - 1.0).abs() < 1e-6);
                }
                (None, None) => {}
                _ => prop_assert!(false, "overlap disagreed between orderings"),
            }
        }
    }
}
